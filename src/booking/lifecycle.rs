use std::sync::{Arc, PoisonError};

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use log::{debug, info};

use super::{
    availability,
    error::ReservationError,
    locks::ClaimLocks,
    status::ReservationStatus,
    store::{self, Reservation},
    validator::{self, Rules},
};
use crate::{
    models::reservations::{NewReservation, NewReservationSlot},
    notify::{Notifier, Templates},
};

no_arg_sql_function!(last_insert_rowid, diesel::sql_types::BigInt);

/// What a caller asks to book.
#[derive(Clone, Debug)]
pub struct NewBooking {
    pub student_id: i64,
    pub room_id: i64,
    pub date: NaiveDate,
    pub slot_ids: Vec<i64>,
}

/// Owns every state change of a reservation and the email that follows it.
///
/// Emails are handed to the notifier only after the transaction has committed, so a
/// delivery problem can never undo a reservation.
pub struct ReservationManager {
    rules: Rules,
    locks: ClaimLocks,
    templates: Templates,
    notifier: Arc<dyn Notifier>,
}

fn claim_error(err: diesel::result::Error) -> ReservationError {
    use diesel::result::{DatabaseErrorKind, Error};

    match err {
        Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            ReservationError::PersistenceConflict
        }
        Error::DatabaseError(_, ref info) if info.message().contains("UNIQUE constraint failed") => {
            ReservationError::PersistenceConflict
        }
        // SQLITE_BUSY once busy_timeout has run out
        Error::DatabaseError(_, ref info) if info.message().contains("database is locked") => {
            ReservationError::PersistenceConflict
        }
        err => ReservationError::Database(err),
    }
}

fn write_error(err: ReservationError) -> ReservationError {
    match err {
        ReservationError::Database(err) => claim_error(err),
        err => err,
    }
}

impl ReservationManager {
    pub fn new(rules: Rules, templates: Templates, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            rules,
            locks: ClaimLocks::default(),
            templates,
            notifier,
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Validates and stores a new pending reservation, then asks the student to confirm it.
    ///
    /// Availability is read, checked and claimed inside one IMMEDIATE transaction while
    /// holding the (room, date) lock. The write lock is taken at BEGIN, so the reads that
    /// feed the rules (room occupancy, the student's other spans) cannot go stale before
    /// the insert, whichever room a racing request targets.
    pub fn create(
        &self,
        conn: &SqliteConnection,
        booking: NewBooking,
    ) -> Result<Reservation, ReservationError> {
        use crate::schema::{reservation_slots, reservations};

        let reservation = {
            let lock = self.locks.lock_for(booking.room_id, booking.date);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

            conn.immediate_transaction::<_, ReservationError, _>(|| {
                let student = store::find_student(conn, booking.student_id)?;
                let room = store::find_room(conn, booking.room_id)?;
                let slots = store::resolve_slots(conn, &booking.slot_ids)?;

                let taken = availability::availability(conn, room.id, booking.date)?;
                debug!(
                    "room {} on {}: {} slots taken",
                    room.room_number,
                    booking.date,
                    taken.occupied_count()
                );
                let held = if self.rules.forbid_student_overlap {
                    store::student_spans(conn, student.id, booking.date)?
                } else {
                    Vec::new()
                };
                let span = validator::validate(&slots, &taken, &held, &self.rules)?;

                diesel::insert_into(reservations::table)
                    .values(NewReservation {
                        student_id: student.id,
                        room_id: room.id,
                        date: booking.date,
                        start_time: span.start_time,
                        end_time: span.end_time,
                        status: ReservationStatus::Pending.as_str().to_string(),
                        created_at: Utc::now().naive_utc(),
                    })
                    .execute(conn)?;
                let id = diesel::select(last_insert_rowid).get_result::<i64>(conn)?;

                for slot in &slots {
                    diesel::insert_into(reservation_slots::table)
                        .values(NewReservationSlot {
                            reservation_id: id,
                            slot_id: slot.id,
                            room_id: room.id,
                            date: booking.date,
                            released: false,
                        })
                        .execute(conn)
                        .map_err(claim_error)?;
                }

                store::load_reservation(conn, id)?.ok_or_else(|| {
                    anyhow::anyhow!("reservation {} vanished after insert", id).into()
                })
            })
            .map_err(write_error)?
        };

        info!(
            "reservation {} created: student {} room {} on {} {}-{}",
            reservation.data.id,
            reservation.student.institution_id,
            reservation.room.room_number,
            reservation.data.date,
            reservation.data.start_time,
            reservation.data.end_time
        );
        self.notifier
            .notify(self.templates.confirmation_request(&reservation));
        Ok(reservation)
    }

    /// pending -> confirmed. A second confirm fails.
    pub fn confirm(
        &self,
        conn: &SqliteConnection,
        id: i64,
    ) -> Result<Reservation, ReservationError> {
        let reservation = self.transition(conn, id, ReservationStatus::Confirmed)?;
        info!("reservation {} confirmed", id);
        self.notifier.notify(self.templates.confirmed(&reservation));
        Ok(reservation)
    }

    /// pending or confirmed -> cancelled. The slots become free immediately.
    pub fn cancel(
        &self,
        conn: &SqliteConnection,
        id: i64,
    ) -> Result<Reservation, ReservationError> {
        let reservation = self.transition(conn, id, ReservationStatus::Cancelled)?;
        info!("reservation {} cancelled", id);
        self.notifier.notify(self.templates.cancelled(&reservation));
        Ok(reservation)
    }

    fn transition(
        &self,
        conn: &SqliteConnection,
        id: i64,
        next: ReservationStatus,
    ) -> Result<Reservation, ReservationError> {
        use crate::schema::{reservation_slots, reservations};

        conn.immediate_transaction::<_, ReservationError, _>(|| {
            let current = reservations::table
                .find(id)
                .select(reservations::status)
                .first::<String>(conn)
                .optional()?
                .and_then(|status| status.parse::<ReservationStatus>().ok())
                .ok_or(ReservationError::InvalidTransition)?;
            if !current.can_transition_to(next) {
                return Err(ReservationError::InvalidTransition);
            }

            // compare-and-set: a concurrent transition makes this update miss
            let updated = diesel::update(
                reservations::table
                    .filter(reservations::id.eq(id))
                    .filter(reservations::status.eq(current.as_str())),
            )
            .set(reservations::status.eq(next.as_str()))
            .execute(conn)?;
            if updated != 1 {
                return Err(ReservationError::InvalidTransition);
            }

            if !next.claims_slots() {
                diesel::update(
                    reservation_slots::table.filter(reservation_slots::reservation_id.eq(id)),
                )
                .set(reservation_slots::released.eq(true))
                .execute(conn)?;
            }

            store::load_reservation(conn, id)?.ok_or(ReservationError::InvalidTransition)
        })
    }

    /// Deletes every reservation dated before `as_of`, whatever its status. Running it
    /// again for the same day deletes nothing more.
    pub fn daily_reset(
        &self,
        conn: &SqliteConnection,
        as_of: NaiveDate,
    ) -> Result<usize, ReservationError> {
        use crate::schema::{reservation_slots, reservations};

        let purged = conn.immediate_transaction::<_, ReservationError, _>(|| {
            diesel::delete(reservation_slots::table.filter(reservation_slots::date.lt(as_of)))
                .execute(conn)?;
            Ok(diesel::delete(reservations::table.filter(reservations::date.lt(as_of)))
                .execute(conn)?)
        })?;
        self.locks.prune_before(as_of);

        info!(
            "daily reset: cleared {} reservations dated before {}, {} claim locks left",
            purged,
            as_of,
            self.locks.len()
        );
        Ok(purged)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::{
        booking::SlotGrid,
        models::{rooms::NewRoom, students::NewStudent},
        notify::testing::RecordingNotifier,
        seed,
    };
    use chrono::NaiveTime;

    pub fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    pub fn default_rules() -> Rules {
        Rules {
            max_slots: 4,
            opening: hm(9, 0),
            closing: hm(17, 0),
            forbid_student_overlap: false,
        }
    }

    pub fn manager(rules: Rules) -> (ReservationManager, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let manager = ReservationManager::new(
            rules,
            Templates::new("http://rooms.test", "EIEAB"),
            notifier.clone(),
        );
        (manager, notifier)
    }

    /// Grid 09:00-17:00 (slot ids 1..=16 in time order), rooms 1.203 and 2.205 (ids 1, 2),
    /// students ids 1 and 2.
    pub fn seed_fixture(conn: &SqliteConnection) {
        use crate::schema::{rooms, students};

        let grid = SlotGrid::new(hm(9, 0), hm(17, 0), 30).unwrap();
        seed::seed_timeslots(conn, &grid).unwrap();
        for number in &["1.203", "2.205"] {
            diesel::insert_into(rooms::table)
                .values(NewRoom::new(*number))
                .execute(conn)
                .unwrap();
        }
        for (institution_id, name) in &[("20000001", "Ada"), ("20000002", "Brian")] {
            diesel::insert_into(students::table)
                .values(NewStudent {
                    institution_id: institution_id.to_string(),
                    name: name.to_string(),
                    email: format!("{}@example.edu", name.to_lowercase()),
                })
                .execute(conn)
                .unwrap();
        }
    }
}

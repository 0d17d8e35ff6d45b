use std::collections::BTreeSet;

use chrono::NaiveDate;
use diesel::prelude::*;

use crate::models::{reservations::RESERVATION_STATUS_CANCELLED, timeslots::Timeslot};

/// Slots of one (room, date) held by reservations that are not cancelled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Availability {
    occupied: BTreeSet<i64>,
}

impl Availability {
    pub fn from_occupied<I: IntoIterator<Item = i64>>(slot_ids: I) -> Self {
        Self {
            occupied: slot_ids.into_iter().collect(),
        }
    }

    pub fn is_available(&self, slot: &Timeslot) -> bool {
        !self.occupied.contains(&slot.id)
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }
}

/// Computed from the reservation store on every call; nothing is cached.
pub fn occupied_slots(
    conn: &SqliteConnection,
    room_id: i64,
    date: NaiveDate,
) -> QueryResult<Vec<Timeslot>> {
    use crate::schema::{reservation_slots, reservations, timeslots};

    reservation_slots::table
        .inner_join(reservations::table)
        .inner_join(timeslots::table)
        .filter(reservations::room_id.eq(room_id))
        .filter(reservations::date.eq(date))
        .filter(reservations::status.ne(RESERVATION_STATUS_CANCELLED))
        .select(timeslots::all_columns)
        .order(timeslots::start_time.asc())
        .load::<Timeslot>(conn)
}

pub fn availability(
    conn: &SqliteConnection,
    room_id: i64,
    date: NaiveDate,
) -> QueryResult<Availability> {
    let occupied = occupied_slots(conn, room_id, date)?;
    Ok(Availability::from_occupied(
        occupied.into_iter().map(|slot| slot.id),
    ))
}

/// The whole grid minus what is taken for the room on that date, ordered by start time.
pub fn available_slots(
    conn: &SqliteConnection,
    room_id: i64,
    date: NaiveDate,
) -> QueryResult<Vec<Timeslot>> {
    use crate::schema::timeslots;

    let taken = availability(conn, room_id, date)?;
    let slots = timeslots::table
        .order(timeslots::start_time.asc())
        .load::<Timeslot>(conn)?;
    Ok(slots
        .into_iter()
        .filter(|slot| taken.is_available(slot))
        .collect())
}

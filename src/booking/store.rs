use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use diesel::prelude::*;

use super::{
    error::ReservationError,
    status::ReservationStatus,
    validator::{RejectReason, Rejection, Span},
};
use crate::models::{
    reservations::{ReservationData, RESERVATION_STATUS_CANCELLED},
    rooms::RoomData,
    students::StudentData,
    timeslots::Timeslot,
};

/// A reservation together with everything needed to show it or mail about it.
#[derive(Clone, Debug)]
pub struct Reservation {
    pub data: ReservationData,
    pub status: ReservationStatus,
    pub student: StudentData,
    pub room: RoomData,
    pub slots: Vec<Timeslot>,
}

#[derive(Clone, Debug, Default)]
pub struct ReservationFilter {
    pub student_id: Option<i64>,
    pub room_id: Option<i64>,
    pub status: Option<ReservationStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub first_index: i64,
    pub limit: i64,
}

fn assemble(
    conn: &SqliteConnection,
    rows: Vec<(ReservationData, StudentData, RoomData)>,
) -> Result<Vec<Reservation>, ReservationError> {
    use crate::schema::{reservation_slots, timeslots};

    let ids: Vec<i64> = rows.iter().map(|(data, _, _)| data.id).collect();
    let mut slots_of: HashMap<i64, Vec<Timeslot>> = HashMap::new();
    if !ids.is_empty() {
        let claims = reservation_slots::table
            .inner_join(timeslots::table)
            .filter(reservation_slots::reservation_id.eq_any(ids))
            .select((reservation_slots::reservation_id, timeslots::all_columns))
            .order(timeslots::start_time.asc())
            .load::<(i64, Timeslot)>(conn)?;
        for (reservation_id, slot) in claims {
            slots_of.entry(reservation_id).or_default().push(slot);
        }
    }

    rows.into_iter()
        .map(|(data, student, room)| -> Result<Reservation, ReservationError> {
            let status = data
                .status
                .parse::<ReservationStatus>()
                .map_err(anyhow::Error::from)?;
            let slots = slots_of.remove(&data.id).unwrap_or_default();
            Ok(Reservation {
                data,
                status,
                student,
                room,
                slots,
            })
        })
        .collect()
}

pub fn load_reservation(
    conn: &SqliteConnection,
    id: i64,
) -> Result<Option<Reservation>, ReservationError> {
    use crate::schema::{reservations, rooms, students};

    let row = reservations::table
        .inner_join(students::table)
        .inner_join(rooms::table)
        .filter(reservations::id.eq(id))
        .first::<(ReservationData, StudentData, RoomData)>(conn)
        .optional()?;

    match row {
        Some(row) => Ok(assemble(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

pub fn search_reservations(
    conn: &SqliteConnection,
    filter: &ReservationFilter,
) -> Result<Vec<Reservation>, ReservationError> {
    use crate::schema::{reservations, rooms, students};

    let mut query = reservations::table
        .inner_join(students::table)
        .inner_join(rooms::table)
        .into_boxed();
    if let Some(student_id) = filter.student_id {
        query = query.filter(reservations::student_id.eq(student_id));
    }
    if let Some(room_id) = filter.room_id {
        query = query.filter(reservations::room_id.eq(room_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(reservations::status.eq(status.as_str()));
    }
    if let Some(start_date) = filter.start_date {
        query = query.filter(reservations::date.ge(start_date));
    }
    if let Some(end_date) = filter.end_date {
        query = query.filter(reservations::date.le(end_date));
    }

    let rows = query
        .order((reservations::date.desc(), reservations::start_time.asc()))
        .offset(filter.first_index)
        .limit(filter.limit)
        .load::<(ReservationData, StudentData, RoomData)>(conn)?;
    assemble(conn, rows)
}

/// Spans of the student's live reservations on `date`, across all rooms.
pub fn student_spans(
    conn: &SqliteConnection,
    student_id: i64,
    date: NaiveDate,
) -> QueryResult<Vec<Span>> {
    use crate::schema::reservations;

    let spans = reservations::table
        .filter(reservations::student_id.eq(student_id))
        .filter(reservations::date.eq(date))
        .filter(reservations::status.ne(RESERVATION_STATUS_CANCELLED))
        .select((reservations::start_time, reservations::end_time))
        .load::<(NaiveTime, NaiveTime)>(conn)?;
    Ok(spans
        .into_iter()
        .map(|(start_time, end_time)| Span {
            start_time,
            end_time,
        })
        .collect())
}

/// Looks up the requested slots, keeping request order and repeats so the validator
/// sees exactly what was asked for.
pub fn resolve_slots(
    conn: &SqliteConnection,
    slot_ids: &[i64],
) -> Result<Vec<Timeslot>, ReservationError> {
    use crate::schema::timeslots;

    if slot_ids.is_empty() {
        return Ok(Vec::new());
    }

    let known: HashMap<i64, Timeslot> = timeslots::table
        .filter(timeslots::id.eq_any(slot_ids.to_vec()))
        .load::<Timeslot>(conn)?
        .into_iter()
        .map(|slot| (slot.id, slot))
        .collect();

    slot_ids
        .iter()
        .map(|id| -> Result<Timeslot, ReservationError> {
            known.get(id).cloned().ok_or_else(|| {
                Rejection::new(
                    RejectReason::UnknownTimeslot,
                    format!("No such timeslot: {}.", id),
                )
                .into()
            })
        })
        .collect()
}

pub fn find_student(
    conn: &SqliteConnection,
    student_id: i64,
) -> Result<StudentData, ReservationError> {
    use crate::schema::students;

    students::table
        .find(student_id)
        .first::<StudentData>(conn)
        .optional()?
        .ok_or_else(|| Rejection::new(RejectReason::UnknownStudent, "No such student.").into())
}

pub fn find_room(conn: &SqliteConnection, room_id: i64) -> Result<RoomData, ReservationError> {
    use crate::schema::rooms;

    rooms::table
        .find(room_id)
        .first::<RoomData>(conn)
        .optional()?
        .ok_or_else(|| Rejection::new(RejectReason::UnknownRoom, "No such room.").into())
}

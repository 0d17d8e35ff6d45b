use crate::schema::{reservation_slots, reservations};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

#[derive(Queryable, Clone, Debug, PartialEq)]
pub struct ReservationData {
    pub id: i64,
    pub student_id: i64,
    pub room_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "reservations"]
pub struct NewReservation {
    pub student_id: i64,
    pub room_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub created_at: NaiveDateTime,
}

/// A claim of one slot by one reservation. `room_id` and `date` are copied from the
/// reservation so the store can enforce one live claim per (room, date, slot).
#[derive(Insertable)]
#[table_name = "reservation_slots"]
pub struct NewReservationSlot {
    pub reservation_id: i64,
    pub slot_id: i64,
    pub room_id: i64,
    pub date: NaiveDate,
    pub released: bool,
}

pub const RESERVATION_STATUS_PENDING: &str = "pending";
pub const RESERVATION_STATUS_CONFIRMED: &str = "confirmed";
pub const RESERVATION_STATUS_CANCELLED: &str = "cancelled";

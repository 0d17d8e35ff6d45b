use serde::Serialize;

use crate::{
    booking::Reservation,
    utils::{format_clock, format_date_str, format_time_str},
};

#[derive(Default, Serialize)]
pub struct ReservationItem {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub room_id: i64,
    pub room_number: String,
    pub floor: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub timeslots: Vec<i64>,
    pub created_at: String,
}

impl From<Reservation> for ReservationItem {
    fn from(reservation: Reservation) -> Self {
        let Reservation {
            data,
            status,
            student,
            room,
            slots,
        } = reservation;
        Self {
            id: data.id,
            student_id: student.id,
            student_name: student.name,
            room_id: room.id,
            room_number: room.room_number,
            floor: room.floor,
            date: format_date_str(&data.date),
            start_time: format_clock(&data.start_time),
            end_time: format_clock(&data.end_time),
            status: status.to_string(),
            timeslots: slots.into_iter().map(|slot| slot.id).collect(),
            created_at: format_time_str(&data.created_at),
        }
    }
}

#[derive(Default, Serialize)]
pub struct ReservationResponse {
    pub success: bool,
    pub err: String,
    pub code: String,
    pub message: String,
    pub reservation: Option<ReservationItem>,
}

#[derive(Default, Serialize)]
pub struct SearchReservationResponse {
    pub success: bool,
    pub err: String,
    pub code: String,
    pub reservations: Vec<ReservationItem>,
}

crate::impl_err_response! {
    ReservationResponse,
    SearchReservationResponse,
}

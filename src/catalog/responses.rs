use serde::Serialize;

use crate::{
    models::{rooms::RoomData, students::StudentData, timeslots::Timeslot},
    utils::{format_clock, format_clock_span},
};

#[derive(Default, Serialize)]
pub struct TimeslotItem {
    pub id: i64,
    pub start_time: String,
    pub end_time: String,
    pub label: String,
}

impl From<&Timeslot> for TimeslotItem {
    fn from(slot: &Timeslot) -> Self {
        Self {
            id: slot.id,
            start_time: format_clock(&slot.start_time),
            end_time: format_clock(&slot.end_time),
            label: format_clock_span(&slot.start_time, &slot.end_time),
        }
    }
}

#[derive(Default, Serialize)]
pub struct TimeslotsResponse {
    pub success: bool,
    pub err: String,
    pub code: String,
    pub max_slots: usize,
    pub timeslots: Vec<TimeslotItem>,
}

#[derive(Default, Serialize)]
pub struct AvailableResponse {
    pub success: bool,
    pub err: String,
    pub code: String,
    pub room_id: i64,
    pub date: String,
    pub timeslots: Vec<TimeslotItem>,
}

#[derive(Default, Serialize)]
pub struct RoomItem {
    pub id: i64,
    pub room_number: String,
    pub floor: String,
}

impl From<RoomData> for RoomItem {
    fn from(room: RoomData) -> Self {
        Self {
            id: room.id,
            room_number: room.room_number,
            floor: room.floor,
        }
    }
}

#[derive(Default, Serialize)]
pub struct RoomsResponse {
    pub success: bool,
    pub err: String,
    pub code: String,
    pub rooms: Vec<RoomItem>,
}

#[derive(Default, Serialize)]
pub struct StudentItem {
    pub id: i64,
    pub institution_id: String,
    pub name: String,
    pub email: String,
}

impl From<StudentData> for StudentItem {
    fn from(student: StudentData) -> Self {
        Self {
            id: student.id,
            institution_id: student.institution_id,
            name: student.name,
            email: student.email,
        }
    }
}

#[derive(Default, Serialize)]
pub struct StudentsResponse {
    pub success: bool,
    pub err: String,
    pub code: String,
    pub students: Vec<StudentItem>,
}

#[derive(Default, Serialize)]
pub struct StudentResponse {
    pub success: bool,
    pub err: String,
    pub code: String,
    pub student: Option<StudentItem>,
}

crate::impl_err_response! {
    TimeslotsResponse,
    AvailableResponse,
    RoomsResponse,
    StudentsResponse,
    StudentResponse,
}

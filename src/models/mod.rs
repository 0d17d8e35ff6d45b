pub mod reservations;
pub mod rooms;
pub mod students;
pub mod timeslots;

//! The reservation engine: the slot grid, the availability index, the rule checks and
//! the lifecycle of a reservation.

pub mod availability;
mod error;
pub mod grid;
mod lifecycle;
mod locks;
mod status;
pub mod store;
pub mod validator;

pub use self::{
    error::ReservationError,
    grid::SlotGrid,
    lifecycle::{NewBooking, ReservationManager},
    status::ReservationStatus,
    store::Reservation,
    validator::{RejectReason, Rejection, Rules},
};

#[cfg(test)]
pub use self::lifecycle::testing;

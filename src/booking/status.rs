use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::models::reservations::{
    RESERVATION_STATUS_CANCELLED, RESERVATION_STATUS_CONFIRMED, RESERVATION_STATUS_PENDING,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Error)]
#[error("unknown reservation status '{0}'")]
pub struct UnknownStatus(String);

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => RESERVATION_STATUS_PENDING,
            ReservationStatus::Confirmed => RESERVATION_STATUS_CONFIRMED,
            ReservationStatus::Cancelled => RESERVATION_STATUS_CANCELLED,
        }
    }

    /// pending -> confirmed, pending -> cancelled, confirmed -> cancelled.
    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;

        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }

    /// Whether a reservation in this state keeps its slots out of the availability index.
    pub fn claims_slots(self) -> bool {
        self != ReservationStatus::Cancelled
    }
}

impl FromStr for ReservationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            RESERVATION_STATUS_PENDING => Ok(ReservationStatus::Pending),
            RESERVATION_STATUS_CONFIRMED => Ok(ReservationStatus::Confirmed),
            RESERVATION_STATUS_CANCELLED => Ok(ReservationStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

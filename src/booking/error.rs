use thiserror::Error;

use super::validator::Rejection;

#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("{0}")]
    ValidationFailed(#[from] Rejection),
    /// Also returned for ids that do not exist, so an id that was never issued looks like one already used.
    #[error("Invalid or already confirmed/cancelled reservation.")]
    InvalidTransition,
    #[error("The selected timeslots are no longer available. Please choose again.")]
    PersistenceConflict,
    #[error("DB error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ReservationError {
    /// The caller can fix the request; nothing went wrong on our side.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ReservationError::ValidationFailed(_)
                | ReservationError::InvalidTransition
                | ReservationError::PersistenceConflict
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            ReservationError::ValidationFailed(rejection) => rejection.reason.code(),
            ReservationError::InvalidTransition => "invalid_transition",
            ReservationError::PersistenceConflict => "persistence_conflict",
            ReservationError::Database(_) | ReservationError::Internal(_) => "internal",
        }
    }
}

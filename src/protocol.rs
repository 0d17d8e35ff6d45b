use actix_web::{http::StatusCode, HttpResponse};
use log::error;
use serde::Serialize;

use crate::booking::ReservationError;

/// How an error is reported over HTTP.
pub trait ErrorStatus: std::fmt::Display {
    fn status_code(&self) -> StatusCode;

    /// Stable machine-readable code carried in the `code` field.
    fn code(&self) -> &'static str;
}

/// Plain `anyhow` errors are the caller's fault; a wrapped `ReservationError` keeps its own status.
impl ErrorStatus for anyhow::Error {
    fn status_code(&self) -> StatusCode {
        match self.downcast_ref::<ReservationError>() {
            Some(err) => err.status_code(),
            None => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self.downcast_ref::<ReservationError>() {
            Some(err) => err.code(),
            None => "bad_request",
        }
    }
}

impl ErrorStatus for ReservationError {
    fn status_code(&self) -> StatusCode {
        if self.is_rejection() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn code(&self) -> &'static str {
        ReservationError::code(self)
    }
}

pub fn error_response<E: ErrorStatus, B: Serialize>(err: &E, body: B) -> HttpResponse {
    let status = err.status_code();
    if status.is_server_error() {
        error!("request failed: {}", err);
    }
    HttpResponse::build(status).json(body)
}

#[macro_export]
macro_rules! impl_err_response {
    ( $( $type:ty),+ $(,)? ) => {
        $(
            impl $type {
                pub fn err<E: $crate::protocol::ErrorStatus>(err: &E) -> Self {
                    Self {
                        success: false,
                        err: err.to_string(),
                        code: err.code().to_string(),
                        ..Default::default()
                    }
                }
            }
        )+
    };
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("business not found: {0}")]
    BusinessNotFound(Uuid),

    #[error("appointment not found: {0}")]
    AppointmentNotFound(Uuid),

    #[error("availability not found: {0}")]
    AvailabilityNotFound(Uuid),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("invalid appointment: {0}")]
    InvalidAppointment(String),

    #[error("time slot {date} {time} is already booked for business {business_id}")]
    TimeSlotConflict {
        business_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    },

    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error("availability window already defined for this day and start time")]
    DuplicateAvailability,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid auth token")]
    InvalidToken,

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// True when `err` is a violation of the named Postgres constraint. Used to
/// turn the active-slot index race into `TimeSlotConflict` and duplicate-key
/// inserts into their domain errors.
pub fn is_constraint_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.constraint() == Some(constraint),
        _ => false,
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            Self::BusinessNotFound(_) => (StatusCode::NOT_FOUND, "business_not_found", None),
            Self::AppointmentNotFound(_) => {
                (StatusCode::NOT_FOUND, "appointment_not_found", None)
            }
            Self::AvailabilityNotFound(_) => {
                (StatusCode::NOT_FOUND, "availability_not_found", None)
            }
            Self::UserNotFound(_) => (StatusCode::NOT_FOUND, "user_not_found", None),
            Self::Unauthorized(_) => (StatusCode::FORBIDDEN, "unauthorized", None),
            Self::InvalidAppointment(_) => {
                (StatusCode::BAD_REQUEST, "invalid_appointment", None)
            }
            Self::TimeSlotConflict {
                business_id,
                date,
                time,
            } => (
                StatusCode::CONFLICT,
                "time_slot_conflict",
                Some(serde_json::json!({
                    "business_id": business_id,
                    "date": date.to_string(),
                    "time": time.to_string()
                })),
            ),
            Self::DuplicateEmail(_) => (StatusCode::CONFLICT, "duplicate_email", None),
            Self::DuplicateAvailability => {
                (StatusCode::CONFLICT, "duplicate_availability", None)
            }
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials", None),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            Self::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded", None),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error", None),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None),
            Self::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error", None),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, code, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

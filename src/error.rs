//! Defines the app level error type and its conversion to JSON responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry a valid owner ID.
    ///
    /// The owner ID is resolved by an external auth layer and forwarded in
    /// the `X-User-Id` header. The core never issues or validates
    /// credentials itself.
    #[error("no owner ID was provided with the request")]
    Unauthorized,

    /// The requested record does not exist, or belongs to another owner.
    ///
    /// Requests for records owned by someone else report this error rather
    /// than anything that would leak the record's existence.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A budget already exists for this (owner, category, month, year).
    #[error("a budget already exists for this category and month")]
    DuplicateBudget,

    /// An empty string was used as an expense title.
    #[error("expense title cannot be empty")]
    EmptyTitle,

    /// The expense title exceeds the 100 character limit.
    #[error("expense title cannot be more than 100 characters")]
    TitleTooLong,

    /// The expense note exceeds the 500 character limit.
    #[error("note cannot be more than 500 characters")]
    NoteTooLong,

    /// An expense tag exceeds the 30 character limit.
    #[error("tag \"{0}\" cannot be more than 30 characters")]
    TagTooLong(String),

    /// An empty string was used as a savings goal name.
    #[error("goal name cannot be empty")]
    EmptyGoalName,

    /// The savings goal name exceeds the 100 character limit.
    #[error("goal name cannot be more than 100 characters")]
    GoalNameTooLong,

    /// A negative amount was used where only zero or positive amounts make
    /// sense (budget limits, savings targets and balances).
    #[error("{0} is negative, which is not allowed here")]
    NegativeAmount(f64),

    /// A NaN or infinite monetary amount was provided.
    #[error("{0} is not a valid monetary amount")]
    InvalidAmount(f64),

    /// A string did not match any known spending category.
    #[error("\"{0}\" is not a valid category")]
    InvalidCategory(String),

    /// A string did not match any known payment method.
    #[error("\"{0}\" is not a valid payment method")]
    InvalidPaymentMethod(String),

    /// A month number outside 1-12 was provided.
    #[error("{0} is not a valid month number")]
    InvalidMonth(u8),

    /// A year outside the supported calendar range was provided.
    #[error("{0} is not a valid year, expected 1-9999")]
    InvalidYear(i32),

    /// An alert threshold outside 0-100 was provided.
    #[error("{0} is not a valid alert threshold, expected 0-100")]
    InvalidThreshold(f64),

    /// A timezone string did not name a canonical timezone.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// A value could not be serialized as JSON for storage.
    #[error("could not serialize as JSON: {0}")]
    JsonSerialization(String),

    /// The record store could not be reached or a query failed or timed
    /// out.
    ///
    /// Aggregations abort on this error rather than substituting zero
    /// totals, so the client never sees a misleading "nothing spent"
    /// state.
    #[error("the record store is unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("budget.") =>
            {
                Error::DuplicateBudget
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::StoreUnavailable(error.to_string())
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateBudget => StatusCode::CONFLICT,
            Error::StoreUnavailable(ref details) => {
                tracing::error!("aborting request, store unavailable: {}", details);
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::JsonSerialization(ref details) => {
                tracing::error!("JSON serialization failed: {}", details);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            // The remaining variants are all validation errors.
            _ => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({ "message": self.to_string() }));

        (status_code, body).into_response()
    }
}

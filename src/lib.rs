//! Friend Ledger is a small personal finance tracker.
//!
//! It keeps a running balance and an informal loan ledger for each friend,
//! and sends WhatsApp summaries of money movements through a third-party
//! messaging API.
//!
//! This library provides a JSON REST API over an SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod amount;
mod app_state;
mod database_id;
mod db;
mod endpoints;
mod friend;
mod logging;
mod loan;
mod notification;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use database_id::{FriendId, TransactionId};
pub use db::initialize as initialize_db;
pub use friend::{Friend, NewFriend, create_friend};
pub use loan::{create_loan, record_repayment};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use notification::{WhatsAppClient, WhatsAppConfig};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{BalanceChange, apply_balance_change};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request was missing a field or a field had the wrong shape.
    #[error("{0}")]
    Validation(String),

    /// An amount was missing, not a number, not finite or out of range.
    ///
    /// The string describes which amount and what was expected of it.
    #[error("{0}")]
    InvalidAmount(String),

    /// The friend ID did not refer to a friend in the database.
    #[error("friend not found")]
    FriendNotFound,

    /// The loan ID did not refer to a loan or repayment entry.
    #[error("loan entry not found")]
    LoanNotFound,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    /// Callers that know which resource they asked for should map it to
    /// [Error::FriendNotFound] or [Error::LoanNotFound].
    #[error("the requested resource could not be found")]
    NotFound,

    /// A repayment was larger than the amount the friend currently owes.
    ///
    /// The owed amount must never go negative through a repayment.
    #[error("repayment of {amount:.2} exceeds the owed amount of {owed:.2}")]
    OverRepayment {
        /// The rejected repayment amount.
        amount: f64,
        /// The amount owed at the time of the request.
        owed: f64,
    },

    /// The caller asked for a message to be delivered but the messaging
    /// provider credentials are not configured.
    #[error("notifications are unavailable: WhatsApp credentials are not configured")]
    NotificationUnavailable,

    /// The messaging provider could not be reached or rejected the message.
    #[error("notification failed: {0}")]
    NotificationFailed(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl Error {
    /// The HTTP status code that the error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InvalidAmount(_) | Error::OverRepayment { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::FriendNotFound | Error::LoanNotFound | Error::NotFound => StatusCode::NOT_FOUND,
            Error::NotificationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Error::NotificationFailed(_) => StatusCode::BAD_GATEWAY,
            Error::SqlError(_) | Error::DatabaseLockError | Error::InvalidTimezoneError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    async fn must_get_error_body(error: Error) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("could not read response body");

        (
            status,
            serde_json::from_slice(&body).expect("response body is not JSON"),
        )
    }

    #[tokio::test]
    async fn validation_errors_are_bad_requests() {
        let (status, body) =
            must_get_error_body(Error::Validation("name is required".to_owned())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "name is required");
    }

    #[tokio::test]
    async fn over_repayment_is_a_bad_request() {
        let (status, body) = must_get_error_body(Error::OverRepayment {
            amount: 600.0,
            owed: 500.0,
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "repayment of 600.00 exceeds the owed amount of 500.00"
        );
    }

    #[tokio::test]
    async fn notification_errors_map_to_gateway_statuses() {
        let (status, _) = must_get_error_body(Error::NotificationUnavailable).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, body) =
            must_get_error_body(Error::NotificationFailed("timed out".to_owned())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "notification failed: timed out");
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let (status, body) = must_get_error_body(Error::SqlError(
            rusqlite::Error::InvalidColumnName("secret_column".to_owned()),
        ))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"].as_str().unwrap().contains("secret_column"));
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}

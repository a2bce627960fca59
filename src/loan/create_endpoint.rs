//! Defines the endpoints for lending money and recording repayments.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    amount::parse_positive_amount,
    app_state::local_offset_at,
    database_id::FriendId,
    friend::Friend,
    loan::{LoanChange, create_loan, record_repayment},
    notification::{WhatsAppClient, compose_loan_reminder},
    transaction::Transaction,
};

/// The state needed to write loan entries and, if asked, send a reminder.
#[derive(Debug, Clone)]
pub struct CreateLoanState {
    /// The database connection for managing the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical name of the timezone that message dates use.
    pub local_timezone: String,
    /// The messaging client, if configured.
    pub whatsapp: Option<WhatsAppClient>,
}

impl FromRef<AppState> for CreateLoanState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            whatsapp: state.whatsapp.clone(),
        }
    }
}

/// The request body for a loan or a repayment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    /// The friend the money moves between.
    pub friend_id: Option<FriendId>,
    /// The amount, greater than zero.
    pub amount: Option<Value>,
    /// Why the money moved.
    pub reason: Option<String>,
    /// Whether to send the friend a reminder. Ignored for repayments.
    #[serde(default)]
    pub notify: bool,
}

impl LoanRequest {
    fn validate(&self) -> Result<(FriendId, f64), Error> {
        let friend_id = self
            .friend_id
            .ok_or_else(|| Error::Validation("friendId is required".to_owned()))?;
        let amount = parse_positive_amount("amount", self.amount.as_ref())?;

        Ok((friend_id, amount))
    }
}

/// What happened to the reminder for a new loan.
#[derive(Debug, Serialize)]
pub struct NotificationReport {
    /// Whether the caller asked for a reminder.
    pub requested: bool,
    /// Whether the provider accepted the reminder.
    pub sent: bool,
    /// The text that was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The response body after creating a loan.
#[derive(Debug, Serialize)]
pub struct CreateLoanResponse {
    /// The new loan entry.
    pub loan: Transaction,
    /// The friend with the recomputed owed amount.
    pub friend: Friend,
    /// What happened to the reminder.
    pub notification: NotificationReport,
}

/// The response body when a loan was saved but its reminder could not be sent.
#[derive(Debug, Serialize)]
struct LoanSavedNotificationFailed {
    error: String,
    loan: Transaction,
    friend: Friend,
}

/// A route handler for lending money to a friend.
///
/// If `notify` is set, the reminder is sent before responding. Asking for a
/// reminder when messaging is not configured fails with 503 before anything is
/// written. If the provider fails, the loan is kept and the response is a 502
/// that carries the saved loan and friend.
pub async fn create_loan_endpoint(
    State(state): State<CreateLoanState>,
    request: Result<Json<LoanRequest>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(request) = request?;
    let (friend_id, amount) = request.validate()?;

    let client = match (request.notify, state.whatsapp) {
        (false, _) => None,
        (true, Some(client)) => Some(client),
        (true, None) => return Err(Error::NotificationUnavailable),
    };

    let now = OffsetDateTime::now_utc();
    let local_offset = local_offset_at(&state.local_timezone, now)?;

    let LoanChange { entry, friend } = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("Could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        create_loan(friend_id, amount, request.reason, now, &connection)?
    };

    tracing::info!("Lent {amount} to friend {friend_id}, loan entry {}", entry.id);

    let Some(client) = client else {
        let response = CreateLoanResponse {
            loan: entry,
            friend,
            notification: NotificationReport {
                requested: false,
                sent: false,
                message: None,
            },
        };

        return Ok((StatusCode::CREATED, Json(response)).into_response());
    };

    let message = compose_loan_reminder(&friend, &entry, local_offset);

    match client.send_message(&friend.whatsapp, &message).await {
        Ok(()) => {
            let response = CreateLoanResponse {
                loan: entry,
                friend,
                notification: NotificationReport {
                    requested: true,
                    sent: true,
                    message: Some(message),
                },
            };

            Ok((StatusCode::CREATED, Json(response)).into_response())
        }
        Err(error) => {
            tracing::error!("Loan entry {} was saved but the reminder failed: {error}", entry.id);

            let response = LoanSavedNotificationFailed {
                error: error.to_string(),
                loan: entry,
                friend,
            };

            Ok((error.status_code(), Json(response)).into_response())
        }
    }
}

/// The response body after recording a repayment.
#[derive(Debug, Serialize)]
pub struct RepaymentResponse {
    /// The new repayment entry.
    pub repayment: Transaction,
    /// The friend with the recomputed owed amount.
    pub friend: Friend,
}

/// A route handler for recording that a friend paid money back.
///
/// Repayments larger than the owed amount are rejected.
pub async fn repay_loan_endpoint(
    State(state): State<CreateLoanState>,
    request: Result<Json<LoanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RepaymentResponse>), Error> {
    let Json(request) = request?;
    let (friend_id, amount) = request.validate()?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let LoanChange { entry, friend } = record_repayment(
        friend_id,
        amount,
        request.reason,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    tracing::info!("Friend {friend_id} repaid {amount}, now owes {}", friend.owed_amount);

    Ok((
        StatusCode::CREATED,
        Json(RepaymentResponse {
            repayment: entry,
            friend,
        }),
    ))
}

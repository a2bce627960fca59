//! Defines the endpoints that send loan reminders and wait for delivery.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
};
use rusqlite::Connection;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    app_state::local_offset_at,
    database_id::{FriendId, TransactionId},
    friend::{Friend, get_friend},
    loan::get_loan_entry,
    notification::{WhatsAppClient, compose_loan_reminder, compose_total_owed_reminder},
    transaction::TransactionType,
};

/// The state needed to send a reminder.
#[derive(Debug, Clone)]
pub struct NotifyState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical name of the timezone that message dates use.
    pub local_timezone: String,
    /// The messaging client, if configured.
    pub whatsapp: Option<WhatsAppClient>,
}

impl FromRef<AppState> for NotifyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            whatsapp: state.whatsapp.clone(),
        }
    }
}

/// The response body after a reminder was delivered.
#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    /// Always `true`. Failures are reported as errors.
    pub sent: bool,
    /// The text that was sent.
    pub message: String,
}

/// A route handler that reminds a friend about one loan.
///
/// Responds with 503 if messaging is not configured and 502 if the provider
/// does not accept the message.
pub async fn notify_loan_endpoint(
    State(state): State<NotifyState>,
    path: Result<Path<TransactionId>, PathRejection>,
) -> Result<Json<NotifyResponse>, Error> {
    let Path(loan_id) = path?;
    let client = state.whatsapp.ok_or(Error::NotificationUnavailable)?;
    let local_offset = local_offset_at(&state.local_timezone, OffsetDateTime::now_utc())?;

    let (friend, message) = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("Could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        let loan = get_loan_entry(loan_id, &connection)?;

        if loan.kind != TransactionType::Loan {
            return Err(Error::Validation(
                "reminders can only be sent for loans, not repayments".to_owned(),
            ));
        }

        let friend = get_friend(loan.friend_id, &connection)?;
        let message = compose_loan_reminder(&friend, &loan, local_offset);

        (friend, message)
    };

    deliver(&client, &friend, message).await
}

/// A route handler that reminds a friend about everything they owe.
///
/// Responds with 400 if the friend owes nothing, 503 if messaging is not
/// configured and 502 if the provider does not accept the message.
pub async fn notify_friend_loans_endpoint(
    State(state): State<NotifyState>,
    path: Result<Path<FriendId>, PathRejection>,
) -> Result<Json<NotifyResponse>, Error> {
    let Path(friend_id) = path?;
    let client = state.whatsapp.ok_or(Error::NotificationUnavailable)?;
    let now = OffsetDateTime::now_utc();
    let local_offset = local_offset_at(&state.local_timezone, now)?;

    let friend = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("Could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        get_friend(friend_id, &connection)?
    };

    if friend.owed_amount <= 0.0 {
        return Err(Error::Validation(format!(
            "{} does not owe anything",
            friend.name
        )));
    }

    let message = compose_total_owed_reminder(&friend, now, local_offset);

    deliver(&client, &friend, message).await
}

async fn deliver(
    client: &WhatsAppClient,
    friend: &Friend,
    message: String,
) -> Result<Json<NotifyResponse>, Error> {
    client.send_message(&friend.whatsapp, &message).await?;

    tracing::info!("Sent loan reminder to friend {}", friend.id);

    Ok(Json(NotifyResponse {
        sent: true,
        message,
    }))
}

//! Defines the endpoints that debit a friend's balance and notify them.
//!
//! `POST /friends/{friend_id}/deduct` and `POST /send/{friend_id}` share one
//! implementation and only differ in the footer of the WhatsApp message.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{
        FromRef, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
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
    notification::{
        DebitRoute, DebitSummary, WhatsAppClient, compose_debit_message, send_in_background,
    },
    transaction::{BalanceChange, Transaction, apply_balance_change, get_todays_spend},
};

/// The state needed to debit a friend and send them a summary.
#[derive(Debug, Clone)]
pub struct DebitState {
    /// The database connection for managing the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical name of the timezone that "today" and message dates use.
    pub local_timezone: String,
    /// The messaging client, if configured.
    pub whatsapp: Option<WhatsAppClient>,
}

impl FromRef<AppState> for DebitState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            whatsapp: state.whatsapp.clone(),
        }
    }
}

/// The request body for a debit or credit.
#[derive(Debug, Deserialize)]
pub struct BalanceChangeRequest {
    /// The amount to move, greater than zero.
    pub amount: Option<Value>,
    /// An optional free text note.
    pub note: Option<String>,
}

/// The response body after a debit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitResponse {
    /// The friend with their new balance.
    pub friend: Friend,
    /// The debit's ledger entry.
    pub transaction: Transaction,
    /// The friend's total debits for the local day, including this one.
    pub today_spend: f64,
}

/// A route handler for debiting a friend's balance.
///
/// A summary is sent to the friend on WhatsApp in the background. The
/// response does not wait for it and is not affected by its outcome.
pub async fn deduct_endpoint(
    State(state): State<DebitState>,
    path: Result<Path<FriendId>, PathRejection>,
    request: Result<Json<BalanceChangeRequest>, JsonRejection>,
) -> Result<Json<DebitResponse>, Error> {
    let Path(friend_id) = path?;
    debit_and_notify(state, friend_id, request, DebitRoute::Deduct)
}

/// A route handler for debiting a friend's balance as money sent to them.
///
/// Behaves like [deduct_endpoint] with a different message footer.
pub async fn send_endpoint(
    State(state): State<DebitState>,
    path: Result<Path<FriendId>, PathRejection>,
    request: Result<Json<BalanceChangeRequest>, JsonRejection>,
) -> Result<Json<DebitResponse>, Error> {
    let Path(friend_id) = path?;
    debit_and_notify(state, friend_id, request, DebitRoute::Send)
}

fn debit_and_notify(
    state: DebitState,
    friend_id: FriendId,
    request: Result<Json<BalanceChangeRequest>, JsonRejection>,
    route: DebitRoute,
) -> Result<Json<DebitResponse>, Error> {
    let Json(request) = request?;
    let amount = parse_positive_amount("amount", request.amount.as_ref())?;

    let now = OffsetDateTime::now_utc();
    let local_offset = local_offset_at(&state.local_timezone, now)?;

    let (applied, today_spend) = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("Could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        let applied = apply_balance_change(
            friend_id,
            BalanceChange::Debit,
            amount,
            request.note,
            now,
            &connection,
        )?;
        let today_spend = get_todays_spend(friend_id, now, local_offset, &connection)?;

        (applied, today_spend)
    };

    let message = compose_debit_message(
        &DebitSummary {
            friend: &applied.friend,
            transaction: &applied.transaction,
            todays_spend: today_spend,
        },
        route,
        local_offset,
    );
    send_in_background(state.whatsapp, applied.friend.whatsapp.clone(), message);

    Ok(Json(DebitResponse {
        friend: applied.friend,
        transaction: applied.transaction,
        today_spend,
    }))
}

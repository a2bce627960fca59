//! Defines the endpoint for crediting a friend's balance.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{
        FromRef, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use rusqlite::Connection;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    amount::parse_positive_amount,
    database_id::FriendId,
    friend::Friend,
    transaction::{BalanceChange, BalanceChangeRequest, Transaction, apply_balance_change},
};

/// The state needed to credit a friend.
#[derive(Debug, Clone)]
pub struct CreditState {
    /// The database connection for managing the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreditState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response body after a credit.
#[derive(Debug, Serialize)]
pub struct CreditResponse {
    /// The friend with their new balance.
    pub friend: Friend,
    /// The credit's ledger entry.
    pub transaction: Transaction,
}

/// A route handler for adding money to a friend's balance. No message is sent.
pub async fn credit_endpoint(
    State(state): State<CreditState>,
    path: Result<Path<FriendId>, PathRejection>,
    request: Result<Json<BalanceChangeRequest>, JsonRejection>,
) -> Result<Json<CreditResponse>, Error> {
    let Path(friend_id) = path?;
    let Json(request) = request?;
    let amount = parse_positive_amount("amount", request.amount.as_ref())?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let applied = apply_balance_change(
        friend_id,
        BalanceChange::Credit,
        amount,
        request.note,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    Ok(Json(CreditResponse {
        friend: applied.friend,
        transaction: applied.transaction,
    }))
}

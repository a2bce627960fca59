//! Defines the endpoints for setting a friend's saved amount and balance by hand.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{
        FromRef, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    amount::{parse_finite_amount, parse_non_negative_amount},
    database_id::FriendId,
    friend::{Friend, set_saved_amount, set_total_balance},
};

/// The state needed to edit a friend.
#[derive(Debug, Clone)]
pub struct EditFriendState {
    /// The database connection for managing friends.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditFriendState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for setting the saved amount.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAmountRequest {
    /// The new reference figure, zero or greater.
    pub saved_amount: Option<Value>,
}

/// The request body for overwriting the balance.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalBalanceRequest {
    /// The new spendable balance. May be negative.
    pub total_balance: Option<Value>,
}

/// A route handler for setting a friend's saved amount.
pub async fn set_saved_amount_endpoint(
    State(state): State<EditFriendState>,
    path: Result<Path<FriendId>, PathRejection>,
    request: Result<Json<SavedAmountRequest>, JsonRejection>,
) -> Result<Json<Friend>, Error> {
    let Path(friend_id) = path?;
    let Json(request) = request?;
    let saved_amount = parse_non_negative_amount("savedAmount", request.saved_amount.as_ref())?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    set_saved_amount(friend_id, saved_amount, &connection).map(Json)
}

/// A route handler for overwriting a friend's balance.
///
/// No ledger entry is written for this change.
pub async fn set_total_balance_endpoint(
    State(state): State<EditFriendState>,
    path: Result<Path<FriendId>, PathRejection>,
    request: Result<Json<TotalBalanceRequest>, JsonRejection>,
) -> Result<Json<Friend>, Error> {
    let Path(friend_id) = path?;
    let Json(request) = request?;
    let total_balance = parse_finite_amount("totalBalance", request.total_balance.as_ref())?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let friend = set_total_balance(
        friend_id,
        total_balance,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    tracing::info!("Balance of friend {friend_id} set to {total_balance}");

    Ok(Json(friend))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{get_test_server, get_test_state, must_create_friend},
        transaction::count_transactions_for_friend,
    };

    #[tokio::test]
    async fn sets_saved_amount() {
        let state = get_test_state(None);
        let friend = must_create_friend(&state, "A", 0.0);
        let server = get_test_server(state);

        let response = server
            .patch(&format_endpoint(endpoints::FRIEND_SAVED, friend.id))
            .json(&json!({ "savedAmount": "1500.75" }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["savedAmount"], 1500.75);
        assert_eq!(body["lastUpdatedAt"], Value::Null);
    }

    #[tokio::test]
    async fn negative_saved_amount_is_rejected() {
        let state = get_test_state(None);
        let friend = must_create_friend(&state, "A", 0.0);
        let server = get_test_server(state);

        server
            .patch(&format_endpoint(endpoints::FRIEND_SAVED, friend.id))
            .json(&json!({ "savedAmount": -1 }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sets_balance_without_ledger_entry() {
        let state = get_test_state(None);
        let friend = must_create_friend(&state, "A", 100.0);
        let server = get_test_server(state.clone());

        let response = server
            .patch(&format_endpoint(endpoints::FRIEND_BALANCE, friend.id))
            .json(&json!({ "totalBalance": -20 }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["totalBalance"], -20.0);
        assert_ne!(body["lastUpdatedAt"], Value::Null);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions_for_friend(friend.id, &connection), Ok(0));
    }

    #[tokio::test]
    async fn missing_friend_is_not_found() {
        let server = get_test_server(get_test_state(None));

        let response = server
            .patch(&format_endpoint(endpoints::FRIEND_BALANCE, 404))
            .json(&json!({ "totalBalance": 1 }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], "friend not found");
    }
}

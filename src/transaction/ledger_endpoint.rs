//! Defines the endpoint for listing a friend's ledger.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::FriendId,
    friend::get_friend,
    transaction::{Transaction, get_transactions_for_friend},
};

/// The state needed to read a friend's ledger.
#[derive(Debug, Clone)]
pub struct LedgerState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that responds with every entry in a friend's ledger, newest first.
pub async fn get_ledger_endpoint(
    State(state): State<LedgerState>,
    path: Result<Path<FriendId>, PathRejection>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let Path(friend_id) = path?;
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_friend(friend_id, &connection)?;

    get_transactions_for_friend(friend_id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::Value;
    use time::macros::datetime;

    use crate::{
        endpoints::{self, format_endpoint},
        loan::create_loan,
        test_utils::{get_test_server, get_test_state, must_create_friend},
        transaction::{BalanceChange, apply_balance_change},
    };

    #[tokio::test]
    async fn lists_every_kind_newest_first() {
        let state = get_test_state(None);
        let friend = must_create_friend(&state, "A", 100.0);
        {
            let connection = state.db_connection.lock().unwrap();
            apply_balance_change(
                friend.id,
                BalanceChange::Debit,
                10.0,
                None,
                datetime!(2026-10-18 09:00 UTC),
                &connection,
            )
            .unwrap();
            create_loan(
                friend.id,
                50.0,
                None,
                datetime!(2026-10-18 10:00 UTC),
                &connection,
            )
            .unwrap();
        }
        let server = get_test_server(state);

        let response = server
            .get(&format_endpoint(endpoints::FRIEND_TRANSACTIONS, friend.id))
            .await;

        response.assert_status_ok();
        let kinds = response
            .json::<Vec<Value>>()
            .iter()
            .map(|entry| entry["type"].as_str().unwrap_or_default().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(kinds, ["loan", "debit"]);
    }

    #[tokio::test]
    async fn missing_friend_is_not_found() {
        let server = get_test_server(get_test_state(None));

        server
            .get(&format_endpoint(endpoints::FRIEND_TRANSACTIONS, 404))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

//! Defines the read-only loan endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::FriendId,
    loan::{LoanLedger, LoanOverview, get_loan_ledger, get_loan_overview},
};

/// The state needed to read the loan ledger.
#[derive(Debug, Clone)]
pub struct LoanLedgerState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoanLedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that responds with one friend's loans, repayments and owed amount.
pub async fn get_friend_loans_endpoint(
    State(state): State<LoanLedgerState>,
    path: Result<Path<FriendId>, PathRejection>,
) -> Result<Json<LoanLedger>, Error> {
    let Path(friend_id) = path?;
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_loan_ledger(friend_id, &connection).map(Json)
}

/// A route handler that responds with every friend's owed amount and the total.
pub async fn get_loan_overview_endpoint(
    State(state): State<LoanLedgerState>,
) -> Result<Json<LoanOverview>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_loan_overview(&connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use time::OffsetDateTime;

    use crate::{
        endpoints::{self, format_endpoint},
        loan::{create_loan, record_repayment},
        test_utils::{get_test_server, get_test_state, must_create_friend},
        transaction::{BalanceChange, apply_balance_change},
    };

    #[tokio::test]
    async fn friend_ledger_has_only_loan_entries() {
        let state = get_test_state(None);
        let friend = must_create_friend(&state, "A", 100.0);
        {
            let connection = state.db_connection.lock().unwrap();
            let now = OffsetDateTime::now_utc();
            apply_balance_change(friend.id, BalanceChange::Debit, 5.0, None, now, &connection)
                .unwrap();
            create_loan(friend.id, 300.0, None, now, &connection).unwrap();
            record_repayment(friend.id, 120.0, None, now, &connection).unwrap();
        }
        let server = get_test_server(state);

        let response = server
            .get(&format_endpoint(endpoints::FRIEND_LOANS, friend.id))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["owedAmount"], 180.0);
        assert_eq!(body["friend"]["id"], friend.id);
        let kinds = body["transactions"]
            .as_array()
            .expect("transactions is not an array")
            .iter()
            .map(|entry| entry["type"].as_str().unwrap_or_default().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(kinds, ["repay", "loan"]);
    }

    #[tokio::test]
    async fn friend_ledger_for_missing_friend_is_not_found() {
        let server = get_test_server(get_test_state(None));

        server
            .get(&format_endpoint(endpoints::FRIEND_LOANS, 404))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn overview_lists_owed_amounts_and_total() {
        let state = get_test_state(None);
        let a = must_create_friend(&state, "A", 0.0);
        let b = must_create_friend(&state, "B", 0.0);
        {
            let connection = state.db_connection.lock().unwrap();
            let now = OffsetDateTime::now_utc();
            create_loan(a.id, 100.0, None, now, &connection).unwrap();
            create_loan(b.id, 20.5, None, now, &connection).unwrap();
        }
        let server = get_test_server(state);

        let response = server.get(endpoints::LOAN_OVERVIEW).await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({
                "friends": [
                    { "id": a.id, "name": "A", "whatsapp": "911234567890", "owedAmount": 100.0 },
                    { "id": b.id, "name": "B", "whatsapp": "911234567890", "owedAmount": 20.5 },
                ],
                "totalOwed": 120.5,
            })
        );
    }
}

//! Defines the endpoints for amending and deleting loan entries.

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
    amount::parse_optional_amount,
    database_id::TransactionId,
    friend::Friend,
    loan::{AmountChange, LoanAmendment, LoanChange, amend_loan, delete_loan},
    transaction::Transaction,
};

/// The state needed to amend or delete a loan entry.
#[derive(Debug, Clone)]
pub struct EditLoanState {
    /// The database connection for managing the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditLoanState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for amending a loan entry.
///
/// At most one of `amount` and `increment` may be given.
#[derive(Debug, Deserialize)]
pub struct AmendLoanRequest {
    /// The new amount, zero or greater.
    pub amount: Option<Value>,
    /// A signed delta to add to the current amount.
    pub increment: Option<Value>,
    /// The new reason. An empty string clears it.
    pub reason: Option<String>,
}

impl TryFrom<AmendLoanRequest> for LoanAmendment {
    type Error = Error;

    fn try_from(request: AmendLoanRequest) -> Result<Self, Self::Error> {
        let amount = parse_optional_amount("amount", request.amount.as_ref())?;
        let increment = parse_optional_amount("increment", request.increment.as_ref())?;

        let amount = match (amount, increment) {
            (Some(_), Some(_)) => {
                return Err(Error::Validation(
                    "provide either amount or increment, not both".to_owned(),
                ));
            }
            (Some(amount), None) => Some(AmountChange::Set(amount)),
            (None, Some(delta)) => Some(AmountChange::Increment(delta)),
            (None, None) => None,
        };

        Ok(LoanAmendment {
            amount,
            reason: request.reason,
        })
    }
}

/// The response body after amending a loan entry.
#[derive(Debug, Serialize)]
pub struct AmendLoanResponse {
    /// The amended entry.
    pub loan: Transaction,
    /// The friend with the recomputed owed amount.
    pub friend: Friend,
}

/// A route handler for changing the amount or reason of a loan or repayment entry.
pub async fn amend_loan_endpoint(
    State(state): State<EditLoanState>,
    path: Result<Path<TransactionId>, PathRejection>,
    request: Result<Json<AmendLoanRequest>, JsonRejection>,
) -> Result<Json<AmendLoanResponse>, Error> {
    let Path(loan_id) = path?;
    let Json(request) = request?;
    let amendment = LoanAmendment::try_from(request)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let LoanChange { entry, friend } =
        amend_loan(loan_id, amendment, OffsetDateTime::now_utc(), &connection)?;

    tracing::info!(
        "Amended loan entry {loan_id}, friend {} now owes {}",
        friend.id,
        friend.owed_amount
    );

    Ok(Json(AmendLoanResponse {
        loan: entry,
        friend,
    }))
}

/// The response body after deleting a loan entry.
#[derive(Debug, Serialize)]
pub struct DeleteLoanResponse {
    /// The ID of the entry that was deleted.
    pub deleted: TransactionId,
    /// The friend with the recomputed owed amount.
    pub friend: Friend,
}

/// A route handler for deleting a loan or repayment entry.
pub async fn delete_loan_endpoint(
    State(state): State<EditLoanState>,
    path: Result<Path<TransactionId>, PathRejection>,
) -> Result<Json<DeleteLoanResponse>, Error> {
    let Path(loan_id) = path?;
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let friend = delete_loan(loan_id, OffsetDateTime::now_utc(), &connection)?;

    tracing::info!("Deleted loan entry {loan_id}");

    Ok(Json(DeleteLoanResponse {
        deleted: loan_id,
        friend,
    }))
}

//! The loan ledger and the owed-amount projection derived from it.
//!
//! A friend's `owed_amount` is a cache of `sum(loan) - sum(repay)` over their
//! ledger. Every function here that writes a loan or repayment entry finishes by
//! calling [recompute_owed_amount] inside the same SQL transaction, which
//! replaces the cached value rather than adjusting it.

use rusqlite::{Connection, params};
use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    database_id::{FriendId, TransactionId},
    friend::{Friend, get_friend},
    transaction::{
        Transaction, TransactionType, create_transaction, get_loan_entries_for_friend,
        get_transaction,
    },
};

/// Repayments may exceed the owed amount by at most this much to absorb
/// floating point error in the recomputed sum.
const REPAYMENT_TOLERANCE: f64 = 1e-9;

// ============================================================================
// MODELS
// ============================================================================

/// A loan or repayment entry together with its owner after the owed amount
/// was recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanChange {
    /// The entry that was written.
    pub entry: Transaction,
    /// The friend with the recomputed owed amount.
    pub friend: Friend,
}

/// How to change the amount of an existing loan entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmountChange {
    /// Replace the amount. Must be zero or greater.
    Set(f64),
    /// Add a signed delta to the amount. The result must be zero or greater.
    Increment(f64),
}

/// The fields of a loan entry that may be amended.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoanAmendment {
    /// The new amount, if it should change.
    pub amount: Option<AmountChange>,
    /// The new reason, if it should change. A blank reason clears it.
    pub reason: Option<String>,
}

/// One friend's loan ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanLedger {
    /// The friend the ledger belongs to.
    pub friend: Friend,
    /// The friend's current owed amount.
    pub owed_amount: f64,
    /// The loan and repayment entries, newest first.
    pub transactions: Vec<Transaction>,
}

/// How much one friend owes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwedSummary {
    /// The friend's ID.
    pub id: FriendId,
    /// The friend's name.
    pub name: String,
    /// The friend's WhatsApp number.
    pub whatsapp: String,
    /// The friend's current owed amount.
    pub owed_amount: f64,
}

/// The owed amount of every friend and the grand total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanOverview {
    /// One entry per friend, largest owed amount first.
    pub friends: Vec<OwedSummary>,
    /// The sum of all owed amounts.
    pub total_owed: f64,
}

// ============================================================================
// RECOMPUTE
// ============================================================================

/// Recalculate a friend's owed amount from their ledger and store it.
///
/// The stored value is replaced with `sum(loan) - sum(repay)` and
/// `last_updated_at` is set to `now`. Returns the new owed amount.
///
/// # Errors
/// This function will return a:
/// - [Error::FriendNotFound] if `friend_id` does not refer to a valid friend,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn recompute_owed_amount(
    friend_id: FriendId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<f64, Error> {
    let owed_amount: f64 = connection.query_row(
        "SELECT COALESCE(SUM(CASE type WHEN 'loan' THEN amount ELSE -amount END), 0.0)
         FROM \"transaction\"
         WHERE friend_id = ?1 AND type IN ('loan', 'repay')",
        [friend_id],
        |row| row.get(0),
    )?;

    let rows_affected = connection.execute(
        "UPDATE friend SET owed_amount = ?1, last_updated_at = ?2 WHERE id = ?3",
        params![owed_amount, now.to_offset(UtcOffset::UTC), friend_id],
    )?;

    if rows_affected == 0 {
        return Err(Error::FriendNotFound);
    }

    tracing::debug!("Recomputed owed amount for friend {friend_id}: {owed_amount}");

    Ok(owed_amount)
}

// ============================================================================
// LEDGER OPERATIONS
// ============================================================================

/// Lend `amount` to a friend.
///
/// The entry snapshots the owed amount before and after the loan.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `amount` is not a finite number greater than zero,
/// - [Error::FriendNotFound] if `friend_id` does not refer to a valid friend,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_loan(
    friend_id: FriendId,
    amount: f64,
    reason: Option<String>,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<LoanChange, Error> {
    validate_positive(amount)?;

    let sql_transaction = connection.unchecked_transaction()?;

    let friend = get_friend(friend_id, &sql_transaction)?;
    let entry = create_transaction(
        Transaction::build(friend_id, TransactionType::Loan, amount, now)
            .balances(friend.owed_amount, friend.owed_amount + amount)
            .note(reason),
        &sql_transaction,
    )?;
    recompute_owed_amount(friend_id, now, &sql_transaction)?;
    let friend = get_friend(friend_id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(LoanChange { entry, friend })
}

/// Record that a friend paid back `amount`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `amount` is not a finite number greater than zero,
/// - [Error::FriendNotFound] if `friend_id` does not refer to a valid friend,
/// - [Error::OverRepayment] if `amount` is more than the friend owes,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn record_repayment(
    friend_id: FriendId,
    amount: f64,
    reason: Option<String>,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<LoanChange, Error> {
    validate_positive(amount)?;

    let sql_transaction = connection.unchecked_transaction()?;

    let friend = get_friend(friend_id, &sql_transaction)?;

    if amount - friend.owed_amount > REPAYMENT_TOLERANCE {
        return Err(Error::OverRepayment {
            amount,
            owed: friend.owed_amount,
        });
    }

    let entry = create_transaction(
        Transaction::build(friend_id, TransactionType::Repay, amount, now)
            .balances(friend.owed_amount, friend.owed_amount - amount)
            .note(reason),
        &sql_transaction,
    )?;
    recompute_owed_amount(friend_id, now, &sql_transaction)?;
    let friend = get_friend(friend_id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(LoanChange { entry, friend })
}

/// Get a loan or repayment entry by its ID.
///
/// # Errors
/// This function will return a:
/// - [Error::LoanNotFound] if `loan_id` does not refer to a loan or repayment entry,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_loan_entry(loan_id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    match get_transaction(loan_id, connection) {
        Ok(entry) if entry.kind.is_loan_entry() => Ok(entry),
        Ok(_) | Err(Error::NotFound) => Err(Error::LoanNotFound),
        Err(error) => Err(error),
    }
}

/// Change the amount and/or reason of a loan or repayment entry.
///
/// The balance snapshots on the entry are left as they were when it was written.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if `amendment` changes nothing,
/// - [Error::InvalidAmount] if the new amount would be negative or not finite,
/// - [Error::OverRepayment] if a repayment would grow past what the friend owes,
/// - [Error::LoanNotFound] if `loan_id` does not refer to a loan or repayment entry,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn amend_loan(
    loan_id: TransactionId,
    amendment: LoanAmendment,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<LoanChange, Error> {
    if amendment.amount.is_none() && amendment.reason.is_none() {
        return Err(Error::Validation(
            "provide an amount, an increment or a reason to update".to_owned(),
        ));
    }

    if let Some(AmountChange::Set(amount) | AmountChange::Increment(amount)) = amendment.amount
        && !amount.is_finite()
    {
        return Err(Error::InvalidAmount("amount must be a number".to_owned()));
    }

    if let Some(AmountChange::Set(amount)) = amendment.amount
        && amount < 0.0
    {
        return Err(Error::InvalidAmount(
            "amount must be a number that is zero or greater".to_owned(),
        ));
    }

    let sql_transaction = connection.unchecked_transaction()?;

    let entry = get_loan_entry(loan_id, &sql_transaction)?;

    let amount = match amendment.amount {
        None => entry.amount,
        Some(AmountChange::Set(amount)) => amount,
        Some(AmountChange::Increment(delta)) => entry.amount + delta,
    };

    if amount < 0.0 {
        return Err(Error::InvalidAmount(format!(
            "the amended amount would be {amount:.2}, which is below zero"
        )));
    }

    if entry.kind == TransactionType::Repay {
        let owed = get_friend(entry.friend_id, &sql_transaction)?.owed_amount + entry.amount;

        if amount - owed > REPAYMENT_TOLERANCE {
            return Err(Error::OverRepayment { amount, owed });
        }
    }

    let note = match amendment.reason {
        None => entry.note.clone(),
        Some(reason) => Some(reason.trim().to_owned()).filter(|reason| !reason.is_empty()),
    };

    sql_transaction.execute(
        "UPDATE \"transaction\" SET amount = ?1, note = ?2 WHERE id = ?3",
        params![amount, note, loan_id],
    )?;
    recompute_owed_amount(entry.friend_id, now, &sql_transaction)?;
    let friend = get_friend(entry.friend_id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(LoanChange {
        entry: Transaction {
            amount,
            note,
            ..entry
        },
        friend,
    })
}

/// Delete a loan or repayment entry and return its owner with the recomputed
/// owed amount.
///
/// # Errors
/// This function will return a:
/// - [Error::LoanNotFound] if `loan_id` does not refer to a loan or repayment entry,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_loan(
    loan_id: TransactionId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Friend, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let entry = get_loan_entry(loan_id, &sql_transaction)?;

    sql_transaction.execute(
        "DELETE FROM \"transaction\" WHERE id = :id",
        &[(":id", &loan_id)],
    )?;
    recompute_owed_amount(entry.friend_id, now, &sql_transaction)?;
    let friend = get_friend(entry.friend_id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(friend)
}

// ============================================================================
// QUERIES
// ============================================================================

/// Get a friend's loan and repayment entries with their owed amount.
///
/// # Errors
/// This function will return a:
/// - [Error::FriendNotFound] if `friend_id` does not refer to a valid friend,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_loan_ledger(friend_id: FriendId, connection: &Connection) -> Result<LoanLedger, Error> {
    let friend = get_friend(friend_id, connection)?;
    let transactions = get_loan_entries_for_friend(friend_id, connection)?;

    Ok(LoanLedger {
        owed_amount: friend.owed_amount,
        friend,
        transactions,
    })
}

/// Get every friend's owed amount and the total.
///
/// This reads the stored owed amounts and does not recompute them.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_loan_overview(connection: &Connection) -> Result<LoanOverview, Error> {
    let mut statement = connection.prepare(
        "SELECT id, name, whatsapp, owed_amount FROM friend ORDER BY owed_amount DESC, name ASC",
    )?;

    let friends = statement
        .query_map([], |row| {
            Ok(OwedSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                whatsapp: row.get(2)?,
                owed_amount: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let total_owed = friends.iter().map(|friend| friend.owed_amount).sum();

    Ok(LoanOverview {
        friends,
        total_owed,
    })
}

fn validate_positive(amount: f64) -> Result<(), Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAmount(
            "amount must be a number greater than zero".to_owned(),
        ))
    }
}

// ============================================================================
// TESTS
// ============================================================================

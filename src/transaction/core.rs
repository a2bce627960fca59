//! Defines the ledger entry model and its database queries.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    database_id::{FriendId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// What kind of money movement a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money added to the friend's spendable balance.
    Credit,
    /// Money taken from the friend's spendable balance.
    Debit,
    /// Money lent to the friend, increasing what they owe.
    Loan,
    /// Money the friend paid back, decreasing what they owe.
    Repay,
}

impl TransactionType {
    /// The name used in the database and in JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Loan => "loan",
            Self::Repay => "repay",
        }
    }

    /// Whether the entry belongs to the loan ledger.
    pub fn is_loan_entry(self) -> bool {
        matches!(self, Self::Loan | Self::Repay)
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            "loan" => Ok(Self::Loan),
            "repay" => Ok(Self::Repay),
            other => Err(format!("unknown transaction type \"{other}\"")),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// An entry in a friend's ledger.
///
/// Entries are append-only, except that loan and repayment entries may have
/// their amount or note amended, or be deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the entry.
    pub id: TransactionId,
    /// The friend the entry belongs to.
    pub friend_id: FriendId,
    /// The kind of money movement.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The amount of money moved. Always zero or greater.
    pub amount: f64,
    /// The balance before this entry was written.
    ///
    /// For debits and credits this is the spendable balance, for loans and
    /// repayments it is the owed amount. Kept for display only.
    pub previous_balance: Option<f64>,
    /// The balance after this entry was written.
    pub new_balance: Option<f64>,
    /// A free text note, called the reason for loans.
    pub note: Option<String>,
    /// When the entry was written.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new ledger entry.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        friend_id: FriendId,
        kind: TransactionType,
        amount: f64,
        created_at: OffsetDateTime,
    ) -> TransactionBuilder {
        TransactionBuilder {
            friend_id,
            kind,
            amount,
            previous_balance: None,
            new_balance: None,
            note: None,
            created_at,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The balance snapshots and note are optional and default to `None`.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The friend the entry belongs to.
    pub friend_id: FriendId,
    /// The kind of money movement.
    pub kind: TransactionType,
    /// The amount of money moved.
    pub amount: f64,
    /// The balance before the entry.
    pub previous_balance: Option<f64>,
    /// The balance after the entry.
    pub new_balance: Option<f64>,
    /// A free text note.
    pub note: Option<String>,
    /// When the entry is written.
    pub created_at: OffsetDateTime,
}

impl TransactionBuilder {
    /// Record the balance before and after the entry.
    pub fn balances(mut self, previous_balance: f64, new_balance: f64) -> Self {
        self.previous_balance = Some(previous_balance);
        self.new_balance = Some(new_balance);
        self
    }

    /// Set the note for the entry. Blank notes are stored as `None`.
    pub fn note(mut self, note: Option<String>) -> Self {
        self.note = note
            .map(|note| note.trim().to_owned())
            .filter(|note| !note.is_empty());
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                friend_id INTEGER NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('credit', 'debit', 'loan', 'repay')),
                amount REAL NOT NULL,
                previous_balance REAL,
                new_balance REAL,
                note TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY(friend_id) REFERENCES friend(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Every ledger query filters by friend and type, and the today's-spend query by time.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_friend_type_created \
        ON \"transaction\"(friend_id, type, created_at);",
        (),
    )?;

    Ok(())
}

const SELECT_TRANSACTION_COLUMNS: &str = "SELECT id, friend_id, type, amount, previous_balance, \
    new_balance, note, created_at FROM \"transaction\"";

/// Map a database row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        friend_id: row.get(1)?,
        kind: row.get(2)?,
        amount: row.get(3)?,
        previous_balance: row.get(4)?,
        new_balance: row.get(5)?,
        note: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Insert a ledger entry.
///
/// Timestamps are stored in UTC so that they sort and compare as text.
///
/// # Errors
/// This function will return a:
/// - [Error::FriendNotFound] if the friend ID does not refer to a valid friend,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\" \
             (friend_id, type, amount, previous_balance, new_balance, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, friend_id, type, amount, previous_balance, new_balance, note, created_at",
        )?
        .query_row(
            params![
                builder.friend_id,
                builder.kind,
                builder.amount,
                builder.previous_balance,
                builder.new_balance,
                builder.note,
                builder.created_at.to_offset(UtcOffset::UTC),
            ],
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::FriendNotFound,
            error => error.into(),
        })
}

/// Retrieve a ledger entry from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid entry,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!("{SELECT_TRANSACTION_COLUMNS} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get the ledger for one friend, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_transactions_for_friend(
    friend_id: FriendId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    query_ledger(friend_id, "", connection)
}

/// Get only the loan and repayment entries for one friend, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_loan_entries_for_friend(
    friend_id: FriendId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    query_ledger(friend_id, "AND type IN ('loan', 'repay')", connection)
}

fn query_ledger(
    friend_id: FriendId,
    type_filter: &str,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut statement = connection.prepare(&format!(
        "{SELECT_TRANSACTION_COLUMNS} WHERE friend_id = ?1 {type_filter} \
        ORDER BY created_at DESC, id DESC"
    ))?;

    statement
        .query_map([friend_id], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the number of ledger entries belonging to a friend.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
#[cfg(test)]
pub fn count_transactions_for_friend(
    friend_id: FriendId,
    connection: &Connection,
) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE friend_id = ?1",
            [friend_id],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

// ============================================================================
// TESTS
// ============================================================================

//! Defines the friend model and its database queries.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, database_id::FriendId};

// ============================================================================
// MODELS
// ============================================================================

/// A tracked counterparty with a spendable balance and a loan relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    /// The ID of the friend.
    pub id: FriendId,
    /// The display name.
    pub name: String,
    /// The WhatsApp number, digits only.
    pub whatsapp: String,
    /// A reference figure set by the user. Never derived from the ledger.
    pub saved_amount: f64,
    /// The current spendable balance, moved by debits and credits.
    pub total_balance: f64,
    /// The net amount this friend owes the user.
    ///
    /// This is a cache of the loan ledger and is only ever written by the
    /// owed-amount recompute that follows each loan or repayment change.
    pub owed_amount: f64,
    /// When the friend was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When a balance-affecting change was last made.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated_at: Option<OffsetDateTime>,
}

/// The validated fields needed to create a [Friend].
#[derive(Debug, Clone, PartialEq)]
pub struct NewFriend {
    /// The display name, trimmed and non-empty.
    pub name: String,
    /// The WhatsApp number, digits only.
    pub whatsapp: String,
    /// The initial reference figure.
    pub saved_amount: f64,
    /// The initial spendable balance.
    pub total_balance: f64,
}

impl NewFriend {
    /// Validate and normalise the fields for a new friend.
    ///
    /// Surrounding whitespace is trimmed from `name` and `whatsapp` is reduced to its digits,
    /// so "+91 12345-67890" becomes "911234567890".
    ///
    /// # Errors
    /// Returns [Error::Validation] if `name` is blank or `whatsapp` has no digits.
    pub fn new(name: &str, whatsapp: &str) -> Result<Self, Error> {
        let name = name.trim();
        let whatsapp = normalize_whatsapp(whatsapp);

        if name.is_empty() || whatsapp.is_empty() {
            return Err(Error::Validation(
                "name and whatsapp are required".to_owned(),
            ));
        }

        Ok(Self {
            name: name.to_owned(),
            whatsapp,
            saved_amount: 0.0,
            total_balance: 0.0,
        })
    }

    /// Set the initial reference figure.
    pub fn saved_amount(mut self, saved_amount: f64) -> Self {
        self.saved_amount = saved_amount;
        self
    }

    /// Set the initial spendable balance.
    pub fn total_balance(mut self, total_balance: f64) -> Self {
        self.total_balance = total_balance;
        self
    }
}

/// Strip everything but ASCII digits from a phone number.
pub fn normalize_whatsapp(whatsapp: &str) -> String {
    whatsapp.chars().filter(char::is_ascii_digit).collect()
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the friend table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_friend_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS friend (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            whatsapp TEXT NOT NULL,
            saved_amount REAL NOT NULL DEFAULT 0,
            total_balance REAL NOT NULL DEFAULT 0,
            owed_amount REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            last_updated_at TEXT
        )",
        (),
    )?;

    Ok(())
}

const SELECT_FRIEND_COLUMNS: &str = "SELECT id, name, whatsapp, saved_amount, total_balance, \
    owed_amount, created_at, last_updated_at FROM friend";

/// Map a database row to a [Friend].
pub fn map_friend_row(row: &Row) -> Result<Friend, rusqlite::Error> {
    Ok(Friend {
        id: row.get(0)?,
        name: row.get(1)?,
        whatsapp: row.get(2)?,
        saved_amount: row.get(3)?,
        total_balance: row.get(4)?,
        owed_amount: row.get(5)?,
        created_at: row.get(6)?,
        last_updated_at: row.get(7)?,
    })
}

/// Create a new friend in the database.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn create_friend(
    new_friend: NewFriend,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Friend, Error> {
    let friend = connection
        .prepare(
            "INSERT INTO friend (name, whatsapp, saved_amount, total_balance, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, name, whatsapp, saved_amount, total_balance, owed_amount, \
             created_at, last_updated_at",
        )?
        .query_row(
            params![
                new_friend.name,
                new_friend.whatsapp,
                new_friend.saved_amount,
                new_friend.total_balance,
                created_at.to_offset(UtcOffset::UTC),
            ],
            map_friend_row,
        )?;

    Ok(friend)
}

/// Retrieve a friend from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::FriendNotFound] if `id` does not refer to a valid friend,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_friend(id: FriendId, connection: &Connection) -> Result<Friend, Error> {
    connection
        .prepare(&format!("{SELECT_FRIEND_COLUMNS} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_friend_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::FriendNotFound,
            error => error.into(),
        })
}

/// Get all friends, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_friends(connection: &Connection) -> Result<Vec<Friend>, Error> {
    let mut statement = connection.prepare(&format!(
        "{SELECT_FRIEND_COLUMNS} ORDER BY created_at DESC, id DESC"
    ))?;

    statement
        .query_map([], map_friend_row)?
        .map(|maybe_friend| maybe_friend.map_err(Error::from))
        .collect()
}

/// Set the user's reference figure for a friend.
///
/// This is not a balance-affecting change so `last_updated_at` is left alone.
///
/// # Errors
/// Returns [Error::FriendNotFound] if `id` does not refer to a valid friend.
pub fn set_saved_amount(
    id: FriendId,
    saved_amount: f64,
    connection: &Connection,
) -> Result<Friend, Error> {
    let rows_affected = connection.execute(
        "UPDATE friend SET saved_amount = ?1 WHERE id = ?2",
        params![saved_amount, id],
    )?;

    if rows_affected == 0 {
        return Err(Error::FriendNotFound);
    }

    get_friend(id, connection)
}

/// Overwrite a friend's spendable balance without writing a ledger entry.
///
/// # Errors
/// Returns [Error::FriendNotFound] if `id` does not refer to a valid friend.
pub fn set_total_balance(
    id: FriendId,
    total_balance: f64,
    updated_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Friend, Error> {
    let rows_affected = connection.execute(
        "UPDATE friend SET total_balance = ?1, last_updated_at = ?2 WHERE id = ?3",
        params![total_balance, updated_at.to_offset(UtcOffset::UTC), id],
    )?;

    if rows_affected == 0 {
        return Err(Error::FriendNotFound);
    }

    get_friend(id, connection)
}

/// Delete a friend and, through the foreign key cascade, all of its transactions.
///
/// # Errors
/// Returns [Error::FriendNotFound] if `id` does not refer to a valid friend.
pub fn delete_friend(id: FriendId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM friend WHERE id = :id", &[(":id", &id)])?;

    if rows_affected == 0 {
        return Err(Error::FriendNotFound);
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

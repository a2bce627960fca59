//! The running total of a friend's debits for the current local day.

use rusqlite::{Connection, params};
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, database_id::FriendId, timezone::local_day_bounds};

/// Sum the debits recorded for a friend on the local calendar day containing `now`.
///
/// The day runs from local midnight to 23:59:59.999 inclusive, where local time is
/// `now` shifted to `local_offset`. Credits, loans and repayments are ignored.
///
/// Call this after writing a debit to include that debit in the total.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_todays_spend(
    friend_id: FriendId,
    now: OffsetDateTime,
    local_offset: UtcOffset,
    connection: &Connection,
) -> Result<f64, Error> {
    let (start, end) = local_day_bounds(now, local_offset);

    // Timestamps are stored as UTC text, so the bounds compare as text too.
    let total = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\"
         WHERE friend_id = ?1 AND type = 'debit' AND created_at BETWEEN ?2 AND ?3",
        params![friend_id, start, end],
        |row| row.get(0),
    )?;

    Ok(total)
}

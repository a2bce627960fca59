//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::{OffsetDateTime, UtcOffset};

use crate::{Error, db::initialize, notification::WhatsAppClient, timezone::get_offset_at};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,

    /// The messaging client, or `None` if WhatsApp credentials are not configured.
    pub whatsapp: Option<WhatsAppClient>,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Asia/Kolkata".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        whatsapp: Option<WhatsAppClient>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            whatsapp,
            db_connection: connection,
        })
    }
}

/// Get the UTC offset of `local_timezone` at the instant `now`.
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a known
/// canonical timezone name.
pub(crate) fn local_offset_at(
    local_timezone: &str,
    now: OffsetDateTime,
) -> Result<UtcOffset, Error> {
    get_offset_at(local_timezone, now).ok_or_else(|| {
        tracing::error!("Invalid timezone {local_timezone}");
        Error::InvalidTimezoneError(local_timezone.to_owned())
    })
}

//! Defines the endpoint for listing friends.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    friend::{Friend, list_friends},
};

/// The state needed to list friends.
#[derive(Debug, Clone)]
pub struct ListFriendsState {
    /// The database connection for reading friends.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListFriendsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that responds with every friend, newest first.
pub async fn list_friends_endpoint(
    State(state): State<ListFriendsState>,
) -> Result<Json<Vec<Friend>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    list_friends(&connection).map(Json)
}

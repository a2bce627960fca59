//! Defines the endpoint for deleting a friend.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{AppState, Error, database_id::FriendId, friend::delete_friend};

/// The state needed to delete a friend.
#[derive(Debug, Clone)]
pub struct DeleteFriendState {
    /// The database connection for managing friends.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteFriendState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The response body after deleting a friend.
#[derive(Debug, Serialize)]
pub struct DeletedFriend {
    /// The ID of the friend that was deleted.
    pub deleted: FriendId,
}

/// A route handler for deleting a friend and their whole ledger.
pub async fn delete_friend_endpoint(
    State(state): State<DeleteFriendState>,
    path: Result<Path<FriendId>, PathRejection>,
) -> Result<Json<DeletedFriend>, Error> {
    let Path(friend_id) = path?;
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_friend(friend_id, &connection)?;

    tracing::info!("Deleted friend {friend_id}");

    Ok(Json(DeletedFriend { deleted: friend_id }))
}

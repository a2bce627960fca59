#![allow(missing_docs)]

use axum_test::TestServer;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, build_router,
    friend::{Friend, NewFriend, create_friend},
    notification::WhatsAppClient,
};

pub(crate) const TEST_TIMEZONE: &str = "Asia/Kolkata";

pub(crate) fn get_test_state(whatsapp: Option<WhatsAppClient>) -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, TEST_TIMEZONE, whatsapp).expect("Could not create app state")
}

pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state))
}

#[track_caller]
pub(crate) fn must_create_friend(state: &AppState, name: &str, total_balance: f64) -> Friend {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database connection");

    create_friend(
        NewFriend::new(name, "+91 12345-67890")
            .expect("invalid test friend")
            .total_balance(total_balance),
        OffsetDateTime::now_utc(),
        &connection,
    )
    .expect("Could not create test friend")
}

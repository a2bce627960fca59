//! Defines the endpoint for creating a new friend.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    amount::{parse_non_negative_amount, parse_optional_amount},
    friend::{Friend, NewFriend, create_friend},
};

/// The state needed to create a friend.
#[derive(Debug, Clone)]
pub struct CreateFriendState {
    /// The database connection for managing friends.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateFriendState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a friend.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFriendRequest {
    /// The display name.
    pub name: Option<String>,
    /// The WhatsApp number in any format, e.g. "+91 12345-67890".
    pub whatsapp: Option<String>,
    /// The initial reference figure, zero or greater.
    pub saved_amount: Option<Value>,
    /// The initial spendable balance.
    pub total_balance: Option<Value>,
}

/// A route handler for creating a new friend, responds with the friend and 201 Created.
pub async fn create_friend_endpoint(
    State(state): State<CreateFriendState>,
    request: Result<Json<CreateFriendRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Friend>), Error> {
    let Json(request) = request?;

    let saved_amount = request
        .saved_amount
        .as_ref()
        .map(|value| parse_non_negative_amount("savedAmount", Some(value)))
        .transpose()?
        .unwrap_or_default();
    let total_balance =
        parse_optional_amount("totalBalance", request.total_balance.as_ref())?.unwrap_or_default();

    let new_friend = NewFriend::new(
        request.name.as_deref().unwrap_or_default(),
        request.whatsapp.as_deref().unwrap_or_default(),
    )?
    .saved_amount(saved_amount)
    .total_balance(total_balance);

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let friend = create_friend(new_friend, OffsetDateTime::now_utc(), &connection)?;

    tracing::info!("Created friend {} ({})", friend.id, friend.name);

    Ok((StatusCode::CREATED, Json(friend)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        friend::get_friend,
        test_utils::{get_test_server, get_test_state},
    };

    #[tokio::test]
    async fn creates_friend_with_normalised_number() {
        let state = get_test_state(None);
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::FRIENDS)
            .json(&json!({
                "name": "  A  ",
                "whatsapp": "+91 12345-67890",
                "savedAmount": "1000",
                "totalBalance": 250.5,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["name"], "A");
        assert_eq!(body["whatsapp"], "911234567890");
        assert_eq!(body["savedAmount"], 1000.0);
        assert_eq!(body["totalBalance"], 250.5);
        assert_eq!(body["owedAmount"], 0.0);
        assert_eq!(body["lastUpdatedAt"], Value::Null);

        let id = body["id"].as_i64().expect("id is not an integer");
        let connection = state.db_connection.lock().unwrap();
        assert!(get_friend(id, &connection).is_ok());
    }

    #[tokio::test]
    async fn amounts_default_to_zero() {
        let server = get_test_server(get_test_state(None));

        let response = server
            .post(endpoints::FRIENDS)
            .json(&json!({ "name": "A", "whatsapp": "1" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["savedAmount"], 0.0);
        assert_eq!(body["totalBalance"], 0.0);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let server = get_test_server(get_test_state(None));

        for body in [
            json!({ "whatsapp": "1" }),
            json!({ "name": "A" }),
            json!({ "name": " ", "whatsapp": "1" }),
        ] {
            let response = server.post(endpoints::FRIENDS).json(&body).await;

            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(
                response.json::<Value>()["error"],
                "name and whatsapp are required"
            );
        }
    }

    #[tokio::test]
    async fn bad_amounts_are_rejected() {
        let server = get_test_server(get_test_state(None));

        for body in [
            json!({ "name": "A", "whatsapp": "1", "savedAmount": -1 }),
            json!({ "name": "A", "whatsapp": "1", "totalBalance": "lots" }),
        ] {
            server
                .post(endpoints::FRIENDS)
                .json(&body)
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }
    }
}

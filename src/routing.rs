//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    AppState, endpoints,
    friend::{
        create_friend_endpoint, delete_friend_endpoint, list_friends_endpoint,
        set_saved_amount_endpoint, set_total_balance_endpoint,
    },
    loan::{
        amend_loan_endpoint, create_loan_endpoint, delete_loan_endpoint,
        get_friend_loans_endpoint, get_loan_overview_endpoint, notify_friend_loans_endpoint,
        notify_loan_endpoint, repay_loan_endpoint,
    },
    transaction::{credit_endpoint, deduct_endpoint, get_ledger_endpoint, send_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let friend_routes = Router::new()
        .route(
            endpoints::FRIENDS,
            get(list_friends_endpoint).post(create_friend_endpoint),
        )
        .route(endpoints::FRIEND, delete(delete_friend_endpoint))
        .route(endpoints::FRIEND_SAVED, patch(set_saved_amount_endpoint))
        .route(endpoints::FRIEND_BALANCE, patch(set_total_balance_endpoint))
        .route(endpoints::FRIEND_DEDUCT, post(deduct_endpoint))
        .route(endpoints::FRIEND_CREDIT, post(credit_endpoint))
        .route(endpoints::FRIEND_TRANSACTIONS, get(get_ledger_endpoint))
        .route(endpoints::SEND, post(send_endpoint));

    let loan_routes = Router::new()
        .route(endpoints::LOANS, post(create_loan_endpoint))
        .route(endpoints::LOAN_REPAY, post(repay_loan_endpoint))
        .route(
            endpoints::LOAN,
            patch(amend_loan_endpoint).delete(delete_loan_endpoint),
        )
        .route(endpoints::LOAN_NOTIFY, post(notify_loan_endpoint))
        .route(endpoints::FRIEND_LOANS, get(get_friend_loans_endpoint))
        .route(
            endpoints::FRIEND_LOANS_NOTIFY,
            post(notify_friend_loans_endpoint),
        )
        .route(endpoints::LOAN_OVERVIEW, get(get_loan_overview_endpoint));

    Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .merge(friend_routes)
        .merge(loan_routes)
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Report that the server is up.
async fn get_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested route does not exist" })),
    )
        .into_response()
}

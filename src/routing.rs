//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use crate::{
    AppState,
    activity::get_activity,
    auth::{auth_guard, get_me, post_log_in, post_log_out, register_user},
    endpoints,
    expense::{create_expense_endpoint, list_group_expenses_endpoint},
    group::{
        add_member_endpoint, create_group_endpoint, get_group_endpoint, list_groups_endpoint,
    },
    not_found::get_404_not_found,
    settlement::{get_group_balances, get_settlement_plan, record_settlement},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out));

    let protected_routes = Router::new()
        .route(endpoints::ME, get(get_me))
        .route(
            endpoints::GROUPS,
            get(list_groups_endpoint).post(create_group_endpoint),
        )
        .route(endpoints::GROUP, get(get_group_endpoint))
        .route(endpoints::GROUP_MEMBERS, post(add_member_endpoint))
        .route(endpoints::EXPENSES, post(create_expense_endpoint))
        .route(endpoints::GROUP_EXPENSES, get(list_group_expenses_endpoint))
        .route(endpoints::SETTLEMENTS, post(record_settlement))
        .route(endpoints::GROUP_BALANCES, get(get_group_balances))
        .route(endpoints::SETTLEMENT_PLAN, get(get_settlement_plan))
        .route(endpoints::ACTIVITY, get(get_activity))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' reports that the service is up.
async fn get_index() -> Json<Value> {
    Json(json!({ "message": "Splitwise-like API is running" }))
}

/// Build a CORS layer that lets the front-end at `allowed_origins` send
/// credentialed requests.
///
/// Origins that are not valid header values are skipped with a warning.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!("Ignoring invalid allowed origin {origin:?}: {error}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
}

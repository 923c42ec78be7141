use axum::{
    Json, Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};

use crate::{
    AppState,
    middleware::{auth_middleware, log_errors},
    routes,
};

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/health", get(health))
}

/// Everything behind the bearer-token check. Role and ownership rules
/// live in the handlers; the layer only establishes who is calling.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/profile",
            get(routes::profile::get_profile).post(routes::profile::save_profile),
        )
        .route(
            "/events",
            get(routes::event::list_events).post(routes::event::create_event),
        )
        .route(
            "/events/{id}",
            put(routes::event::update_event).delete(routes::event::delete_event),
        )
        .route("/matching/volunteers", get(routes::matching::get_volunteers))
        .route(
            "/matching/suggestions/{event_id}",
            get(routes::matching::get_suggestions),
        )
        .route("/matching/assign", post(routes::matching::assign_volunteer))
        .route(
            "/history",
            get(routes::history::get_history).post(routes::history::create_history),
        )
        .route("/history/{id}", put(routes::history::update_history_status))
        .route(
            "/notifications",
            get(routes::notification::get_notifications)
                .post(routes::notification::create_notification),
        )
        .route(
            "/notifications/read-all",
            put(routes::notification::mark_all_read),
        )
        .route(
            "/notifications/{id}/read",
            put(routes::notification::mark_read),
        )
        .route(
            "/notifications/{id}",
            delete(routes::notification::delete_notification),
        )
        .layer(from_fn_with_state(state, auth_middleware))
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()));

    Router::new()
        .nest("/api", api)
        .layer(from_fn(log_errors))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    utils::{
        Claims, message_to_api_response, parse_uuid, success_to_api_response, success_with_message,
    },
};

use super::model::{Event, EventInfo, EventPayload, validate_event_payload};

#[axum::debug_handler]
pub async fn list_events(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let events = Event::list(&state.pool).await?;
    let events: Vec<EventInfo> = events.into_iter().map(EventInfo::from).collect();
    Ok((StatusCode::OK, success_to_api_response(events)))
}

#[axum::debug_handler]
pub async fn create_event(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;

    let validated = validate_event_payload(&payload)?;
    let event = Event::create(&state.pool, &validated).await?;

    Ok((
        StatusCode::CREATED,
        success_with_message(EventInfo::from(event), "Event created successfully!"),
    ))
}

#[axum::debug_handler]
pub async fn update_event(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;

    let Some(id) = parse_uuid(Some(&id)) else {
        return Err(AppError::bad_request("Valid event ID is required"));
    };
    let validated = validate_event_payload(&payload)?;
    let event = Event::update(&state.pool, id, &validated)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    Ok((
        StatusCode::OK,
        success_with_message(EventInfo::from(event), "Event updated successfully"),
    ))
}

#[axum::debug_handler]
pub async fn delete_event(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;

    let Some(id) = parse_uuid(Some(&id)) else {
        return Err(AppError::bad_request("Valid event ID is required"));
    };
    // history rows keep their snapshot of the event, so deletion is safe
    let deleted = Event::delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    Ok((
        StatusCode::OK,
        message_to_api_response("Event deleted successfully"),
    ))
}

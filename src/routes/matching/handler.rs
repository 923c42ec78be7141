use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    utils::{Claims, parse_uuid, success_to_api_response, success_with_message},
};

use super::model::{AssignRequest, Matching, VolunteerProfile};

#[axum::debug_handler]
pub async fn get_volunteers(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;

    let volunteers = Matching::volunteers(&state.pool).await?;
    let volunteers: Vec<VolunteerProfile> =
        volunteers.into_iter().map(VolunteerProfile::from).collect();
    Ok((StatusCode::OK, success_to_api_response(volunteers)))
}

#[axum::debug_handler]
pub async fn get_suggestions(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;

    let Some(event_id) = parse_uuid(Some(&event_id)) else {
        return Err(AppError::bad_request("Valid event ID is required"));
    };
    let suggestions = Matching::suggestions(&state.pool, event_id).await?;
    Ok((StatusCode::OK, success_to_api_response(suggestions)))
}

#[axum::debug_handler]
pub async fn assign_volunteer(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(payload): Json<AssignRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_admin()?;

    let (Some(volunteer_id), Some(event_id)) = (
        parse_uuid(payload.volunteer_id.as_deref()),
        parse_uuid(payload.event_id.as_deref()),
    ) else {
        return Err(AppError::bad_request(
            "Valid Volunteer ID and Event ID are required",
        ));
    };

    let record = Matching::assign(&state.pool, volunteer_id, event_id).await?;
    Ok((
        StatusCode::CREATED,
        success_with_message(record, "Volunteer assigned successfully"),
    ))
}

use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    utils::{Claims, parse_uuid, success_to_api_response, success_with_message},
};

use super::model::{
    ALLOWED_STATUSES, HistoryInfo, HistoryPayload, HistoryQuery, HistoryRecord, StatusUpdate,
    validate_history_payload,
};

#[axum::debug_handler]
pub async fn get_history(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let Some(user_id) = parse_uuid(query.user_id.as_deref()) else {
        return Err(AppError::bad_request("User ID is required"));
    };
    claims.require_owner_or_admin(user_id)?;

    let records = HistoryRecord::for_user(&state.pool, user_id).await?;
    let records: Vec<HistoryInfo> = records.into_iter().map(HistoryInfo::from).collect();
    Ok((StatusCode::OK, success_to_api_response(records)))
}

#[axum::debug_handler]
pub async fn create_history(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(payload): Json<HistoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    let Some(user_id) = parse_uuid(payload.user_id.as_deref()) else {
        return Err(AppError::bad_request(
            "User ID, Event ID, and Event Name are required",
        ));
    };
    claims.require_owner_or_admin(user_id)?;

    let validated = validate_history_payload(user_id, &payload)?;
    let record = HistoryRecord::create(&state.pool, &validated)
        .await
        .map_err(|err| match AppError::from(err) {
            AppError::Conflict(_) => AppError::Conflict(
                "History record already exists for this user and event".to_string(),
            ),
            other => other,
        })?;

    Ok((
        StatusCode::CREATED,
        success_with_message(HistoryInfo::from(record), "History record created"),
    ))
}

#[axum::debug_handler]
pub async fn update_history_status(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let Some(id) = parse_uuid(Some(&id)) else {
        return Err(AppError::bad_request("Valid history record ID is required"));
    };
    let status = payload.status.as_deref().unwrap_or("");
    if status.is_empty() {
        return Err(AppError::bad_request("Status is required"));
    }

    let record = HistoryRecord::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("History record not found".to_string()))?;
    claims.require_owner_or_admin(record.user_id)?;

    if !ALLOWED_STATUSES.contains(&status) {
        return Err(AppError::bad_request("Invalid status value"));
    }

    // Any vocabulary value may replace any other; there is no
    // transition graph for participation status.
    let updated = HistoryRecord::update_status(&state.pool, id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("History record not found".to_string()))?;

    Ok((
        StatusCode::OK,
        success_with_message(HistoryInfo::from(updated), "Status updated"),
    ))
}

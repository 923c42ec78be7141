use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    utils::{
        Claims, message_to_api_response, parse_uuid, success_to_api_response,
        success_with_message,
    },
};

use super::model::{
    Notification, NotificationInfo, NotificationPayload, NotificationQuery, ReadAllResult,
    validate_notification_payload,
};

#[axum::debug_handler]
pub async fn get_notifications(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let Some(user_id) = parse_uuid(query.user_id.as_deref()) else {
        return Err(AppError::bad_request("User ID is required"));
    };
    claims.require_owner_or_admin(user_id)?;

    let notifications = Notification::for_user(&state.pool, user_id).await?;
    let notifications: Vec<NotificationInfo> = notifications
        .into_iter()
        .map(NotificationInfo::from)
        .collect();
    Ok((StatusCode::OK, success_to_api_response(notifications)))
}

#[axum::debug_handler]
pub async fn create_notification(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(payload): Json<NotificationPayload>,
) -> Result<impl IntoResponse, AppError> {
    let Some(user_id) = parse_uuid(payload.user_id.as_deref()) else {
        return Err(AppError::bad_request(
            "User ID, message, and type are required",
        ));
    };
    claims.require_owner_or_admin(user_id)?;

    let new = validate_notification_payload(user_id, &payload)?;
    let notification = Notification::create(&state.pool, &new).await?;

    Ok((
        StatusCode::CREATED,
        success_with_message(NotificationInfo::from(notification), "Notification created"),
    ))
}

#[axum::debug_handler]
pub async fn mark_read(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(id) = parse_uuid(Some(&id)) else {
        return Err(AppError::bad_request("Valid notification ID is required"));
    };
    let notification = Notification::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
    claims.require_owner_or_admin(notification.user_id)?;

    let updated = Notification::mark_read(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    Ok((
        StatusCode::OK,
        success_with_message(
            NotificationInfo::from(updated),
            "Notification marked as read",
        ),
    ))
}

#[axum::debug_handler]
pub async fn mark_all_read(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let Some(user_id) = parse_uuid(query.user_id.as_deref()) else {
        return Err(AppError::bad_request("User ID is required"));
    };
    claims.require_owner_or_admin(user_id)?;

    let unread = Notification::unread_ids(&state.pool, user_id).await?;
    let mut updated = 0;
    for id in unread {
        if Notification::mark_read(&state.pool, id).await?.is_some() {
            updated += 1;
        }
    }

    Ok((
        StatusCode::OK,
        success_with_message(
            ReadAllResult { updated },
            "All notifications marked as read",
        ),
    ))
}

#[axum::debug_handler]
pub async fn delete_notification(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let Some(id) = parse_uuid(Some(&id)) else {
        return Err(AppError::bad_request("Valid notification ID is required"));
    };
    let notification = Notification::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
    claims.require_owner_or_admin(notification.user_id)?;

    let deleted = Notification::delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }

    Ok((
        StatusCode::OK,
        message_to_api_response("Notification deleted"),
    ))
}

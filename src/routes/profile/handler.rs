use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    utils::{Claims, success_to_api_response},
};

use super::model::{Profile, ProfileInfo, ProfilePayload, validate_profile_payload};

#[axum::debug_handler]
pub async fn get_profile(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let profile = Profile::find_by_user(&state.pool, claims.sub)
        .await?
        .map(ProfileInfo::from);

    // data stays null until the volunteer completes their profile
    Ok((StatusCode::OK, success_to_api_response(profile)))
}

#[axum::debug_handler]
pub async fn save_profile(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(payload): Json<ProfilePayload>,
) -> Result<impl IntoResponse, AppError> {
    let validated = validate_profile_payload(&payload)?;
    let profile = Profile::upsert(&state.pool, claims.sub, &validated).await?;

    Ok((
        StatusCode::OK,
        success_to_api_response(ProfileInfo::from(profile)),
    ))
}

use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    utils::{
        Claims, generate_token, hash_password, success_to_api_response, success_with_message,
        verify_password,
    },
};

use super::model::{
    LoginRequest, LoginResponse, RegisterRequest, User, UserInfo, validate_login,
    validate_registration,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (email, password, role) = validate_registration(&req)?;

    if User::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&password)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?;

    // the unique index backs up the pre-check under concurrent registration
    let user = User::create(&state.pool, &email, &password_hash, &role)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Email already registered".to_string()),
            other => other,
        })?;

    Ok((
        StatusCode::CREATED,
        success_with_message(UserInfo::from(user), "Registration successful"),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (email, password) = validate_login(&req)?;

    let user = User::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = verify_password(&password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;
    if !valid {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = generate_token(user.id, &user.email, &user.role, &state.config)
        .map_err(|e| AppError::internal(format!("Failed to issue token: {}", e)))?;

    Ok((
        StatusCode::OK,
        success_with_message(
            LoginResponse {
                token,
                user: UserInfo::from(user),
            },
            "Login successful",
        ),
    ))
}

#[axum::debug_handler]
pub async fn me(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let user = User::find_by_id(&state.pool, claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok((StatusCode::OK, success_to_api_response(user)))
}

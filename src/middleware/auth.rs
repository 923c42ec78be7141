use axum::{
    RequestExt,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::AppState;
use crate::error::AppError;
use crate::utils::verify_token;

/// Validates the bearer token and stashes the decoded claims as a
/// request extension for handlers to pick up.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .extract_parts::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| AppError::Unauthorized("Access token required".to_string()))?;

    let claims = verify_token(bearer.token(), &state.config)
        .map_err(|_| AppError::Forbidden("Invalid or expired token".to_string()))?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

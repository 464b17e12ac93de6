use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;

use super::refresh_token::RefreshTokenRequest;
use super::ApiError;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!(user_id = %user.user_id, "Logout requested");

    state
        .auth_service
        .logout(&user.user_id, &body.refresh_token)
        .await
        .map_err(ApiError::from)?;

    Ok(StatusCode::NO_CONTENT)
}

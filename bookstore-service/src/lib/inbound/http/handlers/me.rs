use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::credentials::models::Identity;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<IdentityData>, ApiError> {
    state
        .auth_service
        .current_identity(&user.user_id)
        .await
        .map_err(ApiError::from)
        .map(|identity| ApiSuccess::new(StatusCode::OK, identity.into()))
}

/// Public view of an identity; the password hash never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityData {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for IdentityData {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            username: identity.username.to_string(),
            created_at: identity.created_at,
        }
    }
}

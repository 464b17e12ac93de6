use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::credentials::models::Registration;
use crate::credentials::models::Username;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<RegisterResponseData>, ApiError> {
    let username = Username::new(body.username)?;

    if body.password.is_empty() {
        return Err(ApiError::UnprocessableEntity(
            "Password must not be empty".to_string(),
        ));
    }

    state
        .auth_service
        .register(&username, &body.password)
        .await
        .map_err(ApiError::from)
        .map(|registration| ApiSuccess::new(StatusCode::CREATED, registration.into()))
}

/// HTTP request body for registration (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    username: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterResponseData {
    pub user_id: String,
    pub token_type: &'static str,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl From<Registration> for RegisterResponseData {
    fn from(registration: Registration) -> Self {
        Self {
            user_id: registration.identity_id.to_string(),
            token_type: "Bearer",
            access_token: registration.tokens.access.token,
            access_token_expires_at: registration.tokens.access.expires_at,
            refresh_token: registration.tokens.refresh.token,
            refresh_token_expires_at: registration.tokens.refresh.expires_at,
        }
    }
}

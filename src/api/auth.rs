use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, AppState, Message};
use crate::token::TokenError;

/// Response header carrying the authenticated subject id as hex. Useful for
/// downstream services behind a forward-auth proxy.
pub const AUTHORIZED_USER_HEADER: &str = "X-Authorized-User";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize)]
pub struct ValidateRequest {
    pub token: String,
}

/// POST /login
/// Authenticate with username and password; returns a session token valid
/// for 24 hours. Every credential failure maps to the same 401 so the
/// endpoint cannot be used to enumerate usernames.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .users
        .validate_user(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    let Some(user) = user else {
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let token = state.tokens.issue(user.id)?;

    Ok(Json(LoginResponse { token }))
}

/// POST /validate
/// Verify a session token; on success the response carries the subject id in
/// the `X-Authorized-User` header.
pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    Form(payload): Form<ValidateRequest>,
) -> Result<(HeaderMap, Json<Message>), ApiError> {
    match state.tokens.verify(&payload.token) {
        Ok(subject) => {
            let mut headers = HeaderMap::new();
            let value = HeaderValue::from_str(&subject.simple().to_string())
                .map_err(|e| ApiError::internal(format!("Invalid subject header: {e}")))?;
            headers.insert(AUTHORIZED_USER_HEADER, value);

            Ok((
                headers,
                Json(Message {
                    detail: "Token is valid".to_string(),
                }),
            ))
        }
        Err(TokenError::Expired) => Err(ApiError::unauthorized("Token has expired")),
        Err(TokenError::Malformed) => Err(ApiError::unauthorized("Token is invalid")),
    }
}

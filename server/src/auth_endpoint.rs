use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use trip_planner_lib::{error::TripError, user::UserPublic};

use crate::server_state::ServerState;
use crate::trip_endpoint::error_response;

pub fn generate_session_token() -> String {
    let token_bytes: [u8; 16] = rand::random();
    hex::encode(token_bytes)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION)?
        .to_str().ok()?
        .strip_prefix("Bearer ")
}

/// Resolves the bearer token to the logged-in user, or produces the 401
/// response the handler should return as-is.
pub async fn authenticate(state: &ServerState, headers: &HeaderMap) -> Result<UserPublic, Response> {
    let Some(token) = bearer_token(headers) else {
        return Err(StatusCode::UNAUTHORIZED.into_response());
    };

    let user_id = state.sessions.lock().await.get_by_left(&token.to_string()).copied();
    let Some(user_id) = user_id else {
        return Err(StatusCode::UNAUTHORIZED.into_response());
    };

    match state.data_manager.get_user(user_id).await {
        Ok(Some(user)) => Ok(user),
        // Session outlived the account.
        Ok(None) => Err(StatusCode::UNAUTHORIZED.into_response()),
        Err(err) => Err(error_response(err)),
    }
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserPublic,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

pub async fn register(State(state): State<Arc<ServerState>>, Json(request): Json<RegisterRequest>) -> Response {
    if request.name.trim().is_empty() || request.email.trim().is_empty() || request.password.is_empty() {
        return error_response(TripError::Validation("name, email and password are required".to_string()).into());
    }

    match state.data_manager.register_user(request.name, request.email, &request.password).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn login(State(state): State<Arc<ServerState>>, Json(request): Json<LoginRequest>) -> Response {
    match state.data_manager.login(&request.email, &request.password).await {
        Ok(user) => {
            let token = generate_session_token();
            state.sessions.lock().await.insert(token.clone(), user.user_id);
            tracing::debug!("User {} logged in", user.user_id);
            Json(LoginResponse { token, user }).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub async fn logout(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.lock().await.remove_by_left(&token.to_string());
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Unauthenticated, like the forgot-password page it serves.
pub async fn reset_password(State(state): State<Arc<ServerState>>, Json(request): Json<ResetPasswordRequest>) -> Response {
    if request.new_password.is_empty() {
        return error_response(TripError::Validation("new password must not be empty".to_string()).into());
    }

    match state.data_manager.reset_password(&request.email, &request.new_password).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn me(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    match authenticate(&state, &headers).await {
        Ok(user) => Json(user).into_response(),
        Err(response) => response,
    }
}

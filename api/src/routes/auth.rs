use std::net::SocketAddr;

use auth::AuthError;
use axum::{
    Json, Router,
    extract::{ConnectInfo, State},
    http::StatusCode,
    routing::{get, post},
};
use domain::{LoginRequest, LoginResponse, RegisterRequest, UserProfile};
use serde::Serialize;

use crate::{
    auth_middleware::CurrentUser, rate_limiter::AuthLimiterError, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[derive(Serialize)]
struct MessageResponse {
    msg: &'static str,
}

async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), StatusCode> {
    state
        .auth_limiter
        .check(addr.ip())
        .await
        .map_err(map_limiter_err)?;

    state.auth.register(payload).await.map_err(map_auth_err)?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            msg: "User created successfully. Please log in.",
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, StatusCode> {
    state
        .auth_limiter
        .check(addr.ip())
        .await
        .map_err(map_limiter_err)?;

    state
        .auth
        .login(payload)
        .await
        .map(Json)
        .map_err(map_auth_err)
}

async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserProfile>, StatusCode> {
    let account = state
        .user_repo
        .find_by_id(user.claims().user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let Some(account) = account else {
        return Err(StatusCode::NOT_FOUND);
    };

    Ok(Json(UserProfile {
        id: account.id,
        username: account.username,
        email: account.email,
        is_premium: account.is_premium_user,
        data_consent: account.data_monetization_consent,
        created_at: account.created_at,
    }))
}

fn map_auth_err(err: AuthError) -> StatusCode {
    match err {
        AuthError::MissingFields => StatusCode::BAD_REQUEST,
        AuthError::UsernameTaken | AuthError::EmailTaken => StatusCode::CONFLICT,
        AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
        AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn map_limiter_err(err: AuthLimiterError) -> StatusCode {
    match err {
        AuthLimiterError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        AuthLimiterError::Backend { _message: _ } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

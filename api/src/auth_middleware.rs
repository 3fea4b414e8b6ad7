use auth::{AuthError, JwtClaims};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use axum_extra::{
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeader,
};

use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct CurrentUser(pub JwtClaims);

impl CurrentUser {
    pub fn claims(&self) -> &JwtClaims {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| StatusCode::UNAUTHORIZED)?;

        state
            .auth
            .validate_token(bearer.token())
            .await
            .map(CurrentUser)
            .map_err(|err| match err {
                AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            })
    }
}

use std::time::{SystemTime, UNIX_EPOCH};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use domain::{LoginRequest, LoginResponse, RegisterRequest, UserAccount};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_ttl: ChronoDuration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret".to_string(),
            jwt_audience: "coinfolio".to_string(),
            jwt_issuer: "coinfolio-api".to_string(),
            access_token_ttl: ChronoDuration::hours(24),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing username, email, or password")]
    MissingFields,
    #[error("username already exists")]
    UsernameTaken,
    #[error("email already exists")]
    EmailTaken,
    #[error("bad username or password")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("internal error: {0}")]
    Internal(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub sub: String,
    pub aud: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
    pub user_id: Uuid,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, payload: RegisterRequest) -> AuthResult<UserAccount>;
    async fn login(&self, payload: LoginRequest) -> AuthResult<LoginResponse>;
    async fn validate_token(&self, token: &str) -> AuthResult<JwtClaims>;
}

#[derive(Clone)]
pub struct PasswordAuthService {
    config: AuthConfig,
    pool: PgPool,
}

impl PasswordAuthService {
    pub fn new(config: AuthConfig, pool: PgPool) -> Self {
        Self { config, pool }
    }

    async fn username_exists(&self, username: &str) -> AuthResult<bool> {
        let row = sqlx::query("SELECT 1 AS present FROM users WHERE username = $1 LIMIT 1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| AuthError::Internal(format!("failed to query username: {err}")))?;
        Ok(row.is_some())
    }

    async fn email_exists(&self, email: &str) -> AuthResult<bool> {
        let row = sqlx::query("SELECT 1 AS present FROM users WHERE LOWER(email) = LOWER($1) LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| AuthError::Internal(format!("failed to query email: {err}")))?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl AuthService for PasswordAuthService {
    async fn register(&self, payload: RegisterRequest) -> AuthResult<UserAccount> {
        let username = payload.username.trim().to_string();
        let email = payload.email.trim().to_string();
        if username.is_empty() || email.is_empty() || payload.password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        if self.username_exists(&username).await? {
            return Err(AuthError::UsernameTaken);
        }
        if self.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(&payload.password)?;
        let user_id = Uuid::new_v4();

        // New users start as non-premium with consent unset.
        let row = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, is_premium_user, data_monetization_consent)
             VALUES ($1, $2, $3, $4, FALSE, FALSE)
             RETURNING created_at",
        )
        .bind(user_id)
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| AuthError::Internal(format!("failed to insert user: {err}")))?;

        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|err| AuthError::Internal(format!("invalid user row: {err}")))?;

        debug!(%username, "user registered");

        Ok(UserAccount {
            id: user_id,
            username,
            email,
            is_premium_user: false,
            data_monetization_consent: false,
            created_at,
        })
    }

    async fn login(&self, payload: LoginRequest) -> AuthResult<LoginResponse> {
        if payload.username.trim().is_empty() || payload.password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let row = sqlx::query(
            "SELECT id, username, password_hash, is_premium_user, data_monetization_consent
             FROM users WHERE username = $1 LIMIT 1",
        )
        .bind(payload.username.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| AuthError::Internal(format!("failed to load user: {err}")))?;

        // Missing user and wrong password collapse into the same error.
        let Some(row) = row else {
            return Err(AuthError::InvalidCredentials);
        };

        let stored_hash: String = row
            .try_get("password_hash")
            .map_err(|err| AuthError::Internal(format!("invalid user row: {err}")))?;
        if !verify_password(&payload.password, &stored_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let user_id: Uuid = row
            .try_get("id")
            .map_err(|err| AuthError::Internal(format!("invalid user row: {err}")))?;
        let username: String = row
            .try_get("username")
            .map_err(|err| AuthError::Internal(format!("invalid user row: {err}")))?;
        let is_premium: bool = row
            .try_get("is_premium_user")
            .map_err(|err| AuthError::Internal(format!("invalid user row: {err}")))?;
        let data_consent: bool = row
            .try_get("data_monetization_consent")
            .map_err(|err| AuthError::Internal(format!("invalid user row: {err}")))?;

        let expires_at = Utc::now() + self.config.access_token_ttl;
        let access_token = build_jwt(&self.config, &username, user_id, expires_at)?;

        debug!(%username, "login ok");

        Ok(LoginResponse {
            access_token,
            user_id,
            username,
            is_premium,
            data_consent,
        })
    }

    async fn validate_token(&self, token: &str) -> AuthResult<JwtClaims> {
        decode_jwt(&self.config, token)
    }
}

pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Internal(format!("failed to hash password: {err}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn build_jwt(
    config: &AuthConfig,
    username: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> AuthResult<String> {
    let issued_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| AuthError::Internal(format!("time error: {err}")))?;
    let exp = expires_at
        .timestamp()
        .try_into()
        .map_err(|err| AuthError::Internal(format!("token expiration overflow: {err}")))?;

    let claims = JwtClaims {
        sub: username.to_string(),
        aud: config.jwt_audience.clone(),
        iss: config.jwt_issuer.clone(),
        exp,
        iat: issued_at.as_secs() as usize,
        user_id,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|err| AuthError::Internal(format!("failed to encode jwt: {err}")))
}

fn decode_jwt(config: &AuthConfig, token: &str) -> AuthResult<JwtClaims> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.set_audience(&[config.jwt_audience.clone()]);
    validation.iss = Some(
        std::iter::once(config.jwt_issuer.clone())
            .collect::<std::collections::HashSet<String>>(),
    );

    decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

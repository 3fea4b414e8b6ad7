use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::UserAccount;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserAccount>>;
    async fn set_data_consent(&self, user_id: Uuid, consent: bool) -> Result<bool>;
}

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<UserAccount> {
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .context("invalid created_at column")?;
        Ok(UserAccount {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            is_premium_user: row.try_get("is_premium_user")?,
            data_monetization_consent: row.try_get("data_monetization_consent")?,
            created_at,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserAccount>> {
        let row = sqlx::query(
            "SELECT id, username, email, is_premium_user, data_monetization_consent, created_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| Self::row_to_user(&row)).transpose()?)
    }

    async fn set_data_consent(&self, user_id: Uuid, consent: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET data_monetization_consent = $2 WHERE id = $1")
            .bind(user_id)
            .bind(consent)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

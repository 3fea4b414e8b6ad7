use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::Holding;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewHolding {
    pub user_id: Uuid,
    pub asset_id: String,
    pub symbol: String,
    pub quantity: f64,
    pub average_buy_price: Option<f64>,
    pub exchange_wallet: Option<String>,
    pub notes: Option<String>,
}

// Outer None leaves the column untouched; Some(None) clears it.
#[derive(Debug, Default, Clone)]
pub struct HoldingChanges {
    pub quantity: Option<f64>,
    pub average_buy_price: Option<Option<f64>>,
    pub exchange_wallet: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

#[async_trait]
pub trait HoldingRepository: Send + Sync {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Holding>>;
    async fn count_by_user(&self, user_id: Uuid) -> Result<i64>;
    async fn insert(&self, new_holding: NewHolding) -> Result<Holding>;
    async fn find_owned(&self, user_id: Uuid, holding_id: Uuid) -> Result<Option<Holding>>;
    async fn update(
        &self,
        user_id: Uuid,
        holding_id: Uuid,
        changes: HoldingChanges,
    ) -> Result<Option<Holding>>;
    async fn delete(&self, user_id: Uuid, holding_id: Uuid) -> Result<bool>;
}

#[derive(Clone)]
pub struct PostgresHoldingRepository {
    pool: PgPool,
}

impl PostgresHoldingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_holding(row: &sqlx::postgres::PgRow) -> Result<Holding> {
        let added_at: DateTime<Utc> = row.try_get("added_at").context("invalid added_at column")?;
        let last_updated: DateTime<Utc> = row
            .try_get("last_updated")
            .context("invalid last_updated column")?;
        Ok(Holding {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            asset_id: row.try_get("asset_id")?,
            symbol: row.try_get("symbol")?,
            quantity: row.try_get("quantity")?,
            average_buy_price: row.try_get("average_buy_price")?,
            exchange_wallet: row.try_get("exchange_wallet")?,
            notes: row.try_get("notes")?,
            added_at,
            last_updated,
        })
    }
}

#[async_trait]
impl HoldingRepository for PostgresHoldingRepository {
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Holding>> {
        let rows = sqlx::query(
            "SELECT id, user_id, asset_id, symbol, quantity, average_buy_price,
                    exchange_wallet, notes, added_at, last_updated
             FROM holdings WHERE user_id = $1 ORDER BY added_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_holding).collect()
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM holdings WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert(&self, new_holding: NewHolding) -> Result<Holding> {
        let holding_id = Uuid::new_v4();
        let row = sqlx::query(
            "INSERT INTO holdings (id, user_id, asset_id, symbol, quantity, average_buy_price,
                                   exchange_wallet, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, user_id, asset_id, symbol, quantity, average_buy_price,
                       exchange_wallet, notes, added_at, last_updated",
        )
        .bind(holding_id)
        .bind(new_holding.user_id)
        .bind(&new_holding.asset_id)
        .bind(&new_holding.symbol)
        .bind(new_holding.quantity)
        .bind(new_holding.average_buy_price)
        .bind(&new_holding.exchange_wallet)
        .bind(&new_holding.notes)
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_holding(&row)
    }

    async fn find_owned(&self, user_id: Uuid, holding_id: Uuid) -> Result<Option<Holding>> {
        let row = sqlx::query(
            "SELECT id, user_id, asset_id, symbol, quantity, average_buy_price,
                    exchange_wallet, notes, added_at, last_updated
             FROM holdings WHERE id = $1 AND user_id = $2",
        )
        .bind(holding_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_holding).transpose()
    }

    async fn update(
        &self,
        user_id: Uuid,
        holding_id: Uuid,
        changes: HoldingChanges,
    ) -> Result<Option<Holding>> {
        let Some(mut holding) = self.find_owned(user_id, holding_id).await? else {
            return Ok(None);
        };

        if let Some(quantity) = changes.quantity {
            holding.quantity = quantity;
        }
        if let Some(average_buy_price) = changes.average_buy_price {
            holding.average_buy_price = average_buy_price;
        }
        if let Some(exchange_wallet) = changes.exchange_wallet {
            holding.exchange_wallet = exchange_wallet;
        }
        if let Some(notes) = changes.notes {
            holding.notes = notes;
        }

        let row = sqlx::query(
            "UPDATE holdings
             SET quantity = $3, average_buy_price = $4, exchange_wallet = $5, notes = $6,
                 last_updated = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING last_updated",
        )
        .bind(holding_id)
        .bind(user_id)
        .bind(holding.quantity)
        .bind(holding.average_buy_price)
        .bind(&holding.exchange_wallet)
        .bind(&holding.notes)
        .fetch_one(&self.pool)
        .await?;
        holding.last_updated = row
            .try_get("last_updated")
            .context("invalid last_updated column")?;

        Ok(Some(holding))
    }

    async fn delete(&self, user_id: Uuid, holding_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM holdings WHERE id = $1 AND user_id = $2")
            .bind(holding_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

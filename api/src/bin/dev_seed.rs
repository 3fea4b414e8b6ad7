use std::env;

use anyhow::{Context, Result};
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("../migrations").run(&pool).await?;

    let username = env::var("DEV_SEED_USERNAME").unwrap_or_else(|_| "demo".to_string());
    let password = env::var("DEV_SEED_PASSWORD").unwrap_or_else(|_| "demo-password".to_string());

    seed_demo(&pool, &username, &password).await?;
    println!("Seeded premium demo account '{username}' with sample holdings (dev only).");
    Ok(())
}

async fn seed_demo(pool: &PgPool, username: &str, password: &str) -> Result<()> {
    let seed_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, b"coinfolio-dev-user");
    let email = format!("{username}@example.com");
    let password_hash =
        auth::hash_password(password).map_err(|err| anyhow::anyhow!("hash failed: {err}"))?;

    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, is_premium_user, data_monetization_consent)
         VALUES ($1, $2, $3, $4, TRUE, FALSE)
         ON CONFLICT (username) DO UPDATE
         SET password_hash = EXCLUDED.password_hash, is_premium_user = TRUE
         RETURNING id",
    )
    .bind(seed_id)
    .bind(username)
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(&mut *tx)
    .await?;
    let user_id: Uuid = row.try_get("id")?;

    // Clean previous dev seed holdings to keep results stable.
    sqlx::query("DELETE FROM holdings WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let sample_holdings: &[(&str, &str, f64, Option<f64>)] = &[
        ("bitcoin", "BTC", 0.5, Some(42_000.0)),
        ("ethereum", "ETH", 4.0, Some(2_800.0)),
        ("usd-coin", "USDC", 12_500.0, Some(1.0)),
        ("tether", "USDT", 5_000.0, None),
    ];

    for (asset_id, symbol, quantity, average_buy_price) in sample_holdings {
        let namespace = format!("{asset_id}:{symbol}");
        let holding_id = Uuid::new_v5(&user_id, namespace.as_bytes());
        sqlx::query(
            "INSERT INTO holdings (id, user_id, asset_id, symbol, quantity, average_buy_price)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(holding_id)
        .bind(user_id)
        .bind(asset_id)
        .bind(symbol)
        .bind(quantity)
        .bind(average_buy_price)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

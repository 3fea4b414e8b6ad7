use std::sync::Arc;

use anyhow::{Context, Result};
use auth::{AuthConfig, PasswordAuthService};
use chrono::Duration as ChronoDuration;
use sqlx::PgPool;
use yield_engine::{InMemoryYieldCache, YieldAggregator, YieldSource, PROTOCOLS};

use crate::{
    config::AppConfig,
    rate_limiter::AuthLimiter,
    repositories::{PostgresHoldingRepository, PostgresUserRepository},
    services::{CoingeckoPriceClient, DefiLlamaYieldSource},
    state::AppState,
};

pub async fn build_state(config: &AppConfig) -> Result<AppState> {
    let pool = PgPool::connect(&config.database_url).await?;
    sqlx::migrate!("../migrations").run(&pool).await?;

    let auth_service = PasswordAuthService::new(
        AuthConfig {
            jwt_secret: config.jwt_secret.clone(),
            jwt_audience: config.jwt_audience.clone(),
            jwt_issuer: config.jwt_issuer.clone(),
            access_token_ttl: chrono_duration(config.access_token_ttl),
        },
        pool.clone(),
    );

    let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
    let holding_repo = Arc::new(PostgresHoldingRepository::new(pool.clone()));

    let oracle = Arc::new(CoingeckoPriceClient::new(
        config.coingecko_api_base.clone(),
        config.price_http_timeout,
    )?);

    let yield_client = reqwest::Client::builder()
        .timeout(config.yield_http_timeout)
        .build()
        .context("failed to build yield http client")?;
    let sources: Vec<Arc<dyn YieldSource>> = PROTOCOLS
        .iter()
        .map(|(slug, display_name)| {
            Arc::new(DefiLlamaYieldSource::new(
                yield_client.clone(),
                &config.yield_api_base,
                *slug,
                *display_name,
            )) as Arc<dyn YieldSource>
        })
        .collect();

    // One cache per process, handed to the aggregator rather than hidden
    // behind a module-level singleton.
    let yield_cache = Arc::new(InMemoryYieldCache::new());
    let yields = Arc::new(YieldAggregator::new(
        sources,
        yield_cache,
        config.yield_cache_ttl,
        config.risk_ceilings,
    ));

    let auth_limiter =
        Arc::new(AuthLimiter::new(config.auth_throttle_window, config.redis_url.clone()).await?);

    Ok(AppState {
        config: config.clone(),
        db: pool,
        auth: Arc::new(auth_service),
        oracle,
        yields,
        user_repo,
        holding_repo,
        auth_limiter,
    })
}

fn chrono_duration(value: std::time::Duration) -> ChronoDuration {
    ChronoDuration::from_std(value).unwrap_or_else(|_| ChronoDuration::seconds(1))
}

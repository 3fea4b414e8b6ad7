use std::{env, time::Duration};

use anyhow::{Context, Result};
use yield_engine::RiskCeilings;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub coingecko_api_base: String,
    pub yield_api_base: String,
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_ttl: Duration,
    pub free_tier_holding_limit: usize,
    pub price_http_timeout: Duration,
    pub yield_http_timeout: Duration,
    pub yield_cache_ttl: Duration,
    pub risk_ceilings: RiskCeilings,
    pub auth_throttle_window: Duration,
    pub frontend_origins: Vec<String>,
    pub redis_url: Option<String>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let access_token_ttl = parse_duration_seconds("ACCESS_TOKEN_TTL_SECS", 86400);
        let price_http_timeout = parse_duration_seconds("PRICE_HTTP_TIMEOUT_SECS", 10);
        let yield_http_timeout = parse_duration_seconds("YIELD_HTTP_TIMEOUT_SECS", 15);
        let yield_cache_ttl = parse_duration_seconds("YIELD_CACHE_TTL_SECS", 900);
        let auth_throttle_window = parse_duration_seconds("AUTH_THROTTLE_SECONDS", 5);
        let free_tier_holding_limit = parse_usize("FREE_TIER_HOLDING_LIMIT", 5);
        let frontend_origins = parse_origins();

        // Ceiling defaults mirror the legacy low/medium/high constants.
        let defaults = RiskCeilings::default();
        let risk_ceilings = RiskCeilings {
            low: parse_u8("RISK_CEILING_LOW", defaults.low),
            medium: parse_u8("RISK_CEILING_MEDIUM", defaults.medium),
            high: parse_u8("RISK_CEILING_HIGH", defaults.high),
        };

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret".to_string());
        if is_production_environment() {
            if jwt_secret == "dev-secret" {
                anyhow::bail!(
                    "CRITICAL SECURITY ERROR: JWT_SECRET is using default 'dev-secret' in production!\n\
                    This allows anyone to forge authentication tokens.\n\
                    Set a strong random JWT_SECRET in your .env file immediately."
                );
            }
            if jwt_secret.len() < 32 {
                eprintln!(
                    "⚠️  WARNING: JWT_SECRET is too short ({} chars). \
                    Recommended: at least 32 characters for production.",
                    jwt_secret.len()
                );
            }
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set for API server")?,
            coingecko_api_base: env::var("COINGECKO_API_BASE")
                .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string()),
            yield_api_base: env::var("YIELD_API_BASE")
                .unwrap_or_else(|_| "https://yields.llama.fi".to_string()),
            jwt_secret,
            jwt_audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "coinfolio".to_string()),
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "coinfolio-api".to_string()),
            access_token_ttl,
            free_tier_holding_limit,
            price_http_timeout,
            yield_http_timeout,
            yield_cache_ttl,
            risk_ceilings,
            auth_throttle_window,
            frontend_origins,
            redis_url: env::var("REDIS_URL").ok(),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid u16")?,
        })
    }
}

fn is_production_environment() -> bool {
    env::var("ENVIRONMENT")
        .or_else(|_| env::var("ENV"))
        .map(|e| {
            let lower = e.to_lowercase();
            lower == "production" || lower == "prod"
        })
        .unwrap_or(false)
}

fn parse_origins() -> Vec<String> {
    if let Ok(list) = env::var("FRONTEND_ORIGINS") {
        split_origins(&list)
    } else if let Ok(origin) = env::var("FRONTEND_ORIGIN") {
        split_origins(&origin)
    } else {
        vec!["http://localhost:3000".to_string()]
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|item| {
            let trimmed = item.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

fn parse_duration_seconds(key: &str, default: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default))
}

fn parse_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_u8(key: &str, default: u8) -> u8 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

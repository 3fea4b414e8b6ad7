use auth::AuthService;
use sqlx::PgPool;
use std::sync::Arc;
use valuation::PriceOracle;
use yield_engine::YieldService;

use crate::{
    config::AppConfig,
    rate_limiter::AuthLimiter,
    repositories::{HoldingRepository, UserRepository},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: PgPool,
    pub auth: Arc<dyn AuthService>,
    pub oracle: Arc<dyn PriceOracle>,
    pub yields: Arc<dyn YieldService>,
    pub user_repo: Arc<dyn UserRepository>,
    pub holding_repo: Arc<dyn HoldingRepository>,
    pub auth_limiter: Arc<AuthLimiter>,
}

// Ensure critical dependencies uphold Send/Sync for Axum state usage.
#[allow(dead_code)]
fn _assert_state_types_are_send_sync()
where
    AppConfig: Send + Sync + 'static,
    PgPool: Send + Sync + 'static,
    dyn AuthService: Send + Sync,
    dyn PriceOracle: Send + Sync,
    dyn YieldService: Send + Sync,
    dyn UserRepository: Send + Sync,
    dyn HoldingRepository: Send + Sync,
    AuthLimiter: Send + Sync,
{
}

#[allow(dead_code)]
fn _assert_state_bounds() {
    fn assert_bounds<T: Clone + Send + Sync + 'static>() {}
    assert_bounds::<AppState>();
}

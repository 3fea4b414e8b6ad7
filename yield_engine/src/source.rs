use async_trait::async_trait;
use domain::YieldRecord;

use crate::catalog;

/// One upstream protocol feed. `fetch` never errors: implementations fall
/// back to the fixture catalog when the live path is unavailable, so the
/// aggregator always has records to rank.
#[async_trait]
pub trait YieldSource: Send + Sync {
    fn protocol_slug(&self) -> &str;
    async fn fetch(&self) -> Vec<YieldRecord>;
}

/// Serves the built-in catalog directly. Used in tests and as the offline
/// stand-in for protocols without a live integration.
pub struct FixtureYieldSource {
    slug: String,
}

impl FixtureYieldSource {
    pub fn new(slug: impl Into<String>) -> Self {
        Self { slug: slug.into() }
    }
}

#[async_trait]
impl YieldSource for FixtureYieldSource {
    fn protocol_slug(&self) -> &str {
        &self.slug
    }

    async fn fetch(&self) -> Vec<YieldRecord> {
        catalog::fallback_catalog(&self.slug)
    }
}

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use domain::YieldRecord;
use tokio::sync::RwLock;

/// Injected cache seam between the aggregator and its sources. A read past
/// the entry's TTL must miss so callers refetch; concurrent refills may race
/// and the last writer wins.
#[async_trait]
pub trait YieldCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<YieldRecord>>;
    async fn set(&self, key: &str, records: Vec<YieldRecord>, ttl: Duration);
}

struct CacheEntry {
    records: Vec<YieldRecord>,
    stored_at: Instant,
    ttl: Duration,
}

#[derive(Default)]
pub struct InMemoryYieldCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryYieldCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl YieldCache for InMemoryYieldCache {
    async fn get(&self, key: &str) -> Option<Vec<YieldRecord>> {
        let entries = self.entries.read().await;
        entries.get(key).and_then(|entry| {
            if entry.stored_at.elapsed() < entry.ttl {
                Some(entry.records.clone())
            } else {
                None
            }
        })
    }

    async fn set(&self, key: &str, records: Vec<YieldRecord>, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                records,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }
}

use std::{cmp::Ordering, sync::Arc, time::Duration};

use async_trait::async_trait;
use domain::{Holding, Recommendation, RiskLevel, RiskTolerance, YieldOpportunity, YieldRecord};

use crate::{
    cache::YieldCache,
    catalog,
    score::{categorize, risk_score},
    source::YieldSource,
};

/// Maximum acceptable risk score per tolerance. The defaults reproduce the
/// legacy constants; deployments may override them through configuration.
#[derive(Debug, Clone, Copy)]
pub struct RiskCeilings {
    pub low: u8,
    pub medium: u8,
    pub high: u8,
}

impl Default for RiskCeilings {
    fn default() -> Self {
        Self {
            low: 40,
            medium: 60,
            high: 100,
        }
    }
}

impl RiskCeilings {
    pub fn ceiling(&self, tolerance: RiskTolerance) -> u8 {
        match tolerance {
            RiskTolerance::Low => self.low,
            RiskTolerance::Medium => self.medium,
            RiskTolerance::High => self.high,
        }
    }
}

#[async_trait]
pub trait YieldService: Send + Sync {
    async fn aggregate_all(&self, asset_filter: Option<&str>) -> Vec<YieldOpportunity>;
    async fn recommend(
        &self,
        holdings: &[Holding],
        tolerance: RiskTolerance,
    ) -> Vec<Recommendation>;
}

pub struct YieldAggregator {
    sources: Vec<Arc<dyn YieldSource>>,
    cache: Arc<dyn YieldCache>,
    cache_ttl: Duration,
    ceilings: RiskCeilings,
}

impl YieldAggregator {
    pub fn new(
        sources: Vec<Arc<dyn YieldSource>>,
        cache: Arc<dyn YieldCache>,
        cache_ttl: Duration,
        ceilings: RiskCeilings,
    ) -> Self {
        Self {
            sources,
            cache,
            cache_ttl,
            ceilings,
        }
    }

    async fn records_for(&self, source: &dyn YieldSource) -> Vec<YieldRecord> {
        let key = source.protocol_slug();
        if let Some(records) = self.cache.get(key).await {
            return records;
        }
        let records = source.fetch().await;
        self.cache
            .set(key, records.clone(), self.cache_ttl)
            .await;
        records
    }
}

#[async_trait]
impl YieldService for YieldAggregator {
    async fn aggregate_all(&self, asset_filter: Option<&str>) -> Vec<YieldOpportunity> {
        let mut records = Vec::new();
        for source in &self.sources {
            records.extend(self.records_for(source.as_ref()).await);
        }

        if let Some(filter) = asset_filter {
            records.retain(|record| record.asset.eq_ignore_ascii_case(filter));
        }

        // Stable sort: ties keep concatenation order.
        records.sort_by(|a, b| b.apy.partial_cmp(&a.apy).unwrap_or(Ordering::Equal));

        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| YieldOpportunity {
                risk_score: risk_score(&record.protocol, record.apy, record.total_liquidity_usd),
                category: categorize(&record.protocol),
                rank: index as u32 + 1,
                protocol: record.protocol,
                asset: record.asset,
                chain: record.chain,
                apy: record.apy,
                total_liquidity_usd: record.total_liquidity_usd,
                risk_level: record.risk_level,
            })
            .collect()
    }

    async fn recommend(
        &self,
        holdings: &[Holding],
        tolerance: RiskTolerance,
    ) -> Vec<Recommendation> {
        let stablecoin_holdings: Vec<&Holding> = holdings
            .iter()
            .filter(|holding| catalog::is_stablecoin(&holding.symbol))
            .collect();
        if stablecoin_holdings.is_empty() {
            return Vec::new();
        }

        let ceiling = self.ceilings.ceiling(tolerance);
        let mut recommendations = Vec::new();
        for holding in stablecoin_holdings {
            let mut opportunities = self.aggregate_all(Some(&holding.symbol)).await;
            opportunities.retain(|opportunity| opportunity.risk_score <= ceiling);
            for opportunity in opportunities.into_iter().take(3) {
                let potential_annual_yield = holding.quantity * opportunity.apy / 100.0;
                let reason = recommendation_reason(&opportunity, tolerance);
                recommendations.push(Recommendation {
                    user_holding_quantity: holding.quantity,
                    potential_annual_yield,
                    reason,
                    opportunity,
                });
            }
        }

        recommendations.sort_by(|a, b| {
            b.potential_annual_yield
                .partial_cmp(&a.potential_annual_yield)
                .unwrap_or(Ordering::Equal)
        });
        recommendations.truncate(10);
        recommendations
    }
}

fn recommendation_reason(opportunity: &YieldOpportunity, tolerance: RiskTolerance) -> String {
    let mut reasons: Vec<String> = Vec::new();

    if opportunity.apy > 5.0 {
        reasons.push(format!("High APY of {:.2}%", opportunity.apy));
    }
    if opportunity.risk_level == RiskLevel::Low && tolerance == RiskTolerance::Low {
        reasons.push("Matches your low risk preference".to_string());
    }
    if matches!(opportunity.protocol.as_str(), "Aave V3" | "Compound V3") {
        reasons.push("Established and secure protocol".to_string());
    }
    if opportunity.total_liquidity_usd > 500_000_000.0 {
        reasons.push("High liquidity pool".to_string());
    }
    if reasons.is_empty() {
        reasons.push(format!(
            "Good yield opportunity for {}",
            opportunity.asset
        ));
    }

    reasons.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cache::InMemoryYieldCache, source::FixtureYieldSource};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use uuid::Uuid;

    struct CountingSource {
        inner: FixtureYieldSource,
        fetches: AtomicUsize,
    }

    impl CountingSource {
        fn new(slug: &str) -> Self {
            Self {
                inner: FixtureYieldSource::new(slug),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl YieldSource for CountingSource {
        fn protocol_slug(&self) -> &str {
            self.inner.protocol_slug()
        }

        async fn fetch(&self) -> Vec<YieldRecord> {
            self.fetches.fetch_add(1, AtomicOrdering::SeqCst);
            self.inner.fetch().await
        }
    }

    fn fixture_aggregator(ttl: Duration) -> YieldAggregator {
        let sources: Vec<Arc<dyn YieldSource>> = catalog::PROTOCOLS
            .iter()
            .map(|(slug, _)| Arc::new(FixtureYieldSource::new(*slug)) as Arc<dyn YieldSource>)
            .collect();
        YieldAggregator::new(
            sources,
            Arc::new(InMemoryYieldCache::new()),
            ttl,
            RiskCeilings::default(),
        )
    }

    fn holding(symbol: &str, quantity: f64) -> Holding {
        Holding {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            asset_id: symbol.to_lowercase(),
            symbol: symbol.to_string(),
            quantity,
            average_buy_price: None,
            exchange_wallet: None,
            notes: None,
            added_at: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[tokio::test]
    async fn aggregate_sorts_by_apy_and_ranks() {
        let aggregator = fixture_aggregator(Duration::from_secs(900));
        let opportunities = aggregator.aggregate_all(None).await;
        assert!(!opportunities.is_empty());
        for pair in opportunities.windows(2) {
            assert!(pair[0].apy >= pair[1].apy);
        }
        for (index, opportunity) in opportunities.iter().enumerate() {
            assert_eq!(opportunity.rank, index as u32 + 1);
            assert!((1..=100).contains(&opportunity.risk_score));
        }
    }

    #[tokio::test]
    async fn asset_filter_is_case_insensitive() {
        let aggregator = fixture_aggregator(Duration::from_secs(900));
        let opportunities = aggregator.aggregate_all(Some("usdc")).await;
        assert!(!opportunities.is_empty());
        assert!(opportunities.iter().all(|o| o.asset == "USDC"));
    }

    #[tokio::test]
    async fn aggregate_is_idempotent_within_ttl() {
        let aggregator = fixture_aggregator(Duration::from_secs(900));
        let first = aggregator.aggregate_all(None).await;
        let second = aggregator.aggregate_all(None).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn cache_bounds_source_fetches() {
        let source = Arc::new(CountingSource::new("aave-v3"));
        let aggregator = YieldAggregator::new(
            vec![source.clone() as Arc<dyn YieldSource>],
            Arc::new(InMemoryYieldCache::new()),
            Duration::from_secs(900),
            RiskCeilings::default(),
        );
        aggregator.aggregate_all(None).await;
        aggregator.aggregate_all(None).await;
        assert_eq!(source.fetches.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_cache_refetches() {
        let source = Arc::new(CountingSource::new("aave-v3"));
        let aggregator = YieldAggregator::new(
            vec![source.clone() as Arc<dyn YieldSource>],
            Arc::new(InMemoryYieldCache::new()),
            Duration::ZERO,
            RiskCeilings::default(),
        );
        aggregator.aggregate_all(None).await;
        aggregator.aggregate_all(None).await;
        assert_eq!(source.fetches.load(AtomicOrdering::SeqCst), 2);
    }

    #[tokio::test]
    async fn low_tolerance_never_exceeds_ceiling() {
        let aggregator = fixture_aggregator(Duration::from_secs(900));
        let holdings = vec![holding("USDC", 10_000.0), holding("DAI", 2_500.0)];
        let recommendations = aggregator.recommend(&holdings, RiskTolerance::Low).await;
        assert!(!recommendations.is_empty());
        assert!(recommendations
            .iter()
            .all(|r| r.opportunity.risk_score <= 40));
    }

    #[tokio::test]
    async fn no_stablecoins_means_no_recommendations() {
        let aggregator = fixture_aggregator(Duration::from_secs(900));
        assert!(aggregator
            .recommend(&[], RiskTolerance::Medium)
            .await
            .is_empty());
        let holdings = vec![holding("BTC", 1.0)];
        assert!(aggregator
            .recommend(&holdings, RiskTolerance::Medium)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn recommendations_sorted_and_capped() {
        let aggregator = fixture_aggregator(Duration::from_secs(900));
        let holdings = vec![
            holding("USDC", 50_000.0),
            holding("USDT", 20_000.0),
            holding("DAI", 80_000.0),
        ];
        let recommendations = aggregator.recommend(&holdings, RiskTolerance::High).await;
        assert!(recommendations.len() <= 10);
        for pair in recommendations.windows(2) {
            assert!(pair[0].potential_annual_yield >= pair[1].potential_annual_yield);
        }
        let top = &recommendations[0];
        assert_eq!(
            top.potential_annual_yield,
            top.user_holding_quantity * top.opportunity.apy / 100.0
        );
    }

    #[tokio::test]
    async fn reasons_mention_what_fired() {
        let aggregator = fixture_aggregator(Duration::from_secs(900));
        let holdings = vec![holding("USDC", 1_000.0)];
        let recommendations = aggregator.recommend(&holdings, RiskTolerance::Low).await;
        assert!(!recommendations.is_empty());
        let aave = recommendations
            .iter()
            .find(|r| r.opportunity.protocol == "Aave V3")
            .expect("aave should pass the low ceiling");
        assert!(aave.reason.contains("Established and secure protocol"));
        assert!(aave.reason.contains("Matches your low risk preference"));
    }
}

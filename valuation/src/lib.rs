use std::collections::HashMap;

use async_trait::async_trait;
use domain::{Holding, PortfolioValuation, ValuedHolding};

/// Batch spot-price lookup. Every requested id must appear in the returned
/// map; `None` marks an unavailable price, which is not the same as 0.0.
/// Implementations fail open per asset instead of erroring the whole batch.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn usd_prices(&self, asset_ids: &[String]) -> HashMap<String, Option<f64>>;
}

#[derive(Clone, Default)]
pub struct StaticPriceOracle {
    prices: HashMap<String, f64>,
}

impl StaticPriceOracle {
    pub fn new(prices: HashMap<String, f64>) -> Self {
        Self { prices }
    }
}

#[async_trait]
impl PriceOracle for StaticPriceOracle {
    async fn usd_prices(&self, asset_ids: &[String]) -> HashMap<String, Option<f64>> {
        asset_ids
            .iter()
            .map(|id| (id.clone(), self.prices.get(id).copied()))
            .collect()
    }
}

/// Joins holdings with oracle prices. One batch lookup over the distinct
/// asset ids (none at all when there are no holdings); holdings without a
/// price carry a `None` value and are excluded from the total rather than
/// counted as zero. Output order mirrors the input order.
pub async fn value_portfolio(
    holdings: &[Holding],
    oracle: &dyn PriceOracle,
) -> PortfolioValuation {
    let mut distinct_ids: Vec<String> = Vec::new();
    for holding in holdings {
        if !distinct_ids.contains(&holding.asset_id) {
            distinct_ids.push(holding.asset_id.clone());
        }
    }

    let prices = if distinct_ids.is_empty() {
        HashMap::new()
    } else {
        oracle.usd_prices(&distinct_ids).await
    };

    let mut total_usd = 0.0;
    let mut items = Vec::with_capacity(holdings.len());
    for holding in holdings {
        let current_price = prices.get(&holding.asset_id).copied().flatten();
        let current_value = current_price.map(|price| holding.quantity * price);
        if let Some(value) = current_value {
            total_usd += value;
        }
        items.push(ValuedHolding {
            id: holding.id,
            asset_id: holding.asset_id.clone(),
            symbol: holding.symbol.clone(),
            quantity: holding.quantity,
            average_buy_price: holding.average_buy_price,
            exchange_wallet: holding.exchange_wallet.clone(),
            notes: holding.notes.clone(),
            added_at: holding.added_at,
            current_price_usd: current_price,
            current_value_usd: current_value,
        });
    }

    PortfolioValuation { items, total_usd }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct CountingOracle {
        prices: HashMap<String, Option<f64>>,
        calls: AtomicUsize,
    }

    impl CountingOracle {
        fn new(prices: Vec<(&str, Option<f64>)>) -> Self {
            Self {
                prices: prices
                    .into_iter()
                    .map(|(id, price)| (id.to_string(), price))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PriceOracle for CountingOracle {
        async fn usd_prices(&self, asset_ids: &[String]) -> HashMap<String, Option<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            asset_ids
                .iter()
                .map(|id| (id.clone(), self.prices.get(id).copied().flatten()))
                .collect()
        }
    }

    fn holding(asset_id: &str, symbol: &str, quantity: f64) -> Holding {
        Holding {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            asset_id: asset_id.to_string(),
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
    async fn empty_portfolio_skips_the_oracle() {
        let oracle = CountingOracle::new(vec![]);
        let valuation = value_portfolio(&[], &oracle).await;
        assert!(valuation.items.is_empty());
        assert_eq!(valuation.total_usd, 0.0);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unavailable_price_is_excluded_not_zeroed() {
        let oracle = CountingOracle::new(vec![("bitcoin", Some(60_000.0)), ("ethereum", None)]);
        let holdings = vec![holding("bitcoin", "BTC", 2.0), holding("ethereum", "ETH", 1.0)];

        let valuation = value_portfolio(&holdings, &oracle).await;
        assert_eq!(valuation.total_usd, 120_000.0);
        assert_eq!(valuation.items[0].current_value_usd, Some(120_000.0));
        assert_eq!(valuation.items[1].current_price_usd, None);
        assert_eq!(valuation.items[1].current_value_usd, None);
    }

    #[tokio::test]
    async fn duplicate_assets_trigger_a_single_batch_call() {
        let oracle = CountingOracle::new(vec![("bitcoin", Some(50_000.0))]);
        let holdings = vec![holding("bitcoin", "BTC", 1.0), holding("bitcoin", "BTC", 0.5)];

        let valuation = value_portfolio(&holdings, &oracle).await;
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
        assert_eq!(valuation.total_usd, 75_000.0);
    }

    #[tokio::test]
    async fn output_order_mirrors_input_order() {
        let oracle = CountingOracle::new(vec![
            ("dogecoin", Some(0.1)),
            ("bitcoin", Some(60_000.0)),
            ("tether", Some(1.0)),
        ]);
        let holdings = vec![
            holding("dogecoin", "DOGE", 100.0),
            holding("bitcoin", "BTC", 1.0),
            holding("tether", "USDT", 500.0),
        ];

        let valuation = value_portfolio(&holdings, &oracle).await;
        let symbols: Vec<&str> = valuation
            .items
            .iter()
            .map(|item| item.symbol.as_str())
            .collect();
        assert_eq!(symbols, vec!["DOGE", "BTC", "USDT"]);
    }

    #[tokio::test]
    async fn all_prices_missing_totals_zero() {
        let oracle = CountingOracle::new(vec![("bitcoin", None)]);
        let holdings = vec![holding("bitcoin", "BTC", 3.0)];

        let valuation = value_portfolio(&holdings, &oracle).await;
        assert_eq!(valuation.total_usd, 0.0);
        assert_eq!(valuation.items.len(), 1);
        assert_eq!(valuation.items[0].current_value_usd, None);
    }
}

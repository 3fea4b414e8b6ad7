use std::{collections::HashMap, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;
use valuation::PriceOracle;

/// Batch spot-price client over the CoinGecko simple/price endpoint. A
/// whole-batch failure degrades to `None` per asset instead of erroring, so
/// one flaky upstream call never breaks a portfolio view.
#[derive(Clone)]
pub struct CoingeckoPriceClient {
    client: Client,
    api_base: String,
}

impl CoingeckoPriceClient {
    pub fn new(api_base: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build price http client")?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_batch(&self, asset_ids: &[String]) -> Result<HashMap<String, f64>> {
        let url = format!("{}/simple/price", self.api_base);
        let ids = asset_ids.join(",");
        let resp = self
            .client
            .get(url)
            .query(&[("ids", ids.as_str()), ("vs_currencies", "usd")])
            .send()
            .await
            .context("price request failed")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("price endpoint returned status {}", status));
        }
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to decode price response")?;

        // Shape: {"bitcoin": {"usd": 60000.0}, ...}; entries the upstream
        // could not price are simply absent.
        let mut prices = HashMap::new();
        if let Some(entries) = body.as_object() {
            for (asset_id, entry) in entries {
                if let Some(price) = entry.get("usd").and_then(|value| value.as_f64()) {
                    prices.insert(asset_id.clone(), price);
                }
            }
        }
        Ok(prices)
    }
}

#[async_trait]
impl PriceOracle for CoingeckoPriceClient {
    async fn usd_prices(&self, asset_ids: &[String]) -> HashMap<String, Option<f64>> {
        if asset_ids.is_empty() {
            return HashMap::new();
        }

        match self.fetch_batch(asset_ids).await {
            Ok(prices) => asset_ids
                .iter()
                .map(|id| (id.clone(), prices.get(id).copied()))
                .collect(),
            Err(err) => {
                warn!(error = %err, assets = asset_ids.len(), "spot price fetch failed");
                asset_ids.iter().map(|id| (id.clone(), None)).collect()
            }
        }
    }
}

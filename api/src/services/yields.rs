use anyhow::{Context, Result};
use async_trait::async_trait;
use domain::YieldRecord;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;
use yield_engine::{assess_risk_level, fallback_catalog, is_stablecoin, YieldSource};

#[derive(Debug, Deserialize)]
struct PoolsResponse {
    data: Vec<PoolEntry>,
}

#[derive(Debug, Deserialize)]
struct PoolEntry {
    project: String,
    symbol: String,
    #[serde(default)]
    apy: Option<f64>,
    #[serde(rename = "apyBase", default)]
    apy_base: Option<f64>,
    #[serde(rename = "apyReward", default)]
    apy_reward: Option<f64>,
    #[serde(rename = "tvlUsd", default)]
    tvl_usd: f64,
    chain: String,
    #[allow(dead_code)]
    #[serde(default)]
    pool: String,
}

/// Live per-protocol feed over the DefiLlama pools endpoint. Failures fall
/// back to the built-in catalog so the aggregator always has records.
pub struct DefiLlamaYieldSource {
    client: Client,
    api_base: String,
    slug: String,
    display_name: String,
}

impl DefiLlamaYieldSource {
    pub fn new(
        client: Client,
        api_base: &str,
        slug: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            slug: slug.into(),
            display_name: display_name.into(),
        }
    }

    async fn fetch_live(&self) -> Result<Vec<YieldRecord>> {
        let url = format!("{}/pools", self.api_base);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("yield request failed")?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("yield endpoint returned status {}", status));
        }
        let body: PoolsResponse = resp
            .json()
            .await
            .context("failed to decode yield response")?;

        let records = body
            .data
            .into_iter()
            .filter(|entry| entry.project == self.slug)
            .filter_map(|entry| {
                let apy = effective_apy(&entry)?;
                if apy <= 0.0 {
                    return None;
                }
                let symbol = entry.symbol.to_uppercase();
                if !is_stablecoin(&symbol) {
                    return None;
                }
                Some(YieldRecord {
                    protocol: self.display_name.clone(),
                    asset: symbol,
                    chain: entry.chain,
                    apy,
                    total_liquidity_usd: entry.tvl_usd,
                    risk_level: assess_risk_level(entry.tvl_usd, apy),
                })
            })
            .collect();
        Ok(records)
    }
}

fn effective_apy(entry: &PoolEntry) -> Option<f64> {
    match (entry.apy, entry.apy_base, entry.apy_reward) {
        (Some(apy), _, _) => Some(apy),
        (None, None, None) => None,
        (None, base, reward) => Some(base.unwrap_or(0.0) + reward.unwrap_or(0.0)),
    }
}

#[async_trait]
impl YieldSource for DefiLlamaYieldSource {
    fn protocol_slug(&self) -> &str {
        &self.slug
    }

    async fn fetch(&self) -> Vec<YieldRecord> {
        match self.fetch_live().await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, protocol = %self.slug, "yield fetch failed, serving fallback catalog");
                fallback_catalog(&self.slug)
            }
        }
    }
}

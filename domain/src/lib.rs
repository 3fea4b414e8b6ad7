use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_premium_user: bool,
    pub data_monetization_consent: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Holding {
    pub id: Uuid,
    pub user_id: Uuid,
    pub asset_id: String,
    pub symbol: String,
    pub quantity: f64,
    pub average_buy_price: Option<f64>,
    pub exchange_wallet: Option<String>,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValuedHolding {
    pub id: Uuid,
    pub asset_id: String,
    pub symbol: String,
    pub quantity: f64,
    pub average_buy_price: Option<f64>,
    pub exchange_wallet: Option<String>,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
    pub current_price_usd: Option<f64>,
    pub current_value_usd: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PortfolioValuation {
    pub items: Vec<ValuedHolding>,
    pub total_usd: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum OpportunityCategory {
    Lending,
    #[serde(rename = "Liquidity Pool")]
    LiquidityPool,
    #[serde(rename = "Yield Vault")]
    YieldVault,
    Other,
}

// Raw source record; risk_score/category/rank are derived per request by the
// aggregator, so they live on YieldOpportunity instead.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct YieldRecord {
    pub protocol: String,
    pub asset: String,
    pub chain: String,
    pub apy: f64,
    pub total_liquidity_usd: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct YieldOpportunity {
    pub protocol: String,
    pub asset: String,
    pub chain: String,
    pub apy: f64,
    pub total_liquidity_usd: f64,
    pub risk_level: RiskLevel,
    pub risk_score: u8,
    pub category: OpportunityCategory,
    pub rank: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Recommendation {
    #[serde(flatten)]
    pub opportunity: YieldOpportunity,
    pub user_holding_quantity: f64,
    pub potential_annual_yield: f64,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

impl RiskTolerance {
    // Unrecognized values are rejected here rather than silently defaulted.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: Uuid,
    pub username: String,
    pub is_premium: bool,
    pub data_consent: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_premium: bool,
    pub data_consent: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateHoldingRequest {
    pub asset_id: String,
    pub symbol: String,
    pub quantity: f64,
    pub average_buy_price: Option<f64>,
    pub exchange_wallet: Option<String>,
    pub notes: Option<String>,
}

// Absent fields stay untouched; an explicit null clears the optional columns.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateHoldingRequest {
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub average_buy_price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub exchange_wallet: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PortfolioResponse {
    pub holdings: Vec<ValuedHolding>,
    pub total_portfolio_value_usd: f64,
    pub is_premium_user: bool,
    pub premium_analytics: Option<PremiumAnalytics>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PremiumAnalytics {
    pub portfolio_risk_assessment: String,
    pub rebalancing_suggestions: Vec<RebalancingSuggestion>,
    pub market_sentiment: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RebalancingSuggestion {
    pub action: String,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SupportedAsset {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DataConsentRequest {
    pub consent: bool,
}

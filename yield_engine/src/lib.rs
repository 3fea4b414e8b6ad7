pub mod aggregator;
pub mod cache;
pub mod catalog;
pub mod score;
pub mod source;

pub use aggregator::{RiskCeilings, YieldAggregator, YieldService};
pub use cache::{InMemoryYieldCache, YieldCache};
pub use catalog::{display_name, fallback_catalog, is_stablecoin, PROTOCOLS, STABLECOINS};
pub use score::{assess_risk_level, categorize, risk_score};
pub use source::{FixtureYieldSource, YieldSource};

use domain::{OpportunityCategory, RiskLevel};

/// Risk tier derived from raw upstream figures, applied before caching.
pub fn assess_risk_level(tvl_usd: f64, apy: f64) -> RiskLevel {
    if tvl_usd > 1_000_000_000.0 && apy < 10.0 {
        RiskLevel::Low
    } else if tvl_usd > 100_000_000.0 || apy < 15.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

pub fn categorize(protocol: &str) -> OpportunityCategory {
    let protocol = protocol.to_lowercase();
    if protocol.contains("aave") || protocol.contains("compound") {
        OpportunityCategory::Lending
    } else if protocol.contains("curve") {
        OpportunityCategory::LiquidityPool
    } else if protocol.contains("yearn") {
        OpportunityCategory::YieldVault
    } else {
        OpportunityCategory::Other
    }
}

/// Heuristic risk score, clamped to [1, 100]. The weights are carried over
/// from the legacy service and are policy, not physics.
pub fn risk_score(protocol: &str, apy: f64, liquidity_usd: f64) -> u8 {
    let mut score: i32 = 20;

    let protocol = protocol.to_lowercase();
    if protocol.contains("aave") || protocol.contains("compound") {
        score += 10;
    } else if protocol.contains("curve") {
        score += 25;
    } else if protocol.contains("yearn") {
        score += 30;
    }

    if apy > 10.0 {
        score += 20;
    } else if apy > 5.0 {
        score += 10;
    }

    if liquidity_usd < 100_000_000.0 {
        score += 15;
    } else if liquidity_usd > 1_000_000_000.0 {
        score -= 10;
    }

    score.clamp(1, 100) as u8
}

use domain::{PremiumAnalytics, RebalancingSuggestion};

/// Placeholder analytics payload shown to premium accounts. Static until a
/// real analytics pipeline exists.
pub fn premium_analytics() -> PremiumAnalytics {
    PremiumAnalytics {
        portfolio_risk_assessment: "Medium".to_string(),
        rebalancing_suggestions: vec![
            RebalancingSuggestion {
                action: "Consider selling some BTC".to_string(),
                reason: "Over-concentration".to_string(),
            },
            RebalancingSuggestion {
                action: "Consider buying some DOT".to_string(),
                reason: "Diversification".to_string(),
            },
        ],
        market_sentiment: "Neutral".to_string(),
    }
}

use domain::{RiskLevel, YieldRecord};

/// Symbols eligible for yield recommendations.
pub const STABLECOINS: &[&str] = &["USDT", "USDC", "DAI", "BUSD", "FRAX"];

/// Upstream project slug and the protocol name shown to users.
pub const PROTOCOLS: &[(&str, &str)] = &[
    ("aave-v3", "Aave V3"),
    ("compound-v3", "Compound V3"),
    ("curve-dex", "Curve Finance"),
    ("yearn-finance", "Yearn Finance"),
];

pub fn is_stablecoin(symbol: &str) -> bool {
    STABLECOINS
        .iter()
        .any(|stable| stable.eq_ignore_ascii_case(symbol))
}

pub fn display_name(slug: &str) -> Option<&'static str> {
    PROTOCOLS
        .iter()
        .find(|(candidate, _)| *candidate == slug)
        .map(|(_, name)| *name)
}

/// Deterministic per-protocol fallback used when an upstream source is
/// unreachable. Must return the same records on every call.
pub fn fallback_catalog(slug: &str) -> Vec<YieldRecord> {
    let entries: &[(&str, f64, f64, RiskLevel)] = match slug {
        "aave-v3" => &[
            ("USDC", 4.25, 1_250_000_000.0, RiskLevel::Low),
            ("USDT", 3.95, 890_000_000.0, RiskLevel::Low),
            ("DAI", 4.15, 650_000_000.0, RiskLevel::Low),
        ],
        "compound-v3" => &[
            ("USDC", 3.85, 980_000_000.0, RiskLevel::Low),
            ("DAI", 3.65, 420_000_000.0, RiskLevel::Low),
        ],
        "curve-dex" => &[
            ("USDT", 5.12, 2_100_000_000.0, RiskLevel::Medium),
            ("USDC", 5.25, 2_100_000_000.0, RiskLevel::Medium),
            ("DAI", 5.08, 2_100_000_000.0, RiskLevel::Medium),
        ],
        "yearn-finance" => &[
            ("USDC", 6.45, 450_000_000.0, RiskLevel::Medium),
            ("DAI", 6.25, 320_000_000.0, RiskLevel::Medium),
        ],
        _ => &[],
    };

    let protocol = display_name(slug).unwrap_or(slug);
    entries
        .iter()
        .map(|(asset, apy, liquidity, risk_level)| YieldRecord {
            protocol: protocol.to_string(),
            asset: asset.to_string(),
            chain: "Ethereum".to_string(),
            apy: *apy,
            total_liquidity_usd: *liquidity,
            risk_level: *risk_level,
        })
        .collect()
}

use domain::SupportedAsset;

// Fixed catalog for populating pickers; ids match what the price API
// expects in lookups. A fuller deployment would sync this from the
// upstream coin list on a schedule.
const SUPPORTED_ASSETS: &[(&str, &str, &str)] = &[
    ("bitcoin", "BTC", "Bitcoin"),
    ("ethereum", "ETH", "Ethereum"),
    ("tether", "USDT", "Tether"),
    ("binancecoin", "BNB", "BNB"),
    ("solana", "SOL", "Solana"),
    ("usd-coin", "USDC", "USD Coin"),
    ("ripple", "XRP", "XRP"),
    ("dogecoin", "DOGE", "Dogecoin"),
    ("cardano", "ADA", "Cardano"),
    ("avalanche-2", "AVAX", "Avalanche"),
    ("shiba-inu", "SHIB", "Shiba Inu"),
    ("polkadot", "DOT", "Polkadot"),
    ("chainlink", "LINK", "Chainlink"),
    ("tron", "TRX", "TRON"),
    ("matic-network", "MATIC", "Polygon"),
    ("litecoin", "LTC", "Litecoin"),
    ("uniswap", "UNI", "Uniswap"),
];

pub fn supported_assets() -> Vec<SupportedAsset> {
    SUPPORTED_ASSETS
        .iter()
        .map(|(id, symbol, name)| SupportedAsset {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        })
        .collect()
}

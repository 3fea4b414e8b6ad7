pub mod analytics;
pub mod price;
pub mod yields;

pub use price::CoingeckoPriceClient;
pub use yields::DefiLlamaYieldSource;

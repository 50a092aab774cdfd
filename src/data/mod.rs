pub mod cleaner;
pub mod provider;
pub mod series;

pub use self::cleaner::{clean, IntoTimestamp};
pub use self::provider::{fetch, MarketDataProvider, YahooFinanceProvider};
pub use self::series::{Column, PriceSeries, RawPriceSeries, RawTimestamp};

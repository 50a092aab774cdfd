pub mod calculator;
pub mod oscillators;
pub mod overlaps;
pub mod returns;
pub mod ta;

pub use self::calculator::{IndicatorCalculator, IndicatorParams};
pub use self::oscillators::rsi;
pub use self::overlaps::{bollinger_bands, exponential_moving_average, simple_moving_average};
pub use self::returns::daily_return;

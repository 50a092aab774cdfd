// Indicators drawn on the price axis: moving averages and Bollinger Bands
use crate::data::series::{PriceSeries, EMA, LOWER_BAND, SMA, UPPER_BAND};
use crate::error::Result;
use crate::indicators::ta::{
    apply, BollingerBands, ExponentialMovingAverage, Next, SimpleMovingAverage,
};
use tracing::debug;

/// Append `SMA`: mean of the trailing `window` closes, NaN for the first
/// `window - 1` rows
pub fn simple_moving_average(series: PriceSeries, window: usize) -> Result<PriceSeries> {
    let mut sma = SimpleMovingAverage::new(window)?;
    let values = apply(&mut sma, series.closes()?);

    debug!("Calculated SMA({}) over {} rows", window, values.len());
    series.with_column(SMA, values)
}

/// Append `EMA` with smoothing factor `2 / (span + 1)`, seeded by the first
/// close
pub fn exponential_moving_average(series: PriceSeries, span: usize) -> Result<PriceSeries> {
    let mut ema = ExponentialMovingAverage::new(span)?;
    let values = apply(&mut ema, series.closes()?);

    debug!("Calculated EMA({}) over {} rows", span, values.len());
    series.with_column(EMA, values)
}

/// Append `SMA`, `Upper Band` and `Lower Band`.
///
/// The bands sit `num_std` sample standard deviations of the trailing
/// window above and below the SMA.
pub fn bollinger_bands(series: PriceSeries, window: usize, num_std: f64) -> Result<PriceSeries> {
    let mut bb = BollingerBands::new(window, num_std)?;
    let closes = series.closes()?;

    let mut middle = Vec::with_capacity(closes.len());
    let mut upper = Vec::with_capacity(closes.len());
    let mut lower = Vec::with_capacity(closes.len());

    for &close in closes {
        let value = bb.next(close);
        middle.push(value.middle);
        upper.push(value.upper);
        lower.push(value.lower);
    }

    debug!("Calculated Bollinger Bands({}, {}) over {} rows", window, num_std, middle.len());
    series
        .with_column(SMA, middle)?
        .with_column(UPPER_BAND, upper)?
        .with_column(LOWER_BAND, lower)
}

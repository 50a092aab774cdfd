// Momentum oscillators
use crate::data::series::{PriceSeries, RSI};
use crate::error::Result;
use crate::indicators::ta::{apply, RelativeStrengthIndex};
use tracing::debug;

/// Append `RSI` computed from simple rolling means of gains and losses.
///
/// Defined from row `window - 1`. When every change in the window is a gain
/// the value is 100; when the window has no movement at all it is NaN.
pub fn rsi(series: PriceSeries, window: usize) -> Result<PriceSeries> {
    let mut rsi = RelativeStrengthIndex::new(window)?;
    let values = apply(&mut rsi, series.closes()?);

    debug!("Calculated RSI({}) over {} rows", window, values.len());
    series.with_column(RSI, values)
}

// Period-over-period returns
use crate::data::series::{PriceSeries, DAILY_RETURN};
use crate::error::Result;
use crate::indicators::ta::{apply, PercentChange};

/// Append `daily_return`: `(close[i] - close[i-1]) / close[i-1]`, NaN on
/// the first row
pub fn daily_return(series: PriceSeries) -> Result<PriceSeries> {
    let values = apply(&mut PercentChange::new(), series.closes()?);
    series.with_column(DAILY_RETURN, values)
}

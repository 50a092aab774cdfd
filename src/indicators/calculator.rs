use crate::data::series::PriceSeries;
use crate::error::Result;
use crate::indicators::{oscillators, overlaps, returns};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Windows and multipliers for every indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub sma_window: usize,
    pub ema_span: usize,
    pub bollinger_window: usize,
    pub bollinger_num_std: f64,
    pub rsi_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_window: 20,
            ema_span: 20,
            bollinger_window: 20,
            bollinger_num_std: 2.0,
            rsi_window: 14,
        }
    }
}

/// Applies groups of indicators to a cleaned series
pub struct IndicatorCalculator {
    params: IndicatorParams,
}

impl IndicatorCalculator {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    // SMA, EMA and daily return
    #[instrument(skip(self, series), fields(rows = series.len()))]
    pub fn moving_averages(&self, series: PriceSeries) -> Result<PriceSeries> {
        let series = overlaps::simple_moving_average(series, self.params.sma_window)?;
        let series = overlaps::exponential_moving_average(series, self.params.ema_span)?;
        let series = returns::daily_return(series)?;

        info!("Technical indicators calculated successfully");
        Ok(series)
    }

    // Bollinger Bands and RSI
    #[instrument(skip(self, series), fields(rows = series.len()))]
    pub fn analyze(&self, series: PriceSeries) -> Result<PriceSeries> {
        let series = overlaps::bollinger_bands(
            series,
            self.params.bollinger_window,
            self.params.bollinger_num_std,
        )?;
        let series = oscillators::rsi(series, self.params.rsi_window)?;

        info!("Bollinger Bands and RSI calculated successfully");
        Ok(series)
    }

    /// Every indicator, in the persisted column order
    /// (SMA, EMA, Upper Band, Lower Band, RSI, daily_return).
    ///
    /// `SMA` ends up as the Bollinger middle band so the bands stay centred
    /// on it; with the default parameters both windows are 20.
    pub fn all(&self, series: PriceSeries) -> Result<PriceSeries> {
        let p = &self.params;

        let series = overlaps::simple_moving_average(series, p.sma_window)?;
        let series = overlaps::exponential_moving_average(series, p.ema_span)?;
        let series = overlaps::bollinger_bands(series, p.bollinger_window, p.bollinger_num_std)?;
        let series = oscillators::rsi(series, p.rsi_window)?;
        let series = returns::daily_return(series)?;

        info!("All indicators calculated for {} rows", series.len());
        Ok(series)
    }
}

impl Default for IndicatorCalculator {
    fn default() -> Self {
        Self::new(IndicatorParams::default())
    }
}

// Streaming technical indicator primitives.
// Each primitive consumes one value per row and emits NaN until it has
// enough history, so outputs stay aligned with the input rows.

use crate::error::{PipelineError, Result};
use std::collections::VecDeque;

/// The `Next` trait is used for indicators that produce one output per input
pub trait Next<T> {
    type Output;
    fn next(&mut self, input: T) -> Self::Output;
}

fn check_period(name: &str, period: usize) -> Result<()> {
    if period == 0 {
        return Err(PipelineError::InvalidParameter(format!(
            "{} must be greater than 0",
            name
        )));
    }
    Ok(())
}

/// Run a primitive over a whole slice
pub fn apply<N: Next<f64, Output = f64>>(indicator: &mut N, values: &[f64]) -> Vec<f64> {
    values.iter().map(|&v| indicator.next(v)).collect()
}

/// Trailing window of the last `period` values
#[derive(Debug, Clone)]
struct Window {
    period: usize,
    values: VecDeque<f64>,
}

impl Window {
    fn new(period: usize) -> Self {
        Self {
            period,
            values: VecDeque::with_capacity(period),
        }
    }

    fn push(&mut self, value: f64) {
        if self.values.len() == self.period {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    fn is_full(&self) -> bool {
        self.values.len() == self.period
    }

    fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.period as f64
    }
}

/// Simple Moving Average over a trailing window
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    window: Window,
}

impl SimpleMovingAverage {
    pub fn new(period: usize) -> Result<Self> {
        check_period("window", period)?;
        Ok(Self {
            window: Window::new(period),
        })
    }
}

impl Next<f64> for SimpleMovingAverage {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        self.window.push(input);
        if !self.window.is_full() {
            return f64::NAN;
        }
        self.window.mean()
    }
}

/// Exponential Moving Average, seeded with the first input.
///
/// `alpha = 2 / (span + 1)`; defined from the first row on.
#[derive(Debug, Clone)]
pub struct ExponentialMovingAverage {
    alpha: f64,
    value: Option<f64>,
}

impl ExponentialMovingAverage {
    pub fn new(span: usize) -> Result<Self> {
        check_period("span", span)?;
        Ok(Self {
            alpha: 2.0 / (span as f64 + 1.0),
            value: None,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Next<f64> for ExponentialMovingAverage {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        let value = match self.value {
            None => input,
            Some(prev) => self.alpha * input + (1.0 - self.alpha) * prev,
        };
        self.value = Some(value);
        value
    }
}

/// Sample standard deviation (n - 1 denominator) over a trailing window
#[derive(Debug, Clone)]
pub struct StandardDeviation {
    window: Window,
}

impl StandardDeviation {
    pub fn new(period: usize) -> Result<Self> {
        check_period("window", period)?;
        Ok(Self {
            window: Window::new(period),
        })
    }
}

impl Next<f64> for StandardDeviation {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        self.window.push(input);
        if !self.window.is_full() {
            return f64::NAN;
        }

        let mean = self.window.mean();
        let n = self.window.period as f64;
        let variance = self
            .window
            .values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);

        variance.sqrt()
    }
}

/// Bollinger Bands output
#[derive(Debug, Clone, Copy)]
pub struct BollingerOutput {
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
}

/// SMA with an envelope of `multiplier` sample standard deviations
#[derive(Debug, Clone)]
pub struct BollingerBands {
    sma: SimpleMovingAverage,
    sd: StandardDeviation,
    multiplier: f64,
}

impl BollingerBands {
    pub fn new(period: usize, multiplier: f64) -> Result<Self> {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "num_std must be a finite non-negative number, got {}",
                multiplier
            )));
        }

        Ok(Self {
            sma: SimpleMovingAverage::new(period)?,
            sd: StandardDeviation::new(period)?,
            multiplier,
        })
    }
}

impl Next<f64> for BollingerBands {
    type Output = BollingerOutput;

    fn next(&mut self, input: f64) -> Self::Output {
        let middle = self.sma.next(input);
        let offset = self.sd.next(input) * self.multiplier;

        BollingerOutput {
            middle,
            upper: middle + offset,
            lower: middle - offset,
        }
    }
}

/// Relative Strength Index using simple rolling means of gains and losses.
///
/// The first row has no previous close and counts as zero gain and zero
/// loss. A window with losses all zero gives RS = +inf and RSI = 100; a
/// window with no movement at all gives 0/0 = NaN.
#[derive(Debug, Clone)]
pub struct RelativeStrengthIndex {
    prev_value: Option<f64>,
    gains: SimpleMovingAverage,
    losses: SimpleMovingAverage,
}

impl RelativeStrengthIndex {
    pub fn new(period: usize) -> Result<Self> {
        Ok(Self {
            prev_value: None,
            gains: SimpleMovingAverage::new(period)?,
            losses: SimpleMovingAverage::new(period)?,
        })
    }
}

impl Next<f64> for RelativeStrengthIndex {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        let change = self.prev_value.map_or(0.0, |prev| input - prev);
        self.prev_value = Some(input);

        let avg_gain = self.gains.next(change.max(0.0));
        let avg_loss = self.losses.next((-change).max(0.0));

        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

/// Fractional change from the previous input
#[derive(Debug, Clone, Default)]
pub struct PercentChange {
    prev_value: Option<f64>,
}

impl PercentChange {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Next<f64> for PercentChange {
    type Output = f64;

    fn next(&mut self, input: f64) -> Self::Output {
        let change = match self.prev_value {
            Some(prev) => (input - prev) / prev,
            None => f64::NAN,
        };
        self.prev_value = Some(input);
        change
    }
}

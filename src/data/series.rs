// src/data/series.rs
use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use std::fmt;

pub const OPEN: &str = "open";
pub const HIGH: &str = "high";
pub const LOW: &str = "low";
pub const CLOSE: &str = "close";
pub const VOLUME: &str = "volume";

/// Canonical OHLCV column order kept by the cleaner
pub const OHLCV: [&str; 5] = [OPEN, HIGH, LOW, CLOSE, VOLUME];

pub const SMA: &str = "SMA";
pub const EMA: &str = "EMA";
pub const UPPER_BAND: &str = "Upper Band";
pub const LOWER_BAND: &str = "Lower Band";
pub const RSI: &str = "RSI";
pub const DAILY_RETURN: &str = "daily_return";

/// A named numeric column. Missing cells are `f64::NAN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Index label as delivered by a market-data provider, before cleaning
#[derive(Debug, Clone, PartialEq)]
pub enum RawTimestamp {
    /// Seconds since the Unix epoch
    Epoch(i64),
    /// Textual date or datetime
    Text(String),
    Utc(DateTime<Utc>),
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTimestamp::Epoch(secs) => write!(f, "{}", secs),
            RawTimestamp::Text(text) => write!(f, "{}", text),
            RawTimestamp::Utc(time) => write!(f, "{}", time.to_rfc3339()),
        }
    }
}

/// Columnar OHLCV table indexed by `I`.
///
/// Every column has exactly one value per index entry. Cleaned series use
/// `DateTime<Utc>` as the index; freshly fetched ones use [`RawTimestamp`].
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries<I = DateTime<Utc>> {
    index: Vec<I>,
    columns: Vec<Column>,
}

/// Series as produced by a provider
pub type RawPriceSeries = PriceSeries<RawTimestamp>;

impl<I> Default for PriceSeries<I> {
    fn default() -> Self {
        Self {
            index: Vec::new(),
            columns: Vec::new(),
        }
    }
}

impl<I> PriceSeries<I> {
    /// Create a series with the given index and no columns
    pub fn new(index: Vec<I>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Build a series from an index and columns, checking column lengths
    pub fn from_parts(index: Vec<I>, columns: Vec<Column>) -> Result<Self> {
        let mut series = Self::new(index);
        for column in columns {
            series.set_column(column.name, column.values)?;
        }
        Ok(series)
    }

    /// Caller guarantees every column matches the index length
    pub(crate) fn from_parts_unchecked(index: Vec<I>, columns: Vec<Column>) -> Self {
        debug_assert!(columns.iter().all(|c| c.values.len() == index.len()));
        Self { index, columns }
    }

    pub fn into_parts(self) -> (Vec<I>, Vec<Column>) {
        (self.index, self.columns)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[I] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`column`](Self::column) but a missing column is a schema error
    pub fn require_column(&self, name: &str) -> Result<&[f64]> {
        self.column(name).ok_or_else(|| {
            PipelineError::Schema(format!("series must contain '{}' column", name))
        })
    }

    /// Add a column, replacing any existing column with the same name
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(PipelineError::Schema(format!(
                "column '{}' has {} values but the index has {} rows",
                name,
                values.len(),
                self.index.len()
            )));
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column::new(name, values)),
        }
        Ok(())
    }

    /// Owned variant of [`set_column`](Self::set_column) for chaining
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.set_column(name, values)?;
        Ok(self)
    }

    /// Values of row `i` in column order
    pub fn row(&self, i: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c.values[i]).collect()
    }
}

impl PriceSeries {
    /// Close prices, required by every indicator
    pub fn closes(&self) -> Result<&[f64]> {
        self.require_column(CLOSE)
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.index.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.index.last().copied()
    }
}

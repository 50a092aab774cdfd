// src/data/cleaner.rs
use crate::data::series::{Column, PriceSeries, RawTimestamp, OHLCV};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::{debug, info, instrument, warn};

/// Conversion of an index label into a UTC timestamp.
///
/// `None` marks a label that cannot be coerced; the cleaner drops that row.
pub trait IntoTimestamp {
    fn into_timestamp(self) -> Option<DateTime<Utc>>;
}

impl IntoTimestamp for DateTime<Utc> {
    fn into_timestamp(self) -> Option<DateTime<Utc>> {
        Some(self)
    }
}

impl IntoTimestamp for RawTimestamp {
    fn into_timestamp(self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Epoch(secs) => DateTime::<Utc>::from_timestamp(secs, 0),
            RawTimestamp::Text(text) => parse_timestamp(&text),
            RawTimestamp::Utc(time) => Some(time),
        }
    }
}

/// Parse the textual timestamp formats providers and CSV files commonly use
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.with_timezone(&Utc));
    }

    // "2024-01-02 09:30:00-05:00"
    if let Ok(time) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(time.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }

    text.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Clean and standardize a price table.
///
/// Keeps the OHLCV columns that exist (in canonical order), coerces the index
/// to UTC timestamps, drops rows with a missing value or an unusable
/// timestamp, then sorts by time keeping the first row of any duplicate
/// timestamp. A table without any OHLCV column becomes an empty series.
#[instrument(skip(raw), fields(rows = raw.len()))]
pub fn clean<I: IntoTimestamp>(raw: PriceSeries<I>) -> PriceSeries {
    let (index, columns) = raw.into_parts();

    let labels: Vec<String> = columns.iter().map(|c| normalize_label(&c.name)).collect();
    info!("Raw data columns: {:?}", labels);

    // Pick the OHLCV columns that exist, first match wins
    let mut columns: Vec<Option<Column>> = columns.into_iter().map(Some).collect();
    let mut kept = Vec::with_capacity(OHLCV.len());
    for name in OHLCV {
        if let Some(pos) = labels.iter().position(|label| label == name) {
            if let Some(column) = columns[pos].take() {
                kept.push(Column::new(name, column.values));
            }
        }
    }

    if kept.is_empty() {
        warn!("No OHLCV columns found, returning an empty series");
        return PriceSeries::default();
    }

    // Coerce the index and keep rows without missing values
    let mut rows: Vec<(DateTime<Utc>, usize)> = Vec::with_capacity(index.len());
    let mut unparsable = 0usize;
    for (i, label) in index.into_iter().enumerate() {
        let Some(time) = label.into_timestamp() else {
            unparsable += 1;
            continue;
        };
        if kept.iter().any(|c| c.values[i].is_nan()) {
            continue;
        }
        rows.push((time, i));
    }

    if unparsable > 0 {
        warn!("Dropped {} rows with an unparsable timestamp", unparsable);
    }

    // Stable sort so the first occurrence of a duplicate timestamp survives
    rows.sort_by_key(|(time, _)| *time);
    let before_dedup = rows.len();
    rows.dedup_by_key(|(time, _)| *time);
    if rows.len() < before_dedup {
        debug!("Dropped {} duplicate timestamps", before_dedup - rows.len());
    }

    let cleaned_index: Vec<DateTime<Utc>> = rows.iter().map(|(time, _)| *time).collect();
    let cleaned_columns: Vec<Column> = kept
        .into_iter()
        .map(|column| {
            let values = rows.iter().map(|(_, i)| column.values[*i]).collect();
            Column::new(column.name, values)
        })
        .collect();

    let cleaned = PriceSeries::from_parts_unchecked(cleaned_index, cleaned_columns);
    info!(
        "Data cleaned successfully. Shape: ({}, {})",
        cleaned.len(),
        cleaned.columns().len()
    );
    cleaned
}

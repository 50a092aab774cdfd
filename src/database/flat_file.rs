// Delimited flat-file storage for price series
use crate::data::cleaner::parse_timestamp;
use crate::data::series::{Column, PriceSeries};
use crate::database::schema::INDEX_COLUMN;
use crate::error::{PipelineError, Result};
use csv::{Reader, Writer};
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// Write `series` to `path`, replacing any existing file.
///
/// Header is `timestamp` followed by the column names; missing values are
/// written as empty cells.
pub fn write_csv(series: &PriceSeries, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            PipelineError::Persist(format!("failed to create {}: {}", parent.display(), e))
        })?;
    }

    let file = File::create(path)
        .map_err(|e| PipelineError::Persist(format!("failed to create {}: {}", path.display(), e)))?;
    let mut writer = Writer::from_writer(file);

    let mut header = vec![INDEX_COLUMN];
    header.extend(series.column_names());
    writer.write_record(&header)?;

    for (i, time) in series.index().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(time.to_rfc3339());
        record.extend(series.row(i).into_iter().map(|value| {
            if value.is_nan() {
                String::new()
            } else {
                value.to_string()
            }
        }));
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .map_err(|e| PipelineError::Persist(format!("failed to flush {}: {}", path.display(), e)))?;

    info!("Saved {} rows to {}", series.len(), path.display());
    Ok(())
}

/// Read a file written by [`write_csv`]
pub fn read_csv(path: &Path) -> Result<PriceSeries> {
    let file = File::open(path)
        .map_err(|e| PipelineError::Persist(format!("failed to open {}: {}", path.display(), e)))?;
    let mut reader = Reader::from_reader(file);

    let headers = reader.headers()?.clone();
    if headers.get(0) != Some(INDEX_COLUMN) {
        return Err(PipelineError::Schema(format!(
            "{} must start with a '{}' column",
            path.display(),
            INDEX_COLUMN
        )));
    }

    let names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    let mut index = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let raw = record.get(0).unwrap_or_default();
        let time = parse_timestamp(raw).ok_or_else(|| {
            PipelineError::Persist(format!("row {}: unreadable timestamp '{}'", line + 1, raw))
        })?;
        index.push(time);

        for (col, column_values) in values.iter_mut().enumerate() {
            let cell = record.get(col + 1).unwrap_or_default().trim();
            let value = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>().map_err(|e| {
                    PipelineError::Persist(format!(
                        "row {}: bad value '{}' in column '{}': {}",
                        line + 1,
                        cell,
                        names[col],
                        e
                    ))
                })?
            };
            column_values.push(value);
        }
    }

    let columns = names
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, values))
        .collect();

    PriceSeries::from_parts(index, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::series::{CLOSE, DAILY_RETURN, LOWER_BAND, RSI};
    use crate::indicators::test_support::series_from_closes;
    use crate::indicators::IndicatorCalculator;

    #[test]
    fn test_header_and_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock_data.csv");

        let series = series_from_closes(&[10.0, 11.0])
            .with_column(DAILY_RETURN, vec![f64::NAN, 0.1])
            .unwrap();
        write_csv(&series, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "timestamp,close,daily_return");
        assert_eq!(lines[1], "2024-01-02T00:00:00+00:00,10,");
        assert_eq!(lines[2], "2024-01-03T00:00:00+00:00,11,0.1");
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("AAPL_analyzed.csv");

        let closes: Vec<f64> = (0..30).map(|i| 150.0 + (i as f64 * 0.37).cos() * 3.3).collect();
        let series = IndicatorCalculator::default()
            .all(series_from_closes(&closes))
            .unwrap();

        write_csv(&series, &path).unwrap();
        let loaded = read_csv(&path).unwrap();

        assert_eq!(loaded.len(), series.len());
        assert_eq!(loaded.index(), series.index());
        assert_eq!(loaded.column_names(), series.column_names());
        for (original, read_back) in series.columns().iter().zip(loaded.columns()) {
            for (a, b) in original.values.iter().zip(&read_back.values) {
                if a.is_nan() {
                    assert!(b.is_nan());
                } else {
                    assert!((a - b).abs() < 1e-12, "{}: {} vs {}", original.name, a, b);
                }
            }
        }
        assert!(loaded.has_column(RSI) && loaded.has_column(LOWER_BAND));
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock_data.csv");

        write_csv(&series_from_closes(&[1.0, 2.0, 3.0]), &path).unwrap();
        write_csv(&series_from_closes(&[4.0]), &path).unwrap();

        let loaded = read_csv(&path).unwrap();
        assert_eq!(loaded.column(CLOSE).unwrap(), &[4.0]);
    }

    #[test]
    fn test_missing_timestamp_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "date,close\n2024-01-02,1\n").unwrap();

        assert!(matches!(read_csv(&path), Err(PipelineError::Schema(_))));
    }

    #[test]
    fn test_missing_file_is_persist_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_csv(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Persist(_)));
    }
}

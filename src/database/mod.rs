pub mod flat_file;
pub mod schema;
pub mod sqlite;

use crate::data::series::PriceSeries;
use crate::error::Result;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, instrument};

pub use self::sqlite::SqliteStore;

/// Where a processed series gets written. Both targets are fully replaced.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    /// Relational table, e.g. `sqlite://stocks.db` / `stock_data`
    Table { url: String, table: String },
    /// Comma-delimited file
    File(PathBuf),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Table { url, table } => write!(f, "{}#{}", url, table),
            Destination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Persist `series` to `destination`, overwriting what was there
#[instrument(skip(series), fields(rows = series.len(), destination = %destination))]
pub async fn save(series: &PriceSeries, destination: &Destination) -> Result<()> {
    match destination {
        Destination::Table { url, table } => {
            let store = SqliteStore::connect(url).await?;
            let written = store.replace_table(table, series).await;
            store.close().await;
            written?;
        }
        Destination::File(path) => flat_file::write_csv(series, path)?,
    }

    info!("Saved processed data to {}", destination);
    Ok(())
}

/// Read back a series written by [`save`]
pub async fn load(destination: &Destination) -> Result<PriceSeries> {
    match destination {
        Destination::Table { url, table } => {
            let store = SqliteStore::connect(url).await?;
            let loaded = store.load_table(table).await;
            store.close().await;
            loaded
        }
        Destination::File(path) => flat_file::read_csv(path),
    }
}

use crate::data::cleaner::parse_timestamp;
use crate::data::series::{Column, PriceSeries};
use crate::database::schema::{
    create_table_sql, drop_table_sql, insert_sql, select_all_sql, validate_table_name,
    INDEX_COLUMN,
};
use crate::error::{PipelineError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url`, e.g. `sqlite://stocks.db`
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| PipelineError::Persist(format!("invalid database url '{}': {}", url, e)))?
            .create_if_missing(true);

        // One writer is all a single pipeline run needs
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| PipelineError::Persist(format!("failed to open {}: {}", url, e)))?;

        Ok(Self { pool })
    }

    /// Close every pooled connection so SQLite can checkpoint and remove
    /// its journal files
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Drop `table` if it exists and write `series` into a fresh one.
    ///
    /// Runs in a single transaction; returns the number of rows written.
    pub async fn replace_table(&self, table: &str, series: &PriceSeries) -> Result<u64> {
        validate_table_name(table)?;
        let columns = series.column_names();
        if columns.iter().any(|name| *name == INDEX_COLUMN) {
            return Err(PipelineError::Persist(format!(
                "column name '{}' is reserved for the index",
                INDEX_COLUMN
            )));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(&drop_table_sql(table)).execute(&mut *tx).await?;
        sqlx::query(&create_table_sql(table, &columns))
            .execute(&mut *tx)
            .await?;

        let insert = insert_sql(table, &columns);
        let mut written = 0u64;
        for (i, time) in series.index().iter().enumerate() {
            let mut query = sqlx::query::<Sqlite>(&insert).bind(time.to_rfc3339());
            for value in series.row(i) {
                query = query.bind(if value.is_nan() { None } else { Some(value) });
            }
            written += query.execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;

        info!("Replaced table {} with {} rows", table, written);
        Ok(written)
    }

    /// Read a table written by [`replace_table`](Self::replace_table)
    pub async fn load_table(&self, table: &str) -> Result<PriceSeries> {
        validate_table_name(table)?;

        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM pragma_table_info(?1) ORDER BY cid",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        if names.is_empty() {
            return Err(PipelineError::Persist(format!("table '{}' does not exist", table)));
        }
        if names[0] != INDEX_COLUMN {
            return Err(PipelineError::Schema(format!(
                "table '{}' does not start with a '{}' column",
                table, INDEX_COLUMN
            )));
        }

        let rows = sqlx::query(&select_all_sql(table))
            .fetch_all(&self.pool)
            .await?;
        debug!("Loaded {} rows from {}", rows.len(), table);

        let mut index = Vec::with_capacity(rows.len());
        let mut values: Vec<Vec<f64>> = vec![Vec::with_capacity(rows.len()); names.len() - 1];

        for row in &rows {
            let raw: String = row.try_get(0)?;
            let time = parse_timestamp(&raw).ok_or_else(|| {
                PipelineError::Persist(format!("unreadable timestamp '{}' in {}", raw, table))
            })?;
            index.push(time);

            for (col, column_values) in values.iter_mut().enumerate() {
                let value: Option<f64> = row.try_get(col + 1)?;
                column_values.push(value.unwrap_or(f64::NAN));
            }
        }

        let columns = names
            .into_iter()
            .skip(1)
            .zip(values)
            .map(|(name, values)| Column::new(name, values))
            .collect();

        PriceSeries::from_parts(index, columns)
    }
}

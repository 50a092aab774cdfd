// src/config.rs
use crate::error::Result;
use crate::indicators::IndicatorParams;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TICKER: &str = "AAPL";
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Runtime settings.
///
/// Layered lowest to highest: built-in defaults, an optional
/// `pipeline.toml` in the working directory, then `PIPELINE_*` variables
/// (e.g. `PIPELINE_DATABASE_URL`, `PIPELINE_REFRESH_SECS`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub ticker: String,
    pub period: String,
    pub interval: String,

    pub provider_base_url: String,
    pub request_timeout_secs: u64,

    pub database_url: String,
    pub table_name: String,
    pub csv_path: PathBuf,
    /// Directory for `<TICKER>_analyzed.csv`
    pub analysis_dir: PathBuf,

    pub chart_path: PathBuf,
    pub open_browser: bool,

    pub dashboard_bind: String,
    pub refresh_secs: u64,

    pub sma_window: usize,
    pub ema_span: usize,
    pub bollinger_window: usize,
    pub bollinger_num_std: f64,
    pub rsi_window: usize,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from("pipeline")
    }

    /// `file` is a path without extension; a missing file is not an error
    pub fn load_from(file: &str) -> Result<Self> {
        let defaults = IndicatorParams::default();

        let settings = Config::builder()
            .set_default("ticker", DEFAULT_TICKER)?
            .set_default("period", "1d")?
            .set_default("interval", "1m")?
            .set_default("provider_base_url", DEFAULT_BASE_URL)?
            .set_default("request_timeout_secs", 30_i64)?
            .set_default("database_url", "sqlite://stocks.db")?
            .set_default("table_name", "stock_data")?
            .set_default("csv_path", "stock_data.csv")?
            .set_default("analysis_dir", "data")?
            .set_default("chart_path", "chart.html")?
            .set_default("open_browser", true)?
            .set_default("dashboard_bind", "127.0.0.1:8050")?
            .set_default("refresh_secs", 60_i64)?
            .set_default("sma_window", defaults.sma_window as i64)?
            .set_default("ema_span", defaults.ema_span as i64)?
            .set_default("bollinger_window", defaults.bollinger_window as i64)?
            .set_default("bollinger_num_std", defaults.bollinger_num_std)?
            .set_default("rsi_window", defaults.rsi_window as i64)?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("PIPELINE").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn analyzed_csv_path(&self, ticker: &str) -> PathBuf {
        self.analysis_dir.join(format!("{}_analyzed.csv", ticker))
    }

    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            sma_window: self.sma_window,
            ema_span: self.ema_span,
            bollinger_window: self.bollinger_window,
            bollinger_num_std: self.bollinger_num_std,
            rsi_window: self.rsi_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let settings = Settings::load_from(missing.to_str().unwrap()).unwrap();

        assert_eq!(settings.ticker, "AAPL");
        assert_eq!(settings.table_name, "stock_data");
        assert_eq!(settings.csv_path, PathBuf::from("stock_data.csv"));
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert!(settings.open_browser);
        assert_eq!(settings.indicator_params(), IndicatorParams::default());
        assert_eq!(
            settings.analyzed_csv_path("AAPL"),
            PathBuf::from("data/AAPL_analyzed.csv")
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        fs::write(
            &path,
            "ticker = \"MSFT\"\nrsi_window = 7\nbollinger_num_std = 2.5\nopen_browser = false\n",
        )
        .unwrap();

        let base = dir.path().join("pipeline");
        let settings = Settings::load_from(base.to_str().unwrap()).unwrap();

        assert_eq!(settings.ticker, "MSFT");
        assert_eq!(settings.rsi_window, 7);
        assert_eq!(settings.bollinger_num_std, 2.5);
        assert!(!settings.open_browser);
        assert_eq!(settings.refresh_secs, 60);
    }

    #[test]
    fn test_bad_value_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pipeline.toml"), "refresh_secs = \"soon\"\n").unwrap();

        let base = dir.path().join("pipeline");
        let err = Settings::load_from(base.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, crate::error::PipelineError::Config(_)));
    }
}

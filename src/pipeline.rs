// src/pipeline.rs
// Stage sequencing shared by the CLI and the dashboard.
use crate::chart::{self, ChartOptions};
use crate::config::Settings;
use crate::data::{self, MarketDataProvider, PriceSeries, RawPriceSeries, YahooFinanceProvider};
use crate::database::{self, Destination};
use crate::error::Result;
use crate::indicators::IndicatorCalculator;
use crate::utils::measure_time;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

/// What to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub ticker: String,
    pub period: String,
    pub interval: String,
}

impl Request {
    pub fn new(ticker: impl Into<String>, period: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            period: period.into(),
            interval: interval.into(),
        }
    }
}

/// Outcome of a full run
#[derive(Debug)]
pub struct RunSummary {
    pub series: PriceSeries,
    pub destinations: Vec<Destination>,
    pub chart: PathBuf,
}

pub struct Pipeline {
    provider: Arc<dyn MarketDataProvider>,
    settings: Settings,
    calculator: IndicatorCalculator,
}

impl Pipeline {
    pub fn new(provider: Arc<dyn MarketDataProvider>, settings: Settings) -> Self {
        let calculator = IndicatorCalculator::new(settings.indicator_params());
        Self {
            provider,
            settings,
            calculator,
        }
    }

    /// Pipeline backed by the HTTP provider described in `settings`
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let provider =
            YahooFinanceProvider::new(&settings.provider_base_url, settings.request_timeout())?;
        Ok(Self::new(Arc::new(provider), settings))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Request for the configured ticker, period and interval
    pub fn default_request(&self) -> Request {
        Request::new(
            self.settings.ticker.clone(),
            self.settings.period.clone(),
            self.settings.interval.clone(),
        )
    }

    pub async fn fetch(&self, request: &Request) -> Result<RawPriceSeries> {
        measure_time(
            "fetch",
            data::fetch(
                self.provider.as_ref(),
                &request.ticker,
                &request.period,
                &request.interval,
            ),
        )
        .await
    }

    pub async fn clean(&self, request: &Request) -> Result<PriceSeries> {
        let raw = self.fetch(request).await?;
        Ok(data::clean(raw))
    }

    /// Cleaned data with SMA, EMA and daily return
    pub async fn moving_averages(&self, request: &Request) -> Result<PriceSeries> {
        let cleaned = self.clean(request).await?;
        self.calculator.moving_averages(cleaned)
    }

    /// Cleaned data with Bollinger Bands and RSI
    pub async fn analyze(&self, request: &Request) -> Result<PriceSeries> {
        let cleaned = self.clean(request).await?;
        self.calculator.analyze(cleaned)
    }

    /// Cleaned data with every indicator
    pub async fn process(&self, request: &Request) -> Result<PriceSeries> {
        let cleaned = self.clean(request).await?;
        self.calculator.all(cleaned)
    }

    /// Write the analysis CSV for `ticker`; returns its path
    pub async fn export_analysis(&self, series: &PriceSeries, ticker: &str) -> Result<PathBuf> {
        let path = self.settings.analyzed_csv_path(ticker);
        database::save(series, &Destination::File(path.clone())).await?;
        Ok(path)
    }

    pub fn destinations(&self) -> Vec<Destination> {
        vec![
            Destination::Table {
                url: self.settings.database_url.clone(),
                table: self.settings.table_name.clone(),
            },
            Destination::File(self.settings.csv_path.clone()),
        ]
    }

    /// Persist to the configured table and CSV file
    pub async fn save(&self, series: &PriceSeries) -> Result<Vec<Destination>> {
        let destinations = self.destinations();
        for destination in &destinations {
            measure_time("save", database::save(series, destination)).await?;
        }
        Ok(destinations)
    }

    /// Read back the configured CSV file
    pub async fn load(&self) -> Result<PriceSeries> {
        database::load(&Destination::File(self.settings.csv_path.clone())).await
    }

    pub fn plot(&self, series: &PriceSeries, ticker: &str) -> Result<PathBuf> {
        let options = ChartOptions {
            output: self.settings.chart_path.clone(),
            open_browser: self.settings.open_browser,
        };
        chart::render(series, ticker, &options)
    }

    /// fetch → clean → indicators → save → chart
    #[instrument(skip(self))]
    pub async fn run(&self, request: &Request) -> Result<RunSummary> {
        let series = self.process(request).await?;
        let destinations = self.save(&series).await?;
        let chart = self.plot(&series, &request.ticker)?;

        if let (Some(first), Some(last)) = (series.first_timestamp(), series.last_timestamp()) {
            info!(
                "Pipeline finished for {}: {} rows from {} to {}, chart at {}",
                request.ticker,
                series.len(),
                first,
                last,
                chart.display()
            );
        }
        Ok(RunSummary {
            series,
            destinations,
            chart,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::data::series::{CLOSE, DAILY_RETURN, EMA, OHLCV, RSI, SMA, UPPER_BAND};

    #[tokio::test]
    async fn test_clean_stage() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = static_pipeline(dir.path(), 30);

        let cleaned = pipeline.clean(&pipeline.default_request()).await.unwrap();

        // Duplicate and the row with a missing open are gone
        assert_eq!(cleaned.len(), 29);
        assert_eq!(cleaned.column_names(), OHLCV.to_vec());
        assert!(cleaned.index().windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_stage_columns() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = static_pipeline(dir.path(), 40);
        let request = Request::new("AAPL", "1mo", "1d");

        let averages = pipeline.moving_averages(&request).await.unwrap();
        assert!(averages.has_column(SMA) && averages.has_column(EMA));
        assert!(averages.has_column(DAILY_RETURN) && !averages.has_column(RSI));

        let analyzed = pipeline.analyze(&request).await.unwrap();
        assert!(analyzed.has_column(UPPER_BAND) && analyzed.has_column(RSI));
        assert!(analyzed.has_column(SMA) && !analyzed.has_column(EMA));
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_provider() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = static_pipeline(dir.path(), 10);

        let err = pipeline
            .process(&Request::new("AAPL", "1d", "3s"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::PipelineError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_run_writes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = static_pipeline(dir.path(), 40);

        let summary = pipeline.run(&pipeline.default_request()).await.unwrap();

        assert_eq!(summary.destinations.len(), 2);
        assert!(summary.chart.exists());

        let from_csv = pipeline.load().await.unwrap();
        assert_eq!(from_csv.len(), summary.series.len());
        assert_eq!(from_csv.column(CLOSE), summary.series.column(CLOSE));

        let from_table = database::load(&summary.destinations[0]).await.unwrap();
        assert_eq!(from_table.column_names(), summary.series.column_names());
    }

    #[tokio::test]
    async fn test_export_analysis_path() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = static_pipeline(dir.path(), 30);
        let request = Request::new("MSFT", "1mo", "1d");

        let analyzed = pipeline.analyze(&request).await.unwrap();
        let path = pipeline.export_analysis(&analyzed, "MSFT").await.unwrap();

        assert_eq!(path, dir.path().join("data").join("MSFT_analyzed.csv"));
        assert!(path.exists());
    }
}

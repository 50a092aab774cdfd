// src/data/provider.rs
use crate::data::series::{Column, PriceSeries, RawPriceSeries, RawTimestamp};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Periods understood by the provider
pub const VALID_PERIODS: &[&str] = &[
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

/// Bar intervals understood by the provider
pub const VALID_INTERVALS: &[&str] = &[
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

pub fn validate_period(period: &str) -> Result<()> {
    if !VALID_PERIODS.contains(&period) {
        return Err(PipelineError::Fetch(format!(
            "invalid period: {} (expected one of {})",
            period,
            VALID_PERIODS.join(", ")
        )));
    }
    Ok(())
}

pub fn validate_interval(interval: &str) -> Result<()> {
    if !VALID_INTERVALS.contains(&interval) {
        return Err(PipelineError::Fetch(format!(
            "invalid interval: {} (expected one of {})",
            interval,
            VALID_INTERVALS.join(", ")
        )));
    }
    Ok(())
}

/// Source of historical OHLCV rows
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Raw history for `ticker`, index and column labels in provider form
    async fn history(&self, ticker: &str, period: &str, interval: &str) -> Result<RawPriceSeries>;
}

/// Fetch raw history for a ticker.
///
/// Validates the request before touching the network and treats an empty
/// result as a failure. No retries.
#[instrument(skip(provider), fields(provider = provider.name()))]
pub async fn fetch(
    provider: &dyn MarketDataProvider,
    ticker: &str,
    period: &str,
    interval: &str,
) -> Result<RawPriceSeries> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(PipelineError::Fetch("ticker symbol must not be empty".to_string()));
    }
    validate_period(period)?;
    validate_interval(interval)?;

    info!("Fetching {} data (period={}, interval={})", ticker, period, interval);
    let series = provider.history(ticker, period, interval).await?;

    if series.is_empty() {
        return Err(PipelineError::Fetch(format!(
            "provider returned no rows for {} (period={}, interval={})",
            ticker, period, interval
        )));
    }

    info!("Fetched {} rows for {}", series.len(), ticker);
    Ok(series)
}

// Yahoo Finance chart API response structures
#[derive(Debug, Deserialize)]
struct YahooResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

/// Market data from the Yahoo Finance chart endpoint
pub struct YahooFinanceProvider {
    client: Client,
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn history(&self, ticker: &str, period: &str, interval: &str) -> Result<RawPriceSeries> {
        let url = format!("{}/{}", self.base_url, ticker);
        debug!("GET {} range={} interval={}", url, period, interval);

        let response = self
            .client
            .get(&url)
            .query(&[("range", period), ("interval", interval)])
            .send()
            .await?;

        // Unknown symbols come back as 404 with an error payload, so read
        // the body before looking at the status
        let status = response.status();
        let body = response.text().await?;

        let parsed = serde_json::from_str::<YahooResponse>(&body);
        match parsed {
            Ok(payload) => into_series(payload, ticker),
            Err(_) if !status.is_success() => Err(PipelineError::Fetch(format!(
                "provider responded with HTTP {} for {}",
                status, ticker
            ))),
            Err(e) => Err(PipelineError::Fetch(format!(
                "could not decode provider response for {}: {}",
                ticker, e
            ))),
        }
    }
}

fn into_series(response: YahooResponse, ticker: &str) -> Result<RawPriceSeries> {
    if let Some(error) = response.chart.error {
        return Err(PipelineError::Fetch(format!(
            "{}: {} - {}",
            ticker, error.code, error.description
        )));
    }

    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(PriceSeries::default());
    };

    let timestamps = data.timestamp.unwrap_or_default();
    let n = timestamps.len();
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

    // Provider gaps become NaN so the cleaner can drop them
    let to_column = |name: &str, values: Vec<Option<f64>>| {
        let mut values: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        values.resize(n, f64::NAN);
        Column::new(name, values)
    };

    let mut columns = vec![
        to_column("Open", quote.open),
        to_column("High", quote.high),
        to_column("Low", quote.low),
        to_column("Close", quote.close),
        to_column("Volume", quote.volume),
    ];

    if let Some(adj) = data.indicators.adjclose.and_then(|a| a.into_iter().next()) {
        columns.push(to_column("Adj Close", adj.adjclose));
    }

    let index = timestamps.into_iter().map(RawTimestamp::Epoch).collect();
    PriceSeries::from_parts(index, columns)
}

/// In-memory provider returning a fixed table
#[cfg(test)]
pub(crate) struct StaticProvider {
    pub series: RawPriceSeries,
}

#[cfg(test)]
#[async_trait]
impl MarketDataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn history(&self, _ticker: &str, _period: &str, _interval: &str) -> Result<RawPriceSeries> {
        Ok(self.series.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "regularMarketPrice": 189.5},
                "timestamp": [1704205800, 1704205860, 1704205920],
                "indicators": {
                    "quote": [{
                        "open": [187.1, 187.4, null],
                        "high": [187.6, 187.9, 188.0],
                        "low": [186.9, 187.2, 187.5],
                        "close": [187.4, 187.8, 187.9],
                        "volume": [120000, 80000, 65000]
                    }],
                    "adjclose": [{"adjclose": [187.4, 187.8, 187.9]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_response() {
        let response: YahooResponse = serde_json::from_str(CHART_BODY).unwrap();
        let series = into_series(response, "AAPL").unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(
            series.column_names(),
            vec!["Open", "High", "Low", "Close", "Volume", "Adj Close"]
        );
        assert_eq!(series.index()[0], RawTimestamp::Epoch(1704205800));
        assert!(series.column("Open").unwrap()[2].is_nan());
        assert_eq!(series.column("Volume").unwrap()[0], 120000.0);
    }

    #[test]
    fn test_provider_error_payload() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let response: YahooResponse = serde_json::from_str(body).unwrap();

        let err = into_series(response, "NOPE").unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(ref msg) if msg.contains("Not Found")));
    }

    #[test]
    fn test_short_quote_vectors_are_padded() {
        let body = r#"{"chart": {"result": [{"timestamp": [1, 2], "indicators": {"quote": [{"close": [1.0]}]}}], "error": null}}"#;
        let response: YahooResponse = serde_json::from_str(body).unwrap();

        let series = into_series(response, "X").unwrap();
        assert_eq!(series.column("Close").unwrap().len(), 2);
        assert!(series.column("Open").unwrap().iter().all(|v| v.is_nan()));
    }

    async fn spawn_chart_server() -> String {
        use axum::http::StatusCode;
        use axum::routing::get;
        use axum::Router;

        const NOT_FOUND: &str = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;

        let app = Router::new()
            .route(
                "/AAPL",
                get(|| async { (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests") }),
            )
            .route("/ZZZZ", get(|| async { (StatusCode::NOT_FOUND, NOT_FOUND) }))
            .route("/MSFT", get(|| async { CHART_BODY }))
            .route("/GARBLED", get(|| async { "<html>maintenance</html>" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_http_history_outcomes() {
        let base = spawn_chart_server().await;
        let provider = YahooFinanceProvider::new(&base, Duration::from_secs(5)).unwrap();

        let err = fetch(&provider, "AAPL", "1d", "1m").await.unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(ref msg) if msg.contains("429")), "{:?}", err);

        let err = fetch(&provider, "ZZZZ", "1d", "1m").await.unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(ref msg) if msg.contains("Not Found")), "{:?}", err);

        let err = fetch(&provider, "GARBLED", "1d", "1m").await.unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(ref msg) if msg.contains("decode")), "{:?}", err);

        let series = fetch(&provider, "MSFT", "1d", "1m").await.unwrap();
        assert_eq!(series.len(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_fetch_error() {
        // Grab a free port, then release it so nothing is listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let provider =
            YahooFinanceProvider::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        let err = fetch(&provider, "AAPL", "1d", "1m").await.unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_requests() {
        let provider = StaticProvider {
            series: PriceSeries::default(),
        };

        for (ticker, period, interval) in [("  ", "1d", "1m"), ("AAPL", "2w", "1m"), ("AAPL", "1d", "7m")] {
            let err = fetch(&provider, ticker, period, interval).await.unwrap_err();
            assert!(matches!(err, PipelineError::Fetch(_)));
        }
    }

    #[tokio::test]
    async fn test_fetch_empty_result_is_error() {
        let provider = StaticProvider {
            series: PriceSeries::default(),
        };

        let err = fetch(&provider, "AAPL", "1d", "1m").await.unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(ref msg) if msg.contains("no rows")));
    }
}

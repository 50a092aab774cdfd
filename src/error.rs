// src/error.rs
use thiserror::Error;

/// Every way a pipeline run can fail. All variants abort the current run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Network/provider failure, unknown ticker, or an empty result
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// A required column is missing or the table has the wrong shape
    #[error("schema error: {0}")]
    Schema(String),

    /// Writing to (or reading back from) a file or database failed
    #[error("persist failed: {0}")]
    Persist(String),

    /// A window, span or multiplier that cannot produce a result
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Writing or opening the chart page failed
    #[error("render failed: {0}")]
    Render(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Remediation hints printed under the diagnostic by the CLI
    pub fn hints(&self) -> &'static [&'static str] {
        match self {
            PipelineError::Fetch(_) => &[
                "Check your internet connection",
                "Check that the ticker symbol exists on the provider",
                "Check that period/interval are supported (e.g. 1d/1m, 1mo/1d)",
            ],
            PipelineError::Schema(_) => &[
                "Make sure the data contains open/high/low/close columns",
                "Run the clean stage before computing indicators",
            ],
            PipelineError::Persist(_) => &[
                "Check that the output directory is writable",
                "Check the PIPELINE_DATABASE_URL setting",
            ],
            PipelineError::InvalidParameter(_) => &[
                "Windows and spans must be at least 1",
            ],
            PipelineError::Render(_) => &[
                "Check that the chart output path is writable",
                "Set PIPELINE_OPEN_BROWSER=false on headless machines",
            ],
            PipelineError::Config(_) => &[
                "Check pipeline.toml and PIPELINE_* environment variables",
            ],
        }
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(e: sqlx::Error) -> Self {
        PipelineError::Persist(e.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(e: csv::Error) -> Self {
        PipelineError::Persist(e.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError::Fetch(e.to_string())
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(e: config::ConfigError) -> Self {
        PipelineError::Config(e.to_string())
    }
}

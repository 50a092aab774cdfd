// src/chart/mod.rs
pub mod figure;

use crate::data::series::PriceSeries;
use crate::error::{PipelineError, Result};
use askama::Template;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, instrument, warn};

pub use self::figure::{build_figure, Figure};

#[derive(Template)]
#[template(path = "chart.html")]
struct ChartPage<'a> {
    title: &'a str,
    figure_json: String,
    refresh_secs: Option<u64>,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPage<'a> {
    ticker: &'a str,
    message: String,
    hints: &'static [&'static str],
    refresh_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub output: PathBuf,
    pub open_browser: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from("chart.html"),
            open_browser: true,
        }
    }
}

/// Render the series as a standalone HTML page.
///
/// `refresh_secs` adds a meta refresh so a served page reloads itself.
pub fn render_html(series: &PriceSeries, ticker: &str, refresh_secs: Option<u64>) -> Result<String> {
    let figure = build_figure(series, ticker)?;
    let figure_json = serde_json::to_string(&figure)
        .map_err(|e| PipelineError::Render(format!("failed to serialize figure: {}", e)))?
        // Keep a ticker like "</script>" from closing the script block
        .replace("</", "<\\/");

    let title = figure.layout.title.text.clone();
    ChartPage {
        title: &title,
        figure_json,
        refresh_secs,
    }
    .render()
    .map_err(|e| PipelineError::Render(e.to_string()))
}

/// Page shown in place of the chart when a refresh fails
pub fn render_error(ticker: &str, error: &PipelineError, refresh_secs: Option<u64>) -> Result<String> {
    ErrorPage {
        ticker,
        message: error.to_string(),
        hints: error.hints(),
        refresh_secs,
    }
    .render()
    .map_err(|e| PipelineError::Render(e.to_string()))
}

/// Write the chart page to `options.output` and optionally open it.
/// Returns the path written.
#[instrument(skip(series, options), fields(rows = series.len(), output = %options.output.display()))]
pub fn render(series: &PriceSeries, ticker: &str, options: &ChartOptions) -> Result<PathBuf> {
    let html = render_html(series, ticker, None)?;

    let path = &options.output;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            PipelineError::Render(format!("failed to create {}: {}", parent.display(), e))
        })?;
    }
    fs::write(path, html)
        .map_err(|e| PipelineError::Render(format!("failed to write {}: {}", path.display(), e)))?;
    info!("Chart written to {}", path.display());

    if options.open_browser {
        // A missing browser shouldn't fail a run whose chart is already on disk
        if let Err(e) = open_in_browser(path) {
            warn!("Could not open browser: {}", e);
        }
    }

    Ok(path.clone())
}

/// `file://` URL for a written chart, absolute when the file exists
pub fn file_url(path: &Path) -> String {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

fn open_in_browser(path: &Path) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    let mut command = Command::new("open");
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = Command::new("xdg-open");

    command.arg(path).spawn().map(|_| ())
}

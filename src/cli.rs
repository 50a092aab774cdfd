// src/cli.rs
use crate::chart;
use crate::config::Settings;
use crate::dashboard;
use crate::error::Result;
use crate::pipeline::{Pipeline, Request};
use crate::utils::print_preview;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stock-pipeline")]
#[command(about = "Fetch, clean, analyze, store and chart stock prices", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Ticker selection; unset fields fall back to the command's defaults
#[derive(Args, Debug, Clone, Default)]
pub struct TickerArgs {
    /// Ticker symbol (e.g., "AAPL")
    #[arg(short, long)]
    pub ticker: Option<String>,

    /// History period (e.g., "1d", "1mo", "1y")
    #[arg(short, long)]
    pub period: Option<String>,

    /// Bar interval (e.g., "1m", "1h", "1d")
    #[arg(short, long)]
    pub interval: Option<String>,
}

impl TickerArgs {
    /// Fill unset fields, taking the ticker from settings and the
    /// period/interval from the given fallbacks
    pub fn resolve(&self, settings: &Settings, period: &str, interval: &str) -> Request {
        Request::new(
            self.ticker.clone().unwrap_or_else(|| settings.ticker.clone()),
            self.period.clone().unwrap_or_else(|| period.to_string()),
            self.interval.clone().unwrap_or_else(|| interval.to_string()),
        )
    }

    fn resolve_configured(&self, settings: &Settings) -> Request {
        self.resolve(settings, &settings.period, &settings.interval)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch raw history and print a preview
    Fetch(TickerArgs),

    /// Fetch and clean
    Clean(TickerArgs),

    /// Fetch, clean and add SMA, EMA and daily return
    Indicators(TickerArgs),

    /// Fetch, clean and add Bollinger Bands and RSI; writes <TICKER>_analyzed.csv
    Analyze(TickerArgs),

    /// Compute every indicator and store it in the database and CSV file
    Save(TickerArgs),

    /// Compute every indicator and write the chart page
    Plot(TickerArgs),

    /// Preview the stored CSV file
    Show,

    /// Serve an auto-refreshing chart
    Serve(TickerArgs),

    /// Fetch, clean, compute, save and plot
    Run(TickerArgs),
}

/// Execute one command against `pipeline`
pub async fn execute_command(command: Commands, pipeline: Pipeline) -> Result<()> {
    let settings = pipeline.settings().clone();

    match command {
        Commands::Fetch(args) => {
            let request = args.resolve(&settings, "1d", "1m");
            let raw = pipeline.fetch(&request).await?;
            print_preview("fetched data", &raw);
        }
        Commands::Clean(args) => {
            let request = args.resolve(&settings, "1d", "1m");
            let cleaned = pipeline.clean(&request).await?;
            print_preview("cleaned data", &cleaned);
        }
        Commands::Indicators(args) => {
            let request = args.resolve(&settings, "1d", "1m");
            let processed = pipeline.moving_averages(&request).await?;
            print_preview("processed data", &processed);
        }
        Commands::Analyze(args) => {
            let request = args.resolve(&settings, "1mo", "1d");
            let analyzed = pipeline.analyze(&request).await?;
            print_preview("analyzed data", &analyzed);

            let path = pipeline.export_analysis(&analyzed, &request.ticker).await?;
            println!("\nAnalysis saved to {}", path.display());
        }
        Commands::Save(args) => {
            let request = args.resolve_configured(&settings);
            let processed = pipeline.process(&request).await?;
            let destinations = pipeline.save(&processed).await?;
            for destination in destinations {
                println!("Saved {} rows to {}", processed.len(), destination);
            }
        }
        Commands::Plot(args) => {
            let request = args.resolve(&settings, "1d", "1m");
            let processed = pipeline.process(&request).await?;
            let path = pipeline.plot(&processed, &request.ticker)?;
            println!("Chart written to {}", chart::file_url(&path));
        }
        Commands::Show => {
            let stored = pipeline.load().await?;
            print_preview("stored data", &stored);
        }
        Commands::Serve(args) => {
            let request = args.resolve_configured(&settings);
            dashboard::serve(pipeline, request).await?;
        }
        Commands::Run(args) => {
            let request = args.resolve_configured(&settings);
            let summary = pipeline.run(&request).await?;
            print_preview("processed data", &summary.series);
            for destination in &summary.destinations {
                println!("Saved to {}", destination);
            }
            println!("Chart written to {}", chart::file_url(&summary.chart));
        }
    }

    Ok(())
}

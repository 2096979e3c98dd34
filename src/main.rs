use clap::{Parser, Subcommand};
use std::sync::Arc;

use ufo_atlas::analysis::{self, report};
use ufo_atlas::config::{AppState, Config};
use ufo_atlas::scrape::{CensusScraper, FrequencyScraper, HttpPageSource, ScrapeSummary};
use ufo_atlas::{logger, server};

#[derive(Parser)]
#[command(name = "ufo-atlas")]
#[command(about = "UFO sighting frequencies by region, raw and per capita", long_about = None)]
struct Cli {
    /// Configuration file, extension optional
    #[arg(long, global = true, default_value = "config")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Re-scrape monthly sighting counts per region
    ScrapeFrequency,
    /// Re-scrape state populations from the census API
    ScrapeCensus,
    /// Print raw and per-capita rankings for a month range
    Crunch {
        /// First month, YYYY-MM
        #[arg(long)]
        from: String,
        /// Last month, YYYY-MM
        #[arg(long)]
        to: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = Config::load_from(&cli.config)?;
    logger::init(&cfg)?;

    // Single-threaded: connections and scrapes share one thread through the LocalSet
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();

    runtime.block_on(local.run_until(run(cli.command.unwrap_or(Commands::Serve), &cfg)))
}

async fn run(command: Commands, cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(cfg));
    let result = execute(command, &state).await;
    state.shutdown().await;

    if let Err(ref e) = result {
        logger::log_error(&e.to_string());
    }
    Ok(result?)
}

async fn execute(command: Commands, state: &Arc<AppState>) -> ufo_atlas::Result<()> {
    match command {
        Commands::Serve => {
            state.init().await?;
            server::run(Arc::clone(state)).await
        }
        Commands::ScrapeFrequency => {
            let source = HttpPageSource::new(&state.config.scrape)?;
            let summary = FrequencyScraper::new(&source, &state.config.scrape)?
                .run(&state.database)
                .await?;
            print_summary("monthly frequency pages", summary);
            Ok(())
        }
        Commands::ScrapeCensus => {
            let source = HttpPageSource::new(&state.config.scrape)?;
            let summary = CensusScraper::new(&source, &state.config.scrape)
                .run(&state.database)
                .await?;
            print_summary("states", summary);
            Ok(())
        }
        Commands::Crunch { from, to } => {
            let start = report::parse_month(&from)?;
            let end = report::parse_month(&to)?;
            let raw = analysis::sum_frequency(&state.database, start, end).await?;
            let per_capita = analysis::per_capita(&state.database, start, end).await?;
            print!("{}", report::render(&raw, &per_capita));
            Ok(())
        }
    }
}

fn print_summary(what: &str, summary: ScrapeSummary) {
    println!(
        "Scraped {} {what}: removed {} old records, inserted {}.",
        summary.scraped, summary.deleted, summary.inserted
    );
}

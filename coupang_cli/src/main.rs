mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "coupang-orders")]
#[command(about = "Scrape and manage Coupang Taiwan purchase history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full browser scrape and merge into the store
    Scrape(commands::scrape::ScrapeArgs),
    /// Apply a raw JSON batch (browser console export) to the store
    Ingest(commands::ingest::IngestArgs),
    /// Send a batch to the companion ingestion server
    Push(commands::push::PushArgs),
    /// Per-category counts and spend from the store
    Stats(commands::stats::StatsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("coupang_scraper=info".parse().unwrap())
                .add_directive("purchase_store=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Scrape(args) => commands::scrape::run(args).await?,
        Commands::Ingest(args) => commands::ingest::run(args)?,
        Commands::Push(args) => commands::push::run(args).await?,
        Commands::Stats(args) => commands::stats::run(args)?,
    }

    Ok(())
}

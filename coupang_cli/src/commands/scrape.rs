//! The `scrape` subcommand: drives the full browser pipeline.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use coupang_scraper::{Scraper, ScraperConfig};

#[derive(Args)]
pub struct ScrapeArgs {
    /// Run the browser without a window (manual handoffs become impossible)
    #[arg(long)]
    pub headless: bool,

    /// Store file to merge into
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Pagination ceiling for this run
    #[arg(long)]
    pub max_pages: Option<usize>,
}

pub async fn run(args: &ScrapeArgs) -> Result<()> {
    let mut config = ScraperConfig::from_env()?;
    if args.headless {
        config.headless = true;
    }
    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }
    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages.max(1);
    }

    let summary = Scraper::new(config).run().await?;
    println!(
        "{} pages visited, {} records scraped, {} added, {} already present",
        summary.pages, summary.scraped, summary.added, summary.skipped
    );
    println!(
        "store now holds {} purchases, NT${:.0} total",
        summary.total_items, summary.total_spent
    );
    Ok(())
}

use clap::{Parser, Subcommand};
use offerwatch_scraper::{ScrapeConfig, ScrapeEngine};

#[derive(Debug, Parser)]
#[command(name = "offerwatch-cli")]
#[command(about = "Offerwatch command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape a single ad-library URL once and print the result as JSON.
    ///
    /// Runs the same retry/backoff engine the server uses, without touching
    /// the database. Handy for checking what a page yields before tracking it.
    Scrape {
        /// Ad-library page URL to scrape.
        #[arg(long)]
        url: String,
        /// Per-request timeout in milliseconds.
        #[arg(long, default_value_t = 30_000)]
        timeout_ms: u64,
        /// Total attempts before giving up.
        #[arg(long, default_value_t = 3)]
        max_retries: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scrape {
            url,
            timeout_ms,
            max_retries,
        } => {
            let config = ScrapeConfig {
                timeout_ms,
                max_retries,
                ..ScrapeConfig::default()
            };
            let engine = ScrapeEngine::new(config)?;
            let result = engine.scrape(&url).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use shelfscraper::attributes::{AttributeProcessor, DEFAULT_LOCALE};
use shelfscraper::export::write_results_csv_file;
use shelfscraper::{
    create_cache, BatchCoordinator, CacheType, HtmlProductExtractor, HttpFetcher, PipelineConfig,
    RateLimiter, ScrapeCoordinator, StatsTracker,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Cached, rate-limited product listing scraper.
///
/// Settings come from the environment (and `.env`): RATE_LIMIT_CALLS,
/// RATE_LIMIT_PERIOD, CACHE_EXPIRATION, SCRAPE_TIMEOUT, SCRAPE_MAX_CONCURRENCY,
/// SCRAPE_SINGLE_FLIGHT, CACHE_STRICT, SCRAPE_USER_AGENT and CACHE_DIR.
#[derive(Parser, Debug)]
#[command(name = "shelfscraper", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape product listings and print them as JSON
    Scrape {
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,

        /// Also write the results to this CSV file
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,
    },

    /// Extract product attributes from a product JSON document into CSV
    Attributes {
        #[arg(value_name = "URL", env = "JSON_URL")]
        url: String,

        #[arg(long, value_name = "PATH", env = "OUTPUT_FILE", default_value = "output-product.csv")]
        output: PathBuf,

        #[arg(long, default_value = DEFAULT_LOCALE)]
        locale: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("shelfscraper", LevelFilter::Info)
        .filter_module("selectors", LevelFilter::Warn)
        .filter_module("html5ever", LevelFilter::Error)
        .parse_default_env()
        .init();

    let config = PipelineConfig::from_env().context("failed to load configuration")?;
    let fetcher = Arc::new(
        HttpFetcher::default()
            .with_headers(&config.user_agent, config.headers.as_slice())
            .context("failed to build HTTP client")?,
    );

    match cli.command {
        Command::Scrape { urls, csv } => {
            let cache_type = match &config.cache_dir {
                Some(path) => CacheType::Disk { path: path.clone() },
                None => CacheType::Memory,
            };
            info!("Using cache backend {:?}", cache_type);
            let cache = create_cache(cache_type).context("failed to open cache")?;

            let limiter = Arc::new(RateLimiter::new(
                config.rate_limit_calls,
                config.rate_limit_period,
            ));
            let stats = Arc::new(StatsTracker::new());
            let timeout = config.fetch_timeout;
            let coordinator = Arc::new(
                ScrapeCoordinator::new(
                    fetcher,
                    Arc::new(HtmlProductExtractor::default()),
                    cache,
                    limiter,
                    config,
                )
                .with_stats(Arc::clone(&stats)),
            );

            let batch = BatchCoordinator::from_coordinator(coordinator);
            let results = batch.get_results(&urls, timeout).await;

            println!("{}", serde_json::to_string_pretty(&results)?);
            if let Some(path) = csv {
                write_results_csv_file(&path, &results)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            stats.print_summary();
        }
        Command::Attributes {
            url,
            output,
            locale,
        } => {
            let processor =
                AttributeProcessor::new(fetcher, config.fetch_timeout).with_locale(locale);
            let attributes = processor.process(&url, &output).await?;
            println!("{}", serde_json::to_string_pretty(&attributes)?);
        }
    }

    Ok(())
}

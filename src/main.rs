use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use toscrape_discovery::export::{self, ExportFormat, Row, Table};
use toscrape_discovery::{
    BookStats, CandidateSource, ConfigFile, QuoteStats, ScraperConfig, WebScraper, BOOKS_BASE_URL,
    QUOTES_BASE_URL,
};

const PREVIEW_ROWS: usize = 5;

#[derive(Parser)]
#[command(name = "toscrape", version, about = "Scrape quotes, books, or any listing page into CSV")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TOML file with scraper settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Site root used by the quotes and books scrapers
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Seconds to wait between requests
    #[arg(long, global = true)]
    delay: Option<f64>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Use a random browser user agent for each request
    #[arg(long, global = true)]
    rotate_user_agents: bool,

    /// Output format (defaults to the output file's extension)
    #[arg(long, value_enum, global = true)]
    format: Option<ExportFormat>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape the quote listing
    Quotes {
        #[arg(short, long, default_value = "quotes_output.csv")]
        output: PathBuf,
    },
    /// Scrape several pages of the book catalogue
    Books {
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u16).range(1..=10))]
        pages: u16,
        #[arg(short, long, default_value = "books_output.csv")]
        output: PathBuf,
    },
    /// List likely record containers on a page
    Detect { url: String },
    /// Extract positional fields from the containers on a page
    Extract {
        url: String,
        /// Container selector; the top detected candidate when omitted
        #[arg(long)]
        selector: Option<String>,
        #[arg(long, default_value_t = 10)]
        max_items: usize,
        #[arg(short, long, default_value = "extracted_output.csv")]
        output: PathBuf,
    },
}

impl Cli {
    fn scraper_config(&self, default_base_url: &str) -> Result<ScraperConfig> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => ConfigFile::default(),
        };

        let mut config = file.into_config(default_base_url);
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(delay) = self.delay {
            config.delay_secs = delay;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        if self.rotate_user_agents {
            config.rotate_user_agents = true;
        }
        Ok(config)
    }

    fn output_format(&self, path: &Path) -> ExportFormat {
        self.format.unwrap_or_else(|| ExportFormat::from_path(path))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(level));

    match &cli.command {
        Command::Quotes { output } => {
            let scraper = WebScraper::new(cli.scraper_config(QUOTES_BASE_URL)?)?;
            let quotes = scraper.scrape_quotes().await;
            if quotes.is_empty() {
                anyhow::bail!("Failed to scrape quotes from {}", scraper.config().base_url);
            }

            save_and_preview(&quotes, &scraper.config().base_url, output, cli.output_format(output))?;
            println!("\n{}", QuoteStats::from_quotes(&quotes));
        }
        Command::Books { pages, output } => {
            let scraper = WebScraper::new(cli.scraper_config(BOOKS_BASE_URL)?)?;
            let books = scraper.scrape_books(usize::from(*pages)).await;

            let Some(stats) = BookStats::from_books(&books) else {
                anyhow::bail!("Failed to scrape books from {}", scraper.config().base_url);
            };

            save_and_preview(&books, &scraper.config().base_url, output, cli.output_format(output))?;
            println!("\n{}", stats);
        }
        Command::Detect { url } => {
            let scraper = WebScraper::new(cli.scraper_config(url)?)?;
            let document = scraper.fetch_page(url).await?;
            let candidates = scraper.candidates(&document);

            if candidates.is_empty() {
                println!("No repeating containers detected on {}.", url);
                println!("Inspect the page and pass a selector: toscrape extract {} --selector <css>", url);
                return Ok(());
            }

            println!("Detected {} candidate container(s) on {}:\n", candidates.len(), url);
            for (i, candidate) in candidates.iter().enumerate() {
                let source = match candidate.source {
                    CandidateSource::PatternHeuristic => "pattern",
                    CandidateSource::FrequencyHeuristic => "frequency",
                };
                println!("{}. {}  ({} matches, {})", i + 1, candidate.selector, candidate.match_count, source);
                println!("   {}", candidate.sample_snippet.replace('\n', " "));
            }
        }
        Command::Extract {
            url,
            selector,
            max_items,
            output,
        } => {
            let scraper = WebScraper::new(cli.scraper_config(url)?)?;
            let document = scraper.fetch_page(url).await?;

            let selector = match selector {
                Some(selector) => selector.clone(),
                None => match scraper.candidates(&document).into_iter().next() {
                    Some(candidate) => {
                        log::info!(
                            "Using detected container '{}' ({} matches)",
                            candidate.selector,
                            candidate.match_count
                        );
                        candidate.selector
                    }
                    None => {
                        println!("No repeating containers detected; pass --selector to choose one manually.");
                        return Ok(());
                    }
                },
            };

            let records = scraper.records(&document, &selector, *max_items);
            if records.is_empty() {
                println!("No records extracted with '{}'.", selector);
                return Ok(());
            }

            save_and_preview(&records, url, output, cli.output_format(output))?;
        }
    }

    Ok(())
}

fn save_and_preview<R: Row + serde::Serialize>(
    records: &[R],
    source: &str,
    output: &Path,
    format: ExportFormat,
) -> Result<()> {
    let count = export::save(records, source, output, format)
        .with_context(|| format!("Failed to save {}", output.display()))?;

    println!("Saved {} records to {}", count, output.display());
    println!("\nPreview of {}:", output.display());
    println!("{}", Table::from_rows(records).preview(PREVIEW_ROWS));
    Ok(())
}

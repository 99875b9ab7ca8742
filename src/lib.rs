// ToScrape Discovery Library
//
// Fetches HTML pages, extracts records with fixed profiles or by discovering
// the repeating record container on an arbitrary page, and exports them as
// tables.

pub mod config;
pub mod detector;
pub mod document;
pub mod error;
pub mod export;
pub mod extractor;
pub mod fetcher;
pub mod profiles;
pub mod stats;
pub mod utils;

// Re-export main types for convenience
pub use config::{ConfigFile, ScraperConfig, BOOKS_BASE_URL, QUOTES_BASE_URL};
pub use detector::{CandidateSource, ContainerCandidate, ContainerDetector, DetectorOptions};
pub use document::{ClassFrequency, Document, Element};
pub use error::{Result, ScrapeError};
pub use export::{ExportFormat, Row, Table};
pub use extractor::{ExtractedRecord, ExtractorOptions, FieldExtractor};
pub use fetcher::WebScraper;
pub use profiles::{Book, Quote};
pub use stats::{BookStats, QuoteStats};
pub use utils::{get_random_user_agent, RateLimiter, DEFAULT_USER_AGENT, USER_AGENTS};

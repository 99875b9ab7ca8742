use std::time::Duration;
use url::Url;

use crate::config::ScraperConfig;
use crate::detector::{ContainerCandidate, ContainerDetector};
use crate::document::Document;
use crate::error::{Result, ScrapeError};
use crate::extractor::{ExtractedRecord, FieldExtractor};
use crate::profiles::{self, Book, Quote};
use crate::utils::{get_random_user_agent, RateLimiter};

/// Rate-limited page fetching plus the scrape flows built on top of it.
pub struct WebScraper {
    client: reqwest::Client,
    config: ScraperConfig,
    base_url: Url,
    rate_limiter: RateLimiter,
    detector: ContainerDetector,
    extractor: FieldExtractor,
}

impl WebScraper {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let base_url = config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(|e| ScrapeError::Config(format!("failed to build HTTP client: {}", e)))?;

        log::info!("Scraper initialized for {}", config.base_url);

        Ok(Self {
            client,
            rate_limiter: RateLimiter::from_secs_f64(config.delay_secs),
            base_url,
            config,
            detector: ContainerDetector::new(),
            extractor: FieldExtractor::new(),
        })
    }

    pub fn with_detector(mut self, detector: ContainerDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_extractor(mut self, extractor: FieldExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Fetch and parse one page, after waiting out the politeness delay.
    pub async fn fetch_page(&self, url: &str) -> Result<Document> {
        let _in_flight = self.rate_limiter.wait().await;

        log::info!("Fetching: {}", url);

        let user_agent = if self.config.rotate_user_agents {
            get_random_user_agent()
        } else {
            self.config.user_agent.as_str()
        };

        let response = self
            .client
            .get(url)
            .header("User-Agent", user_agent)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await
            .map_err(|source| ScrapeError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        })?;

        let document = Document::parse(&body)?;
        log::info!("Successfully fetched {}", url);
        Ok(document)
    }

    /// Like [`fetch_page`](Self::fetch_page), reporting failures in the log
    /// and returning no document.
    pub async fn fetch_document(&self, url: &str) -> Option<Document> {
        match self.fetch_page(url).await {
            Ok(document) => Some(document),
            Err(e) => {
                log::error!("Error fetching {}: {}", url, e);
                None
            }
        }
    }

    /// Resolve `path` against the configured base URL.
    pub fn page_url(&self, path: &str) -> Result<String> {
        self.base_url
            .join(path)
            .map(String::from)
            .map_err(|e| ScrapeError::Config(format!("cannot join '{}' onto {}: {}", path, self.base_url, e)))
    }

    pub async fn scrape_quotes(&self) -> Vec<Quote> {
        let Some(document) = self.fetch_document(self.base_url.as_str()).await else {
            log::warn!("Failed to fetch page");
            return Vec::new();
        };

        profiles::quotes::extract(&document)
    }

    /// Scrape catalogue pages `1..=num_pages`; pages that fail to load are
    /// skipped.
    pub async fn scrape_books(&self, num_pages: usize) -> Vec<Book> {
        let mut books = Vec::new();

        for page in 1..=num_pages {
            let url = match self.page_url(&format!("catalogue/page-{}.html", page)) {
                Ok(url) => url,
                Err(e) => {
                    log::error!("{}", e);
                    break;
                }
            };

            let Some(document) = self.fetch_document(&url).await else {
                log::warn!("Failed to fetch page {}", page);
                continue;
            };

            let found = profiles::books::extract(&document, page);
            log::info!("Scraped page {}: {} books found", page, found.len());
            books.extend(found);
        }

        log::info!("Total books scraped: {}", books.len());
        books
    }

    /// Container candidates for an already fetched page, ranked by this
    /// scraper's detector.
    pub fn candidates(&self, document: &Document) -> Vec<ContainerCandidate> {
        self.detector.detect(document)
    }

    /// Records from an already fetched page, using this scraper's extractor.
    pub fn records(&self, document: &Document, selector: &str, max_items: usize) -> Vec<ExtractedRecord> {
        self.extractor.extract(document, selector, max_items)
    }

    /// Discovery step one: candidate container selectors for `url`.
    pub async fn detect(&self, url: &str) -> Vec<ContainerCandidate> {
        match self.fetch_document(url).await {
            Some(document) => self.candidates(&document),
            None => Vec::new(),
        }
    }

    /// Discovery step two: records from the containers matching `selector`.
    pub async fn extract(&self, url: &str, selector: &str, max_items: usize) -> Vec<ExtractedRecord> {
        match self.fetch_document(url).await {
            Some(document) => self.records(&document, selector, max_items),
            None => Vec::new(),
        }
    }
}

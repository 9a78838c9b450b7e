use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Census
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "page")]
    pub pages: Vec<PageEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Seed URLs the crawl starts from
    #[serde(rename = "start-pages")]
    pub start_pages: Vec<String>,

    /// Maximum number of link hops, counting the seed page as the first
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Crawl budget in seconds, measured from the start of the crawl
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: u64,

    /// Maximum number of concurrent page fetches
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,

    /// URLs fully matching any of these patterns are never visited
    #[serde(rename = "ignored-urls", default)]
    pub ignored_urls: Vec<String>,

    /// Words fully matching any of these patterns are never counted
    #[serde(rename = "ignored-words", default)]
    pub ignored_words: Vec<String>,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Upper bound on concurrent fetches
pub const MAX_PARALLELISM: u32 = 256;

fn default_parallelism() -> u32 {
    std::thread::available_parallelism()
        .map(|n| u32::try_from(n.get()).unwrap_or(u32::MAX))
        .unwrap_or(1)
        .min(MAX_PARALLELISM)
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Where the crawl result is written; stdout when absent
    #[serde(rename = "result-path")]
    pub result_path: Option<String>,

    /// Where the profiling report is appended; stdout when absent
    #[serde(rename = "profile-path")]
    pub profile_path: Option<String>,
}

/// A page served by the offline sitemap parser
#[derive(Debug, Clone, Deserialize)]
pub struct PageEntry {
    /// URL the page is served under
    pub url: String,

    /// Page text; tokenised into words
    #[serde(default)]
    pub text: String,

    /// Outbound links
    #[serde(default)]
    pub links: Vec<String>,

    /// Simulated fetch latency (milliseconds)
    #[serde(rename = "latency-ms", default)]
    pub latency_ms: u64,
}

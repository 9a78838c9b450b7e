//! Sumi-Census: a deadline-bounded concurrent word census over linked pages
//!
//! This crate crawls a graph of pages from one or more seed URLs, tallying word
//! frequencies across every page it visits, and ships a method-call profiler
//! that times calls made through wrapped capability handles.

pub mod clock;
pub mod config;
pub mod crawler;
pub mod output;
pub mod parser;
pub mod profiler;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Census operations
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to parse {url}: {message}")]
    Parse { url: String, message: String },

    #[error(transparent)]
    Interception(#[from] profiler::InterceptionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("{capability} declares no profiled methods")]
    NoProfiledMethods { capability: &'static str },
}

/// Result type alias for Sumi-Census operations
pub type Result<T> = std::result::Result<T, CensusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::Config;
pub use crawler::{run_crawl, Coordinator, CrawlOutcome, CrawlTask, WebCrawler};
pub use parser::{PageParser, PageParserFactory, ParseResult};
pub use profiler::{Profiler, ProfilingState};
pub use state::CrawlState;
pub use url::PatternSet;

//! Crawler module for the concurrent recursive crawl
//!
//! This module contains the core crawling logic, including:
//! - The recursive, structured-concurrency crawl task
//! - Crawl coordination and the public entry points
//! - The `WebCrawler` capability, so the crawl itself can be profiled

mod coordinator;
mod task;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome};
pub use task::{CrawlContext, CrawlTask};

use crate::Result;
use async_trait::async_trait;

/// A crawler that can be driven, and wrapped, as a capability
#[async_trait]
pub trait WebCrawler: Send + Sync {
    /// Crawls from `start_pages` and returns the accumulated result
    ///
    /// Hitting the deadline is not an error; the outcome is simply partial.
    async fn crawl(&self, start_pages: &[String]) -> Result<CrawlOutcome>;

    /// Maximum number of pages fetched concurrently
    fn max_parallelism(&self) -> usize;
}

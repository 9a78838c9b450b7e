//! Crawler coordinator - crawl entry points
//!
//! This module turns a set of seed URLs into a finished crawl:
//! - Computing the deadline once at crawl start
//! - Building the shared crawl context
//! - Running one root task per seed and joining them
//! - Collecting the final counts

use crate::clock::Clock;
use crate::config::CrawlerConfig;
use crate::crawler::task::{join_all, CrawlContext, CrawlTask};
use crate::crawler::WebCrawler;
use crate::parser::PageParserFactory;
use crate::url::PatternSet;
use crate::{ConfigResult, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Result of a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// Total occurrences of each word across all visited pages
    pub word_counts: HashMap<String, u64>,

    /// Number of distinct URLs the crawl claimed for a visit
    pub urls_visited: usize,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    clock: Arc<dyn Clock>,
    parser_factory: Arc<dyn PageParserFactory>,
    ignore_patterns: PatternSet,
    max_depth: u32,
    timeout: Duration,
    parallelism: usize,
}

impl Coordinator {
    /// Creates a coordinator from crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(ConfigError)` - An ignore pattern failed to compile
    pub fn new(
        config: &CrawlerConfig,
        parser_factory: Arc<dyn PageParserFactory>,
        clock: Arc<dyn Clock>,
    ) -> ConfigResult<Self> {
        Ok(Self {
            clock,
            parser_factory,
            ignore_patterns: PatternSet::compile(&config.ignored_urls)?,
            max_depth: config.max_depth,
            timeout: config.timeout(),
            parallelism: config.parallelism as usize,
        })
    }

    /// Crawls from `start_pages` until the frontier, depth, or `deadline` runs out
    pub async fn crawl_until(&self, start_pages: &[String], deadline: DateTime<Utc>) -> CrawlOutcome {
        let context = Arc::new(CrawlContext::new(
            Arc::clone(&self.clock),
            self.ignore_patterns.clone(),
            Arc::clone(&self.parser_factory),
            self.parallelism,
        ));

        execute(start_pages, deadline, self.max_depth, context).await
    }
}

#[async_trait]
impl WebCrawler for Coordinator {
    async fn crawl(&self, start_pages: &[String]) -> Result<CrawlOutcome> {
        let deadline = chrono::Duration::from_std(self.timeout)
            .ok()
            .and_then(|timeout| self.clock.now().checked_add_signed(timeout))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Ok(self.crawl_until(start_pages, deadline).await)
    }

    fn max_parallelism(&self) -> usize {
        self.parallelism
    }
}

/// Runs a complete crawl from a single seed
///
/// # Arguments
///
/// * `seed_url` - Where the crawl starts
/// * `deadline` - No task starts a fetch after this instant
/// * `max_depth` - Link hops allowed, counting the seed as the first
/// * `ignore_patterns` - URLs fully matching any pattern are skipped
/// * `parser_factory` - Produces a parser per visited URL
/// * `clock` - Source of "now" for the deadline checks
///
/// # Returns
///
/// The accumulated word counts and the number of URLs visited. Running out of
/// time is not an error; the outcome then holds whatever was gathered.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use sumi_census::clock::{Clock, SystemClock};
/// use sumi_census::crawler::run_crawl;
/// use sumi_census::parser::SitemapParserFactory;
/// use sumi_census::url::PatternSet;
///
/// # async fn example() {
/// let clock = Arc::new(SystemClock);
/// let factory = Arc::new(SitemapParserFactory::new(&[], &PatternSet::default()));
/// let deadline = clock.now() + chrono::Duration::seconds(5);
///
/// let outcome = run_crawl(
///     "https://example.com/",
///     deadline,
///     3,
///     PatternSet::default(),
///     factory,
///     clock,
/// )
/// .await;
/// println!("Visited {} pages", outcome.urls_visited);
/// # }
/// ```
pub async fn run_crawl(
    seed_url: &str,
    deadline: DateTime<Utc>,
    max_depth: u32,
    ignore_patterns: PatternSet,
    parser_factory: Arc<dyn PageParserFactory>,
    clock: Arc<dyn Clock>,
) -> CrawlOutcome {
    let parallelism = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let context = Arc::new(CrawlContext::new(
        clock,
        ignore_patterns,
        parser_factory,
        parallelism,
    ));

    execute(&[seed_url.to_string()], deadline, max_depth, context).await
}

async fn execute(
    start_pages: &[String],
    deadline: DateTime<Utc>,
    max_depth: u32,
    context: Arc<CrawlContext>,
) -> CrawlOutcome {
    tracing::info!(
        "Starting crawl of {} seed(s), max depth {}, deadline {}",
        start_pages.len(),
        max_depth,
        deadline
    );
    let started = Instant::now();

    let mut roots = JoinSet::new();
    for url in start_pages {
        roots.spawn(CrawlTask::new(url.clone(), deadline, max_depth, Arc::clone(&context)).run());
    }
    join_all(&mut roots).await;

    let outcome = CrawlOutcome {
        word_counts: context.state().word_counts(),
        urls_visited: context.state().visited_count(),
    };

    tracing::info!(
        "Crawl finished: {} URLs visited, {} distinct words in {:?}",
        outcome.urls_visited,
        outcome.word_counts.len(),
        started.elapsed()
    );

    outcome
}

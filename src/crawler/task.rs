//! Recursive crawl task
//!
//! A [`CrawlTask`] is one node of the traversal tree: "visit this URL with this
//! much depth left, before this deadline". Running a task visits the page and
//! then runs one child task per outbound link, returning only when every
//! child's subtree has finished.

use crate::clock::Clock;
use crate::parser::PageParserFactory;
use crate::state::CrawlState;
use crate::url::PatternSet;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Immutable collaborators plus the shared mutable state of one crawl
pub struct CrawlContext {
    state: CrawlState,
    clock: Arc<dyn Clock>,
    ignore_patterns: PatternSet,
    parser_factory: Arc<dyn PageParserFactory>,
    fetch_limit: Semaphore,
}

impl CrawlContext {
    /// Creates the context for a new crawl
    ///
    /// # Arguments
    ///
    /// * `clock` - Source of "now" for deadline checks
    /// * `ignore_patterns` - URLs fully matching any pattern are skipped
    /// * `parser_factory` - Produces a parser per visited URL
    /// * `parallelism` - Maximum number of concurrent fetches (at least 1)
    pub fn new(
        clock: Arc<dyn Clock>,
        ignore_patterns: PatternSet,
        parser_factory: Arc<dyn PageParserFactory>,
        parallelism: usize,
    ) -> Self {
        Self {
            state: CrawlState::new(),
            clock,
            ignore_patterns,
            parser_factory,
            fetch_limit: Semaphore::new(parallelism.max(1)),
        }
    }

    /// The shared visited set and word counts
    pub fn state(&self) -> &CrawlState {
        &self.state
    }
}

/// Why a task stopped before visiting its URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    DepthExhausted,
    DeadlinePassed,
    Ignored,
}

/// One (URL, remaining depth) node of the crawl
pub struct CrawlTask {
    url: String,
    deadline: DateTime<Utc>,
    remaining_depth: u32,
    context: Arc<CrawlContext>,
}

impl CrawlTask {
    pub fn new(
        url: impl Into<String>,
        deadline: DateTime<Utc>,
        remaining_depth: u32,
        context: Arc<CrawlContext>,
    ) -> Self {
        Self {
            url: url.into(),
            deadline,
            remaining_depth,
            context,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn remaining_depth(&self) -> u32 {
        self.remaining_depth
    }

    /// Runs this task and its whole subtree
    ///
    /// The effect is entirely on the shared [`CrawlState`]. A parse failure
    /// ends this branch without touching siblings.
    pub fn run(self) -> BoxFuture<'static, ()> {
        async move {
            if let Some(reason) = self.skip_reason() {
                tracing::trace!("Skipping {} ({:?})", self.url, reason);
                return;
            }

            if !self.context.state.try_visit(&self.url) {
                tracing::trace!("Already visited {}", self.url);
                return;
            }

            let result = {
                let Ok(_permit) = self.context.fetch_limit.acquire().await else {
                    return;
                };
                // The deadline may have passed while this task waited for a slot
                if self.past_deadline() {
                    tracing::trace!("Skipping {} ({:?})", self.url, Skip::DeadlinePassed);
                    return;
                }
                tracing::debug!(
                    "Visiting {} (depth remaining: {})",
                    self.url,
                    self.remaining_depth
                );
                self.context.parser_factory.get(&self.url).parse().await
            };

            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", self.url, e);
                    return;
                }
            };

            self.context.state.merge(&page.word_counts);

            let mut children = JoinSet::new();
            for link in page.links {
                children.spawn(self.child(link).run());
            }
            join_all(&mut children).await;
        }
        .boxed()
    }

    /// Termination checks, cheapest first; none of them take a lock
    fn skip_reason(&self) -> Option<Skip> {
        if self.remaining_depth == 0 {
            return Some(Skip::DepthExhausted);
        }
        if self.past_deadline() {
            return Some(Skip::DeadlinePassed);
        }
        if self.context.ignore_patterns.matches(&self.url) {
            return Some(Skip::Ignored);
        }
        None
    }

    fn past_deadline(&self) -> bool {
        self.context.clock.now() > self.deadline
    }

    fn child(&self, url: String) -> CrawlTask {
        CrawlTask {
            url,
            deadline: self.deadline,
            remaining_depth: self.remaining_depth - 1,
            context: Arc::clone(&self.context),
        }
    }
}

/// Waits for every task in `set`, containing panics to the task that raised them
pub(crate) async fn join_all(set: &mut JoinSet<()>) {
    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            tracing::warn!("Crawl task aborted: {}", e);
        }
    }
}

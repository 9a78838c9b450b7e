//! Shared crawl state
//!
//! Both containers are sharded concurrent maps, so every operation here is a
//! single critical section on one shard. Callers never get to split a check
//! from the mutation that depends on it.

use dashmap::{DashMap, DashSet};
use std::collections::HashMap;

/// Visited URLs and cumulative word counts for one crawl
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: DashSet<String>,
    word_counts: DashMap<String, u64>,
}

impl CrawlState {
    /// Creates empty state for a new crawl
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url` for the calling task
    ///
    /// Returns true exactly once per URL across all callers; every later call
    /// for the same URL returns false.
    pub fn try_visit(&self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Returns true if `url` has been claimed
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Number of URLs claimed so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Adds one page's word counts into the running totals
    pub fn merge<'a, I>(&self, page_counts: I)
    where
        I: IntoIterator<Item = (&'a String, &'a u64)>,
    {
        for (word, count) in page_counts {
            *self.word_counts.entry(word.clone()).or_insert(0) += *count;
        }
    }

    /// Current total for `word`
    pub fn count_of(&self, word: &str) -> u64 {
        self.word_counts.get(word).map(|c| *c).unwrap_or(0)
    }

    /// Copies the current totals out
    pub fn word_counts(&self) -> HashMap<String, u64> {
        self.word_counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

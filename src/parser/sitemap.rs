//! Offline page parser backed by configured page entries
//!
//! Pages are declared up front (see [`PageEntry`]) and tokenised once when the
//! factory is built. Parsing a URL that was never declared yields an empty
//! result, the same as a page with no words and no links.

use crate::config::PageEntry;
use crate::parser::{PageParser, PageParserFactory, ParseResult};
use crate::url::PatternSet;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A declared page, already tokenised
#[derive(Debug)]
struct SitemapPage {
    result: ParseResult,
    latency: Duration,
}

/// Factory over a fixed set of declared pages
#[derive(Debug, Clone)]
pub struct SitemapParserFactory {
    pages: Arc<HashMap<String, SitemapPage>>,
}

impl SitemapParserFactory {
    /// Builds a factory from page entries
    ///
    /// # Arguments
    ///
    /// * `entries` - Declared pages; a later entry for the same URL replaces an earlier one
    /// * `ignored_words` - Words fully matching any of these are not counted
    pub fn new(entries: &[PageEntry], ignored_words: &PatternSet) -> Self {
        let pages = entries
            .iter()
            .map(|entry| {
                let page = SitemapPage {
                    result: ParseResult {
                        word_counts: tokenize(&entry.text, ignored_words),
                        links: entry.links.clone(),
                    },
                    latency: Duration::from_millis(entry.latency_ms),
                };
                (entry.url.clone(), page)
            })
            .collect();

        Self {
            pages: Arc::new(pages),
        }
    }

    /// Number of declared pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl PageParserFactory for SitemapParserFactory {
    fn get(&self, url: &str) -> Box<dyn PageParser> {
        Box::new(SitemapPageParser {
            url: url.to_string(),
            pages: Arc::clone(&self.pages),
        })
    }
}

/// Parser for one URL of a [`SitemapParserFactory`]
#[derive(Debug)]
pub struct SitemapPageParser {
    url: String,
    pages: Arc<HashMap<String, SitemapPage>>,
}

#[async_trait]
impl PageParser for SitemapPageParser {
    async fn parse(&self) -> Result<ParseResult> {
        let Some(page) = self.pages.get(&self.url) else {
            tracing::debug!("No page declared for {}, returning empty result", self.url);
            return Ok(ParseResult::default());
        };

        if !page.latency.is_zero() {
            tokio::time::sleep(page.latency).await;
        }

        Ok(page.result.clone())
    }
}

/// Splits text into lower-case words and counts them
///
/// A word is a maximal run of alphanumeric characters. Words fully matching
/// any of `ignored` are dropped.
///
/// # Examples
///
/// ```
/// use sumi_census::parser::tokenize;
/// use sumi_census::url::PatternSet;
///
/// let counts = tokenize("The cat, the HAT.", &PatternSet::default());
/// assert_eq!(counts["the"], 2);
/// assert_eq!(counts["hat"], 1);
/// ```
pub fn tokenize(text: &str, ignored: &PatternSet) -> HashMap<String, u64> {
    let mut counts = HashMap::new();

    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
    {
        if ignored.matches(&word) {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }

    counts
}

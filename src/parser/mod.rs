//! Page parsing capability consumed by the crawler
//!
//! The crawler never fetches or parses anything itself. It asks a
//! [`PageParserFactory`] for a [`PageParser`] bound to a URL and consumes the
//! resulting [`ParseResult`].
//!
//! # Components
//!
//! - `PageParser` / `PageParserFactory`: the capability traits
//! - `SitemapParserFactory`: an offline parser over pages declared in configuration

mod sitemap;

pub use sitemap::{tokenize, SitemapPageParser, SitemapParserFactory};

use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Words and outbound links extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    /// Occurrence count of each word on the page
    pub word_counts: HashMap<String, u64>,

    /// Outbound links, in document order
    pub links: Vec<String>,
}

/// A parser bound to a single URL
#[async_trait]
pub trait PageParser: Send + Sync {
    /// Fetches and parses the page
    ///
    /// May be arbitrarily slow. An `Err` ends the crawl branch for this URL only.
    async fn parse(&self) -> Result<ParseResult>;

    /// Name of the concrete parser type, resolved through trait objects
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Produces parsers for URLs
pub trait PageParserFactory: Send + Sync {
    /// Returns a parser bound to `url`
    fn get(&self, url: &str) -> Box<dyn PageParser>;
}

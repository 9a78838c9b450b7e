//! Output module for crawl results
//!
//! This module handles:
//! - Converting a crawl outcome into its serialisable form
//! - Writing raw counts as TOML to a file or stdout

mod result;

pub use result::{format_result, write_result, CrawlReport};

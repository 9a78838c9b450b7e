//! State module for the shared crawl state
//!
//! This module provides the only mutable state shared between concurrent crawl
//! tasks.
//!
//! # Components
//!
//! - `CrawlState`: the visited-URL set and the word-count accumulator

mod crawl_state;

// Re-export main types
pub use crawl_state::CrawlState;

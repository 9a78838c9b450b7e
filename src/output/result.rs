//! Raw crawl result serialisation

use crate::crawler::CrawlOutcome;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Serialisable crawl result; words are ordered alphabetically
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    #[serde(rename = "urls-visited")]
    pub urls_visited: usize,

    #[serde(rename = "word-counts")]
    pub word_counts: BTreeMap<String, u64>,
}

impl From<&CrawlOutcome> for CrawlReport {
    fn from(outcome: &CrawlOutcome) -> Self {
        Self {
            urls_visited: outcome.urls_visited,
            word_counts: outcome
                .word_counts
                .iter()
                .map(|(word, count)| (word.clone(), *count))
                .collect(),
        }
    }
}

/// Formats a crawl outcome as TOML
pub fn format_result(outcome: &CrawlOutcome) -> Result<String> {
    Ok(toml::to_string(&CrawlReport::from(outcome))?)
}

/// Writes a crawl outcome to `path`, replacing any previous result, or to stdout
///
/// # Arguments
///
/// * `outcome` - The finished crawl
/// * `path` - Destination file; `None` writes to stdout
pub fn write_result(outcome: &CrawlOutcome, path: Option<&Path>) -> Result<()> {
    let text = format_result(outcome)?;

    match path {
        Some(path) => {
            std::fs::write(path, text)?;
            tracing::info!("Crawl result written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

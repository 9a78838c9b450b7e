use crate::{ConfigError, ConfigResult};
use regex::Regex;

/// An ordered set of full-string matchers
///
/// Each pattern is a regular expression that must match the whole candidate,
/// not just a substring of it. Patterns are compiled once and shared read-only
/// for the lifetime of a crawl.
///
/// # Examples
///
/// ```
/// use sumi_census::url::PatternSet;
///
/// let patterns = PatternSet::compile(&["https://example\\.com/private/.*".to_string()]).unwrap();
///
/// assert!(patterns.matches("https://example.com/private/keys"));
/// // Substring hits do not count
/// assert!(!patterns.matches("https://mirror.net/?u=https://example.com/private/keys"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compiles the given patterns, preserving their order
    ///
    /// # Returns
    ///
    /// * `Ok(PatternSet)` - All patterns compiled
    /// * `Err(ConfigError::InvalidPattern)` - The first pattern that failed to compile
    pub fn compile(raw: &[String]) -> ConfigResult<Self> {
        let patterns = raw
            .iter()
            .map(|pattern| {
                Regex::new(&format!("^(?:{})$", pattern))
                    .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if any pattern matches `candidate` in full
    pub fn matches(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(candidate))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

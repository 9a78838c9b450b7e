use crate::config::types::{Config, CrawlerConfig, PageEntry, MAX_PARALLELISM};
use crate::url::{validate_seed_url, PatternSet};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_pages(&config.pages)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.start_pages.is_empty() {
        return Err(ConfigError::Validation(
            "start_pages must contain at least one URL".to_string(),
        ));
    }

    for page in &config.start_pages {
        validate_seed_url(page)?;
    }

    // max_depth = 0 is allowed; the crawl simply visits nothing

    if config.timeout_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_seconds must be >= 1, got {}",
            config.timeout_seconds
        )));
    }

    if config.parallelism < 1 || config.parallelism > MAX_PARALLELISM {
        return Err(ConfigError::Validation(format!(
            "parallelism must be between 1 and {}, got {}",
            MAX_PARALLELISM, config.parallelism
        )));
    }

    PatternSet::compile(&config.ignored_urls)?;
    PatternSet::compile(&config.ignored_words)?;

    Ok(())
}

/// Validates declared pages
fn validate_pages(pages: &[PageEntry]) -> Result<(), ConfigError> {
    for page in pages {
        validate_seed_url(&page.url)?;
    }
    Ok(())
}

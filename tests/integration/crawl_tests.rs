//! Integration tests for the crawler
//!
//! These tests drive full crawls over an in-memory link graph whose parser
//! records every parse call, so visit counts can be asserted exactly.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_census::clock::{Clock, FakeClock};
use sumi_census::config::{CrawlerConfig, PageEntry};
use sumi_census::crawler::{run_crawl, Coordinator, WebCrawler};
use sumi_census::parser::{PageParser, PageParserFactory, ParseResult, SitemapParserFactory};
use sumi_census::profiler::{ProfiledWebCrawler, Profiler, ProfilingPageParserFactory};
use sumi_census::url::PatternSet;
use sumi_census::{CensusError, Result};

/// A page of the test graph
#[derive(Clone, Default)]
struct TestPage {
    words: HashMap<String, u64>,
    links: Vec<String>,
    latency: Duration,
    /// How far parsing this page moves the site's clock
    advance: Duration,
    fails: bool,
}

/// In-memory link graph that counts parse calls per URL
#[derive(Default)]
struct Site {
    pages: HashMap<String, TestPage>,
    calls: Mutex<HashMap<String, usize>>,
    /// Clock moved forward by each parsed page's `advance`
    clock: Option<Arc<FakeClock>>,
}

impl Site {
    fn page(mut self, url: &str, words: &[(&str, u64)], links: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            TestPage {
                words: words.iter().map(|(w, c)| (w.to_string(), *c)).collect(),
                links: links.iter().map(|l| l.to_string()).collect(),
                ..TestPage::default()
            },
        );
        self
    }

    fn failing_page(mut self, url: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            TestPage {
                fails: true,
                ..TestPage::default()
            },
        );
        self
    }

    fn latency(mut self, url: &str, latency: Duration) -> Self {
        if let Some(page) = self.pages.get_mut(url) {
            page.latency = latency;
        }
        self
    }

    fn advance(mut self, url: &str, step: Duration) -> Self {
        if let Some(page) = self.pages.get_mut(url) {
            page.advance = step;
        }
        self
    }

    fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

struct RecordingParser {
    url: String,
    site: Arc<Site>,
}

#[async_trait]
impl PageParser for RecordingParser {
    async fn parse(&self) -> Result<ParseResult> {
        *self
            .site
            .calls
            .lock()
            .unwrap()
            .entry(self.url.clone())
            .or_insert(0) += 1;

        let page = self.site.pages.get(&self.url).cloned().unwrap_or_default();
        if !page.latency.is_zero() {
            tokio::time::sleep(page.latency).await;
        }
        if let Some(clock) = &self.site.clock {
            clock.advance(page.advance);
        }
        if page.fails {
            return Err(CensusError::Parse {
                url: self.url.clone(),
                message: "simulated failure".to_string(),
            });
        }

        Ok(ParseResult {
            word_counts: page.words,
            links: page.links,
        })
    }
}

struct RecordingFactory {
    site: Arc<Site>,
}

impl PageParserFactory for RecordingFactory {
    fn get(&self, url: &str) -> Box<dyn PageParser> {
        Box::new(RecordingParser {
            url: url.to_string(),
            site: Arc::clone(&self.site),
        })
    }
}

fn fixed_clock() -> Arc<FakeClock> {
    Arc::new(FakeClock::new(
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap(),
    ))
}

async fn crawl(site: &Arc<Site>, seed: &str, max_depth: u32, ignored: &[&str]) -> sumi_census::CrawlOutcome {
    let clock = fixed_clock();
    let deadline = clock.now() + ChronoDuration::seconds(30);
    let patterns =
        PatternSet::compile(&ignored.iter().map(|p| p.to_string()).collect::<Vec<_>>()).unwrap();

    run_crawl(
        seed,
        deadline,
        max_depth,
        patterns,
        Arc::new(RecordingFactory {
            site: Arc::clone(site),
        }),
        clock,
    )
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_diamond_visits_shared_page_once() {
    for _ in 0..25 {
        let site = Arc::new(
            Site::default()
                .page("https://d.test/", &[("top", 1)], &["https://d.test/a", "https://d.test/b"])
                .page("https://d.test/a", &[("left", 1)], &["https://d.test/c"])
                .page("https://d.test/b", &[("right", 1)], &["https://d.test/c"])
                .page("https://d.test/c", &[("bottom", 1)], &[]),
        );

        let outcome = crawl(&site, "https://d.test/", 3, &[]).await;

        assert_eq!(site.calls("https://d.test/c"), 1);
        assert_eq!(site.total_calls(), 4);
        assert_eq!(outcome.urls_visited, 4);
        assert_eq!(outcome.word_counts["bottom"], 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cycle_terminates() {
    let site = Arc::new(
        Site::default()
            .page("https://loop.test/x", &[("x", 1)], &["https://loop.test/y"])
            .page("https://loop.test/y", &[("y", 1)], &["https://loop.test/x"]),
    );

    let outcome = crawl(&site, "https://loop.test/x", 100, &[]).await;

    assert_eq!(site.total_calls(), 2);
    assert_eq!(outcome.word_counts["x"], 1);
    assert_eq!(outcome.word_counts["y"], 1);
}

#[tokio::test]
async fn test_depth_one_parses_only_seed() {
    let site = Arc::new(
        Site::default()
            .page("https://depth.test/", &[("seed", 1)], &["https://depth.test/child"])
            .page("https://depth.test/child", &[("child", 1)], &["https://depth.test/grandchild"])
            .page("https://depth.test/grandchild", &[("grandchild", 1)], &[]),
    );

    let outcome = crawl(&site, "https://depth.test/", 1, &[]).await;

    assert_eq!(site.calls("https://depth.test/"), 1);
    assert_eq!(site.calls("https://depth.test/child"), 0);
    assert_eq!(site.calls("https://depth.test/grandchild"), 0);
    assert_eq!(outcome.urls_visited, 1);
    assert!(!outcome.word_counts.contains_key("grandchild"));
}

#[tokio::test]
async fn test_depth_two_stops_before_grandchild() {
    let site = Arc::new(
        Site::default()
            .page("https://depth.test/", &[("seed", 1)], &["https://depth.test/child"])
            .page("https://depth.test/child", &[("child", 1)], &["https://depth.test/grandchild"])
            .page("https://depth.test/grandchild", &[("grandchild", 1)], &[]),
    );

    crawl(&site, "https://depth.test/", 2, &[]).await;

    assert_eq!(site.calls("https://depth.test/child"), 1);
    assert_eq!(site.calls("https://depth.test/grandchild"), 0);
}

#[tokio::test]
async fn test_past_deadline_fetches_nothing() {
    let site = Arc::new(Site::default().page("https://late.test/", &[("word", 1)], &[]));
    let clock = fixed_clock();
    let deadline = clock.now() - ChronoDuration::seconds(1);

    let outcome = run_crawl(
        "https://late.test/",
        deadline,
        5,
        PatternSet::default(),
        Arc::new(RecordingFactory {
            site: Arc::clone(&site),
        }),
        clock,
    )
    .await;

    assert_eq!(site.total_calls(), 0);
    assert_eq!(outcome.urls_visited, 0);
    assert!(outcome.word_counts.is_empty());
}

#[tokio::test]
async fn test_deadline_passing_mid_crawl_stops_new_fetches() {
    let clock = fixed_clock();
    let site = Arc::new(Site {
        clock: Some(Arc::clone(&clock)),
        ..Site::default()
            .page("https://slow.test/", &[("first", 1)], &["https://slow.test/next"])
            .page("https://slow.test/next", &[("second", 1)], &[])
            .advance("https://slow.test/", Duration::from_secs(10))
            .advance("https://slow.test/next", Duration::from_secs(10))
    });
    let deadline = clock.now() + ChronoDuration::seconds(5);

    let outcome = run_crawl(
        "https://slow.test/",
        deadline,
        5,
        PatternSet::default(),
        Arc::new(RecordingFactory {
            site: Arc::clone(&site),
        }),
        clock,
    )
    .await;

    // The in-flight page still completes and is counted
    assert_eq!(outcome.word_counts["first"], 1);
    assert_eq!(site.calls("https://slow.test/next"), 0);
    assert!(!outcome.word_counts.contains_key("second"));
}

#[tokio::test]
async fn test_deadline_passing_while_queued_for_fetch_slot() {
    let clock = fixed_clock();
    let children: Vec<String> = (1..=6).map(|i| format!("https://wide.test/{}", i)).collect();
    let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();

    let site = children.iter().fold(
        Site::default().page("https://wide.test/", &[("seed", 1)], &child_refs),
        |site, child| {
            site.page(child, &[("child", 1)], &[])
                .latency(child, Duration::from_millis(50))
                .advance(child, Duration::from_secs(10))
        },
    );
    let site = Arc::new(Site {
        clock: Some(Arc::clone(&clock)),
        ..site
    });

    let config = CrawlerConfig {
        start_pages: vec!["https://wide.test/".to_string()],
        max_depth: 3,
        timeout_seconds: 5,
        parallelism: 1,
        ignored_urls: vec![],
        ignored_words: vec![],
    };
    let factory = Arc::new(RecordingFactory {
        site: Arc::clone(&site),
    });
    let coordinator = Coordinator::new(&config, factory, clock).unwrap();

    let outcome = coordinator.crawl(&config.start_pages).await.unwrap();

    // Siblings queued behind the first child find the deadline gone once they get a slot
    assert_eq!(site.total_calls(), 2);
    assert_eq!(outcome.word_counts["seed"], 1);
    assert_eq!(outcome.word_counts["child"], 1);
}

#[tokio::test]
async fn test_ignore_pattern_matching_seed_fetches_nothing() {
    let site = Arc::new(Site::default().page("https://example.com/", &[("hello", 1)], &[]));

    let outcome = crawl(&site, "https://example.com/", 3, &["https://example\\.com/"]).await;

    assert_eq!(site.total_calls(), 0);
    assert!(outcome.word_counts.is_empty());
}

#[tokio::test]
async fn test_partial_ignore_pattern_does_not_suppress() {
    let site = Arc::new(Site::default().page("https://example.com/", &[("hello", 1)], &[]));

    let outcome = crawl(&site, "https://example.com/", 3, &["example", "https://example"]).await;

    assert_eq!(site.calls("https://example.com/"), 1);
    assert_eq!(outcome.word_counts["hello"], 1);
}

#[tokio::test]
async fn test_ignored_child_is_skipped() {
    let site = Arc::new(
        Site::default()
            .page(
                "https://example.com/",
                &[("hello", 1)],
                &["https://example.com/private/1", "https://example.com/public"],
            )
            .page("https://example.com/private/1", &[("secret", 1)], &[])
            .page("https://example.com/public", &[("open", 1)], &[]),
    );

    let outcome = crawl(&site, "https://example.com/", 3, &["https://example\\.com/private/.*"]).await;

    assert_eq!(site.calls("https://example.com/private/1"), 0);
    assert_eq!(outcome.word_counts["open"], 1);
    assert!(!outcome.word_counts.contains_key("secret"));
}

fn merge_site(latencies: [u64; 4]) -> Arc<Site> {
    let site = Site::default()
        .page(
            "https://m.test/",
            &[("shared", 1), ("root", 2)],
            &["https://m.test/1", "https://m.test/2", "https://m.test/3", "https://m.test/4"],
        )
        .page("https://m.test/1", &[("shared", 3), ("one", 1)], &["https://m.test/too-deep"])
        .page("https://m.test/2", &[("shared", 5)], &[])
        .page("https://m.test/3", &[("shared", 7), ("three", 4)], &[])
        .page("https://m.test/4", &[("four", 9)], &["https://m.test/2"])
        .page("https://m.test/too-deep", &[("shared", 1000)], &[]);

    let site = (1..=4).fold(site, |site, i| {
        site.latency(
            &format!("https://m.test/{}", i),
            Duration::from_millis(latencies[i - 1]),
        )
    });
    Arc::new(site)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_word_counts_sum_visited_pages_in_any_order() {
    let expected: HashMap<String, u64> = [
        ("shared", 1 + 3 + 5 + 7),
        ("root", 2),
        ("one", 1),
        ("three", 4),
        ("four", 9),
    ]
    .iter()
    .map(|(w, c)| (w.to_string(), *c))
    .collect();

    for latencies in [[0, 0, 0, 0], [40, 30, 20, 10], [10, 20, 30, 40], [25, 5, 35, 15]] {
        let site = merge_site(latencies);
        let outcome = crawl(&site, "https://m.test/", 2, &[]).await;

        assert_eq!(outcome.word_counts, expected, "latencies {:?}", latencies);
        assert_eq!(outcome.urls_visited, 5);
        assert_eq!(site.calls("https://m.test/too-deep"), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_branch_is_contained() {
    let site = Arc::new(
        Site::default()
            .page(
                "https://f.test/",
                &[("root", 1)],
                &["https://f.test/broken", "https://f.test/fine"],
            )
            .failing_page("https://f.test/broken")
            .page("https://f.test/fine", &[("fine", 1)], &["https://f.test/deeper"])
            .page("https://f.test/deeper", &[("deeper", 1)], &[]),
    );

    let outcome = crawl(&site, "https://f.test/", 3, &[]).await;

    assert_eq!(site.calls("https://f.test/broken"), 1);
    assert_eq!(outcome.word_counts["root"], 1);
    assert_eq!(outcome.word_counts["fine"], 1);
    assert_eq!(outcome.word_counts["deeper"], 1);
}

fn sitemap_page(url: &str, text: &str, links: &[&str]) -> PageEntry {
    PageEntry {
        url: url.to_string(),
        text: text.to_string(),
        links: links.iter().map(|l| l.to_string()).collect(),
        latency_ms: 0,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_profiled_crawl_over_sitemap() {
    let clock = fixed_clock();
    let profiler = Profiler::new(clock.clone());

    let sitemap = SitemapParserFactory::new(
        &[
            sitemap_page("https://s.test/", "the quick brown fox", &["https://s.test/2"]),
            sitemap_page("https://s.test/2", "the lazy dog", &[]),
        ],
        &PatternSet::compile(&["the".to_string()]).unwrap(),
    );
    let factory = ProfilingPageParserFactory::new(profiler.clone(), sitemap).unwrap();

    let config = CrawlerConfig {
        start_pages: vec!["https://s.test/".to_string()],
        max_depth: 5,
        timeout_seconds: 30,
        parallelism: 2,
        ignored_urls: vec![],
        ignored_words: vec![],
    };
    let coordinator = Coordinator::new(&config, Arc::new(factory), clock).unwrap();
    let crawler: ProfiledWebCrawler<Coordinator> = profiler.wrap(coordinator).unwrap();

    let outcome = crawler.crawl(&config.start_pages).await.unwrap();

    assert_eq!(outcome.urls_visited, 2);
    assert_eq!(outcome.word_counts["fox"], 1);
    assert!(!outcome.word_counts.contains_key("the"));

    let parse = profiler
        .state()
        .get(
            std::any::type_name::<sumi_census::parser::SitemapPageParser>(),
            "parse",
        )
        .unwrap();
    assert_eq!(parse.calls, 2);

    let crawl = profiler
        .state()
        .get(std::any::type_name::<Coordinator>(), "crawl")
        .unwrap();
    assert_eq!(crawl.calls, 1);
}

//! Profiled stand-ins for the crate's own capabilities

use crate::crawler::{CrawlOutcome, WebCrawler};
use crate::parser::{PageParser, PageParserFactory, ParseResult};
use crate::profiler::interceptor::{Instrumented, MethodSpec, ProfilingInterceptor};
use crate::profiler::Profiler;
use crate::{ConfigResult, Result};
use async_trait::async_trait;

/// [`WebCrawler`] stand-in; `crawl` is timed
pub struct ProfiledWebCrawler<C> {
    interceptor: ProfilingInterceptor<C>,
}

impl<C: WebCrawler> Instrumented<C> for ProfiledWebCrawler<C> {
    const CAPABILITY: &'static str = "WebCrawler";
    const METHODS: &'static [MethodSpec] = &[
        MethodSpec::profiled("crawl"),
        MethodSpec::passthrough("max_parallelism"),
    ];

    fn from_interceptor(interceptor: ProfilingInterceptor<C>) -> Self {
        Self { interceptor }
    }
}

#[async_trait]
impl<C: WebCrawler> WebCrawler for ProfiledWebCrawler<C> {
    async fn crawl(&self, start_pages: &[String]) -> Result<CrawlOutcome> {
        self.interceptor
            .invoke_async("crawl", |crawler| crawler.crawl(start_pages))
            .await?
    }

    fn max_parallelism(&self) -> usize {
        self.interceptor.delegate().max_parallelism()
    }
}

/// [`PageParser`] stand-in; `parse` is timed under the boxed parser's concrete type
pub struct ProfiledPageParser {
    interceptor: ProfilingInterceptor<Box<dyn PageParser>>,
}

impl Instrumented<Box<dyn PageParser>> for ProfiledPageParser {
    const CAPABILITY: &'static str = "PageParser";
    const METHODS: &'static [MethodSpec] = &[MethodSpec::profiled("parse")];

    fn delegate_type(delegate: &Box<dyn PageParser>) -> &'static str {
        delegate.type_name()
    }

    fn from_interceptor(interceptor: ProfilingInterceptor<Box<dyn PageParser>>) -> Self {
        Self { interceptor }
    }
}

#[async_trait]
impl PageParser for ProfiledPageParser {
    async fn parse(&self) -> Result<ParseResult> {
        self.interceptor
            .invoke_async("parse", |parser| parser.parse())
            .await?
    }

    fn type_name(&self) -> &'static str {
        self.interceptor.delegate_type()
    }
}

/// Factory decorator handing out profiled parsers
pub struct ProfilingPageParserFactory<F> {
    inner: F,
    profiler: Profiler,
}

impl<F: PageParserFactory> ProfilingPageParserFactory<F> {
    /// Wraps `inner`; fails if the parser capability has nothing to profile
    pub fn new(profiler: Profiler, inner: F) -> ConfigResult<Self> {
        Profiler::ensure_profiled::<ProfiledPageParser, Box<dyn PageParser>>()?;
        Ok(Self { inner, profiler })
    }
}

impl<F: PageParserFactory> PageParserFactory for ProfilingPageParserFactory<F> {
    fn get(&self, url: &str) -> Box<dyn PageParser> {
        let parser: ProfiledPageParser = self.profiler.instrument(self.inner.get(url));
        Box::new(parser)
    }
}

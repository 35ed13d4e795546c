//! Drives one level of rel-link scraping, feeding pages back into an
//! `IndexParser` (component C).

use crate::parser::IndexParser;
use mirror_core::http::Fetcher;

/// Visits every URL in `parser`'s crawl set exactly once, feeding successful
/// HTML responses back into `parser` with `scrape=false`. Non-200 responses
/// and non-HTML bodies are logged and dropped. Bounded by the initial crawl
/// set size: no URL discovered during the pass is itself crawled.
pub struct Crawler<'a> {
    fetcher: &'a Fetcher,
}

impl<'a> Crawler<'a> {
    pub fn new(fetcher: &'a Fetcher) -> Self {
        Self { fetcher }
    }

    /// Crawls every URL currently in `parser`'s crawl set.
    pub async fn crawl(&self, parser: &mut IndexParser) {
        let urls: Vec<String> = parser.crawl_urls().iter().cloned().collect();

        for url in urls {
            match self.fetcher.get(&url).await {
                Ok(response) if response.status == 200 && response.is_html() => {
                    if let Err(e) = parser.parse_index(&response.final_url, &response.body, false)
                    {
                        tracing::warn!(%url, error = %e, "failed to parse crawled page");
                    }
                }
                Ok(response) => {
                    tracing::debug!(
                        %url,
                        status = response.status,
                        content_type = ?response.content_type,
                        "dropping non-HTML or non-200 crawl response"
                    );
                }
                Err(e) => {
                    tracing::warn!(%url, error = %e, "crawl hop failed");
                }
            }
        }
    }
}

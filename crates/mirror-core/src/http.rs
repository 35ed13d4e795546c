//! Minimal HTTP fetch helper shared by the crawler and the simple-index
//! fetch path in `Stage`.
//!
//! Unlike the teacher's `HttpCache`, freshness here is governed by upstream
//! serial numbers (`X-PYPI-LAST-SERIAL`), not ETag/Last-Modified validators,
//! so this module does not cache responses — it just follows redirects and
//! hands back the body plus the headers the mirror cares about.

use crate::error::{CoreError, Result};
use reqwest::Client;
use std::time::Duration;

/// User-Agent sent with every outgoing request.
pub fn user_agent() -> String {
    format!("mirror-core/{}", env!("CARGO_PKG_VERSION"))
}

/// The body and headers of a single fetched page.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub final_url: String,
    pub content_type: Option<String>,
    pub pypi_last_serial: Option<u64>,
    pub devpi_serial: Option<u64>,
    pub body: String,
}

impl FetchResponse {
    /// `true` when the response's content-type indicates an HTML document,
    /// matching the `content-type.startswith("text/html")` check the
    /// original crawler performs before handing a page to the parser.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/html"))
    }
}

/// Follows redirects, fetches a page, and extracts the headers the mirror
/// needs to decide freshness.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with a 30-second timeout and redirect-following
    /// enabled (`reqwest`'s default policy).
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(user_agent())
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create HTTP client");

        Self { client }
    }

    /// Fetches `url`, following redirects, returning the final URL reached
    /// along with the response body and the headers this mirror inspects.
    pub async fn get(&self, url: &str) -> Result<FetchResponse> {
        tracing::debug!("fetching: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::transport(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let pypi_last_serial = response
            .headers()
            .get("X-PYPI-LAST-SERIAL")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let devpi_serial = response
            .headers()
            .get("X-DEVPI-SERIAL")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let body = response
            .text()
            .await
            .map_err(|e| CoreError::transport(url, e))?;

        Ok(FetchResponse {
            status,
            final_url,
            content_type,
            pypi_last_serial,
            devpi_serial,
            body,
        })
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_contains_crate_name() {
        assert!(user_agent().starts_with("mirror-core/"));
    }

    #[test]
    fn test_is_html_true() {
        let resp = FetchResponse {
            status: 200,
            final_url: "https://example.com/simple/foo/".into(),
            content_type: Some("text/html; charset=utf-8".into()),
            pypi_last_serial: None,
            devpi_serial: None,
            body: String::new(),
        };
        assert!(resp.is_html());
    }

    #[test]
    fn test_is_html_false_for_missing_content_type() {
        let resp = FetchResponse {
            status: 200,
            final_url: "https://example.com/foo.tar.gz".into(),
            content_type: None,
            pypi_last_serial: None,
            devpi_serial: None,
            body: String::new(),
        };
        assert!(!resp.is_html());
    }

    #[tokio::test]
    async fn test_get_extracts_last_serial_header() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/simple/foo/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_header("X-PYPI-LAST-SERIAL", "42")
            .with_body("<html></html>")
            .create_async()
            .await;

        let fetcher = Fetcher::new();
        let url = format!("{}/simple/foo/", server.url());
        let resp = fetcher.get(&url).await.unwrap();

        assert_eq!(resp.status, 200);
        assert!(resp.is_html());
        assert_eq!(resp.pypi_last_serial, Some(42));
    }

    #[tokio::test]
    async fn test_get_non_html_content_type() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/foo-1.0.tar.gz")
            .with_status(200)
            .with_header("content-type", "application/octet-stream")
            .with_body("binary")
            .create_async()
            .await;

        let fetcher = Fetcher::new();
        let url = format!("{}/foo-1.0.tar.gz", server.url());
        let resp = fetcher.get(&url).await.unwrap();

        assert!(!resp.is_html());
    }
}

// src/fetch/mod.rs
// =============================================================================
// This module is the only place that talks to the network.
//
// The rest of the crawler only sees the Fetcher trait:
//   fetch(url)      -> FetchResponse | FetchError   (images)
//   fetch_page(url) -> FetchResponse | FetchError   (HTML pages)
//
// The real implementation (http.rs) wraps a reqwest::Client. Tests plug in
// an in-memory fetcher instead, so crawl logic can be tested offline.
//
// Rust concepts:
// - Traits: an interface the crawler is generic over
// - async-trait: lets a trait method be async
// - thiserror: derive Display/Error for our error enum
// =============================================================================

mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpFetcher;

/// Everything the crawler needs from one HTTP response.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    pub status: u16,
    /// Lowercased Content-Type header, "" when missing.
    pub content_type: String,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_error_status(&self) -> bool {
        self.status >= 400
    }

    // Pages without a content type are given the benefit of the doubt
    pub fn is_html(&self) -> bool {
        self.content_type.is_empty()
            || self.content_type.contains("text/html")
            || self.content_type.contains("application/xhtml+xml")
    }

    pub fn is_image(&self) -> bool {
        self.content_type.contains("image")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Why a request never produced a response.
///
/// None of these are fatal: a failed page is skipped, a failed image
/// variant makes us try the next one.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;

    /// Fetches a page that is about to be parsed.
    ///
    /// Implementations may skip the body when the status or content type
    /// already rules the page out, and may cap how much of it is read.
    async fn fetch_page(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.fetch(url).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_detection() {
        let mut response = FetchResponse::default();
        assert!(response.is_html());
        response.content_type = "application/xhtml+xml".to_string();
        assert!(response.is_html());
        response.content_type = "application/json".to_string();
        assert!(!response.is_html());
    }

    #[test]
    fn test_error_status() {
        let response = FetchResponse {
            status: 404,
            ..Default::default()
        };
        assert!(response.is_error_status());
        assert!(!FetchResponse { status: 302, ..Default::default() }.is_error_status());
    }
}

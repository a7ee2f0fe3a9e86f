// src/fetch/http.rs
// =============================================================================
// The real Fetcher, backed by reqwest.
//
// One Client is built up front and reused for every page and image, so we
// get connection pooling for free. The client carries:
// - the per-request timeout
// - the User-Agent (many forums block the default reqwest one)
// - an optional Cookie header for archives behind a login
//
// Pages are read more carefully than images: the status and Content-Type
// are checked before the body is downloaded, and at most MAX_PAGE_BYTES
// of HTML is kept. A content link pointing at a 2 GB zip never gets
// buffered just to be thrown away.
//
// Rust concepts:
// - Builder pattern: Client::builder()...build()
// - Error mapping: reqwest::Error -> our own FetchError
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::{Client, Response};
use tracing::debug;

use super::{FetchError, FetchResponse, Fetcher};
use crate::config::CrawlConfig;

/// Upper bound on the HTML we keep from one page.
pub const MAX_PAGE_BYTES: usize = 8 * 1024 * 1024;

pub struct HttpFetcher {
    client: Client,
    max_page_bytes: usize,
}

impl HttpFetcher {
    // Builds the shared client from the crawl settings
    //
    // Fails only if the cookie contains characters that aren't allowed in a
    // header, or the TLS backend can't be initialized.
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.cookie {
            let value = HeaderValue::from_str(cookie).context("Cookie is not a valid header value")?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_page_bytes: MAX_PAGE_BYTES,
        })
    }

    // Sends the request and returns the response with its status and
    // Content-Type already pulled out (body still empty)
    async fn start(&self, url: &str) -> Result<(Response, FetchResponse), FetchError> {
        let response = self.client.get(url).send().await.map_err(categorize_error)?;

        let head = FetchResponse {
            status: response.status().as_u16(),
            content_type: response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_ascii_lowercase(),
            body: Vec::new(),
        };
        Ok((response, head))
    }
}

// Reads the body chunk by chunk, stopping once `limit` bytes are in
async fn read_capped(mut response: Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(body_error)? {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            debug!(limit, "page body truncated");
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let (response, mut head) = self.start(url).await?;
        head.body = response.bytes().await.map_err(body_error)?.to_vec();
        Ok(head)
    }

    async fn fetch_page(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let (response, mut head) = self.start(url).await?;
        if head.is_error_status() || !head.is_html() {
            // The crawler will skip this page; dropping the response
            // closes the connection without reading the body
            return Ok(head);
        }
        head.body = read_capped(response, self.max_page_bytes).await?;
        Ok(head)
    }
}

// Maps reqwest's error into the categories we log
//
// The URL is stripped from the message: it may carry session tokens.
fn categorize_error(error: reqwest::Error) -> FetchError {
    let error = error.without_url();
    let error_string = error.to_string();

    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_redirect() {
        FetchError::TooManyRedirects
    } else if error.is_connect() {
        FetchError::Connect(error_string)
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        FetchError::Tls(error_string)
    } else {
        FetchError::Other(error_string)
    }
}

fn body_error(error: reqwest::Error) -> FetchError {
    FetchError::Body(error.without_url().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Serves one canned HTTP response on a local port and returns its URL
    async fn serve_once(content_type: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                content_type,
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}/page?sid=secret", addr)
    }

    fn fetcher() -> HttpFetcher {
        let config = CrawlConfig::for_tests(vec!["http://127.0.0.1/".to_string()]);
        HttpFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_page_body_is_skipped_for_non_html() {
        let url = serve_once("application/zip", vec![0; 4096]).await;
        let response = fetcher().fetch_page(&url).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "application/zip");
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_page_body_is_capped() {
        let url = serve_once("text/html", vec![b'a'; 10_000]).await;
        let mut fetcher = fetcher();
        fetcher.max_page_bytes = 1000;
        let response = fetcher.fetch_page(&url).await.unwrap();
        assert_eq!(response.body.len(), 1000);
    }

    #[tokio::test]
    async fn test_images_are_read_in_full() {
        let url = serve_once("image/png", vec![7; 5000]).await;
        let response = fetcher().fetch(&url).await.unwrap();
        assert!(response.is_image());
        assert_eq!(response.body.len(), 5000);
    }

    #[test]
    fn test_client_builds_with_cookie() {
        let mut config = CrawlConfig::for_tests(vec!["https://example.com/".to_string()]);
        config.cookie = Some("session=abc; theme=dark".to_string());
        assert!(HttpFetcher::new(&config).is_ok());
    }

    #[test]
    fn test_invalid_cookie_is_rejected() {
        let mut config = CrawlConfig::for_tests(vec!["https://example.com/".to_string()]);
        config.cookie = Some("bad\nvalue".to_string());
        assert!(HttpFetcher::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_transport_errors_leave_the_url_out() {
        let config = CrawlConfig::for_tests(vec!["http://127.0.0.1:9/".to_string()]);
        let fetcher = HttpFetcher::new(&config).unwrap();
        let error = fetcher
            .fetch("http://127.0.0.1:9/?sid=secret")
            .await
            .unwrap_err();
        assert!(!error.to_string().contains("secret"), "{error}");
    }
}

//! HTTP page fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with browser-like headers and a request timeout
//! - Building listing URLs for the ranking and popular endpoints
//! - Classifying transport, HTTP and API failures into `FetchError`
//!
//! A fetcher never retries and keeps no memory of earlier pages; retry and
//! paging decisions belong to the engine.

use crate::config::ApiConfig;
use crate::content::{parse_page, FetchError, Page, RejectCode};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Upper bound on the TCP connect phase, independent of the request timeout
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of listing pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one page
    ///
    /// # Arguments
    ///
    /// * `page_index` - 1-based page number
    /// * `page_size` - Entries requested per page
    async fn fetch(&self, page_index: u32, page_size: u32) -> Result<Page, FetchError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for std::sync::Arc<T> {
    async fn fetch(&self, page_index: u32, page_size: u32) -> Result<Page, FetchError> {
        (**self).fetch(page_index, page_size).await
    }
}

/// Which remote listing a fetcher reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Ranking of one category; the listing is a single page
    Ranking { category_id: u32 },

    /// Paginated popular feed
    Popular,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The API configuration (user agent, referer)
/// * `timeout` - Whole-request timeout
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use vidsift::config::ApiConfig;
/// use vidsift::crawler::build_http_client;
///
/// let client = build_http_client(&ApiConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(config: &ApiConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    match HeaderValue::from_str(&config.referer) {
        Ok(referer) => {
            headers.insert(REFERER, referer);
        }
        Err(_) => tracing::warn!("Ignoring invalid referer header: {}", config.referer),
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches listing pages over HTTP
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    listing_url: Url,
    endpoint: Endpoint,
}

impl HttpPageFetcher {
    /// Creates a fetcher for `endpoint` on the configured API host
    pub fn new(client: Client, config: &ApiConfig, endpoint: Endpoint) -> Result<Self, url::ParseError> {
        let path = match endpoint {
            Endpoint::Ranking { .. } => &config.ranking_path,
            Endpoint::Popular => &config.popular_path,
        };
        let listing_url = Url::parse(&config.base_url)?.join(path)?;

        Ok(Self {
            client,
            listing_url,
            endpoint,
        })
    }

    /// Builds the request URL for one page
    pub fn page_url(&self, page_index: u32, page_size: u32) -> Url {
        let mut url = self.listing_url.clone();
        match self.endpoint {
            Endpoint::Ranking { category_id } => {
                url.query_pairs_mut()
                    .append_pair("rid", &category_id.to_string())
                    .append_pair("type", "all");
            }
            Endpoint::Popular => {
                url.query_pairs_mut()
                    .append_pair("ps", &page_size.to_string())
                    .append_pair("pn", &page_index.to_string());
            }
        }
        url
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, page_index: u32, page_size: u32) -> Result<Page, FetchError> {
        let url = self.page_url(page_index, page_size);
        tracing::debug!("Requesting {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerRejected(RejectCode::Http(status.as_u16())));
        }

        let body = response.text().await.map_err(classify_transport_error)?;
        parse_page(&body)
    }
}

fn classify_transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Transport("request timeout".to_string())
    } else if e.is_connect() {
        FetchError::Transport(format!("connection failed: {}", e))
    } else {
        FetchError::Transport(e.to_string())
    }
}

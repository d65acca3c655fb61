//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made for a work item:
//! - Building the HTTP client with the configured user agent and timeout
//! - Querying the search endpoint and locating the profile link
//! - Fetching profile pages
//!
//! Redirects are followed by the client; the final URL is reported back so
//! the block detector can see where the site actually sent us.

use crate::config::TargetConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// Errors that can occur while fetching content
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),
}

/// Fails with `FetchError::Status` unless `status` is 2xx
fn ensure_success(status: u16) -> Result<(), FetchError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(FetchError::Status(status))
    }
}

/// Where a key's search led
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Final URL after redirects
    pub landed_at: String,
    /// HTTP status of the final response
    pub status: u16,
    /// Absolute URL of the record's profile page, if one was listed
    pub target: Option<String>,
}

impl Located {
    /// Errors if the search page was not served successfully
    pub fn error_for_status(&self) -> Result<(), FetchError> {
        ensure_success(self.status)
    }
}

/// A fetched profile page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Page body content
    pub body: String,
}

impl FetchedPage {
    /// Errors if the page was not served successfully
    ///
    /// Checked after block detection, so blocked statuses are seen first.
    pub fn error_for_status(&self) -> Result<(), FetchError> {
        ensure_success(self.status)
    }
}

/// Source of raw content for work items
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Resolves `key` to the location of its content
    async fn locate(&self, key: &str) -> Result<Located, FetchError>;

    /// Fetches the content at `location`
    async fn fetch(&self, location: &str) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The target configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &TargetConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `ContentFetcher` backed by the target site's search endpoint
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    search_url: Url,
    search_param: String,
    link_selector: String,
}

impl HttpFetcher {
    /// Creates a fetcher from the target configuration
    pub fn new(config: &TargetConfig) -> Result<Self, FetchError> {
        let search_url = Url::parse(&config.search_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.search_url, e)))?;
        Selector::parse(&config.profile_link_selector).map_err(|e| {
            FetchError::InvalidSelector(format!("{}: {:?}", config.profile_link_selector, e))
        })?;

        Ok(Self {
            client: build_http_client(config)?,
            search_url,
            search_param: config.search_param.clone(),
            link_selector: config.profile_link_selector.clone(),
        })
    }

    /// Search URL for `key`
    pub fn search_url_for(&self, key: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut().append_pair(&self.search_param, key);
        url
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn locate(&self, key: &str) -> Result<Located, FetchError> {
        let url = self.search_url_for(key);
        tracing::debug!("Searching {}", url);

        let response = self.client.get(url).send().await?;
        let landed_at = response.url().clone();
        let status = response.status().as_u16();
        let body = response.text().await?;

        let target = first_link(&body, &landed_at, &self.link_selector)?;
        tracing::debug!(
            "Search for {} landed at {} ({}), profile: {:?}",
            key,
            landed_at,
            status,
            target
        );

        Ok(Located {
            landed_at: landed_at.to_string(),
            status,
            target,
        })
    }

    async fn fetch(&self, location: &str) -> Result<FetchedPage, FetchError> {
        let url =
            Url::parse(location).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", location, e)))?;
        tracing::debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(FetchedPage {
            final_url,
            status,
            body,
        })
    }
}

/// Returns the first element matching `selector` with an `href`, resolved
/// against `base`
fn first_link(html: &str, base: &Url, selector: &str) -> Result<Option<String>, FetchError> {
    let selector = Selector::parse(selector)
        .map_err(|e| FetchError::InvalidSelector(format!("{}: {:?}", selector, e)))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .find_map(|href| resolve_link(href, base)))
}

/// Resolves an href to an absolute HTTP(S) URL
///
/// Returns None for empty hrefs, fragment-only anchors, non-HTTP schemes
/// and anything that does not parse.
fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let absolute = base.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}

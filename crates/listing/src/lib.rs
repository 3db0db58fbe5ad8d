//! Thin client for the paginated video-listing API.
//!
//! The listing service is an external collaborator; this crate only maps its
//! wire format onto [`VideoSelection`] values and reports failures so the UI
//! can show a dismissable retry message without dropping loaded items.

use std::fmt::{Display, Formatter};

use player::VideoSelection;
use serde::Deserialize;
use tracing::{debug, warn};

/// Result type used by the listing crate.
pub type Result<T> = std::result::Result<T, ListingError>;

/// Errors produced while fetching one listing page.
#[derive(Debug)]
pub enum ListingError {
    Request(reqwest::Error),
    Status { status: u16, url: String },
    Decode(reqwest::Error),
}

impl Display for ListingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(source) => write!(f, "listing request failed ({source})"),
            Self::Status { status, url } => {
                write!(f, "listing responded with status {status} at {url}")
            }
            Self::Decode(source) => write!(f, "listing payload is not decodable ({source})"),
        }
    }
}

impl std::error::Error for ListingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(source) | Self::Decode(source) => Some(source),
            Self::Status { .. } => None,
        }
    }
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VideoPage {
    pub items: Vec<VideoSelection>,
    pub pagination: Pagination,
}

/// Pagination envelope as the service reports it (camelCase on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

/// HTTP client for `GET {base}/data?page=<n>&limit=<m>`.
#[derive(Debug, Clone)]
pub struct ListingClient {
    base_url: String,
    http: reqwest::Client,
}

impl ListingClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Fetches one page. Callers treat any error as "no more data" while
    /// keeping already-loaded items.
    pub async fn fetch_page(&self, page: u32, limit: u32) -> Result<VideoPage> {
        let url = page_url(&self.base_url, page, limit);
        debug!(url, "fetching listing page");

        let response = self.http.get(&url).send().await.map_err(|error| {
            warn!(url, %error, "listing request failed");
            ListingError::Request(error)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "listing returned error status");
            return Err(ListingError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response.json::<VideoPage>().await.map_err(ListingError::Decode)
    }
}

fn page_url(base_url: &str, page: u32, limit: u32) -> String {
    format!(
        "{}/data?page={page}&limit={limit}",
        base_url.trim_end_matches('/')
    )
}

//! External collaborators for mapscout.
//!
//! # Architecture
//!
//! The session engine talks to two opaque services through traits defined here:
//!
//! - [`SearchCollaborator`] - given a query and optional coordinates, returns places
//!   plus an analysis paragraph. [`gemini::GeminiSearch`] implements it with the
//!   Gemini `generateContent` API and Google Maps grounding.
//! - [`LocationSource`] - one-shot coordinate lookup. Implemented by
//!   [`location::IpLocation`], [`location::FixedLocation`] and
//!   [`location::NoLocation`].
//!
//! # Error Handling
//!
//! Failures are returned as [`SearchError`] / [`LocationError`]. Neither type
//! is retried by this crate: one call, one outcome.

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;

pub use mapscout_types;
use mapscout_types::{GeoLocation, GeoLocationError, SearchQuery, SearchResponse};

pub mod gemini;
pub mod location;
mod wire;

/// Canonical Gemini API base URL.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const CONNECT_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Shared hardened HTTP client (HTTPS only, no redirects).
///
/// Only connection establishment is bounded; an established request may take
/// as long as the service needs.
pub fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        base_client_builder().build().unwrap_or_else(|e| {
            tracing::error!("Failed to build hardened HTTP client: {e}. Using defaults.");
            reqwest::Client::new()
        })
    })
}

fn base_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .https_only(true)
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .user_agent(concat!("mapscout/", env!("CARGO_PKG_VERSION")))
}

pub(crate) async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Input to a search: the trimmed query plus whatever location is known at dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: SearchQuery,
    pub location: Option<GeoLocation>,
    /// Free-text area such as "Austin, TX", sent alongside the query.
    pub area_hint: Option<String>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: SearchQuery) -> Self {
        Self {
            query,
            location: None,
            area_hint: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: Option<GeoLocation>) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_area_hint(mut self, area: Option<String>) -> Self {
        self.area_hint = area.filter(|a| !a.trim().is_empty());
        self
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: Option<u16>, message: String },
    #[error("{0}")]
    Blocked(String),
    #[error("Malformed response from search service: {0}")]
    Decode(String),
    /// A failure that carries no description.
    #[error("search failed")]
    Unspecified,
}

impl SearchError {
    /// Human-readable description, or `None` when the failure carries none.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            SearchError::Unspecified => None,
            SearchError::Api { message, .. } if message.trim().is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

/// Search/analysis service: query in, places and analysis out.
pub trait SearchCollaborator: Send + Sync {
    fn search(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = Result<SearchResponse, SearchError>> + Send;
}

impl<T: SearchCollaborator> SearchCollaborator for Arc<T> {
    fn search(
        &self,
        request: SearchRequest,
    ) -> impl Future<Output = Result<SearchResponse, SearchError>> + Send {
        (**self).search(request)
    }
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location lookup disabled")]
    Disabled,
    #[error("location request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("location service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("location service response missing coordinates")]
    MissingCoordinates,
    #[error(transparent)]
    Invalid(#[from] GeoLocationError),
}

/// One-shot coordinate source consulted once at session start.
pub trait LocationSource: Send + Sync {
    fn locate(&self) -> impl Future<Output = Result<GeoLocation, LocationError>> + Send;
}

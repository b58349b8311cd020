//! Place records and coordinates exchanged with the search collaborator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single business/location record returned by a search.
///
/// Immutable once received. Field order matches the export format:
/// `title`, `uri`, `summary`, `reviewSnippets`. Absent optionals are omitted
/// when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub title: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_snippets: Option<Vec<String>>,
}

impl Place {
    #[must_use]
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
            summary: None,
            review_snippets: None,
        }
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn with_review_snippets(mut self, snippets: Vec<String>) -> Self {
        self.review_snippets = Some(snippets);
        self
    }

    /// Review snippets in display order, empty when none were returned.
    #[must_use]
    pub fn reviews(&self) -> &[String] {
        self.review_snippets.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GeoLocationError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// Device or configured coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoLocation {
    latitude: f64,
    longitude: f64,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoLocationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoLocationError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoLocationError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Successful collaborator output: places in relevance order plus analysis text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    pub places: Vec<Place>,
    pub analysis: String,
}

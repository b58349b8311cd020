//! Coordinate sources for the startup geolocation attempt.

use serde::Deserialize;

use mapscout_types::GeoLocation;

use crate::{LocationError, LocationSource, http_client, read_capped_error_body};

/// Default IP geolocation endpoint; returns `latitude`/`longitude` JSON.
pub const DEFAULT_IP_LOOKUP_URL: &str = "https://ipapi.co/json/";

/// Coordinates known up front (config file or CLI flags).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub GeoLocation);

impl LocationSource for FixedLocation {
    async fn locate(&self) -> Result<GeoLocation, LocationError> {
        Ok(self.0)
    }
}

/// Location disabled; always fails with [`LocationError::Disabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl LocationSource for NoLocation {
    async fn locate(&self) -> Result<GeoLocation, LocationError> {
        Err(LocationError::Disabled)
    }
}

/// Approximate coordinates from the caller's public IP address.
#[derive(Debug, Clone)]
pub struct IpLocation {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(alias = "lat")]
    latitude: Option<f64>,
    #[serde(alias = "lon")]
    longitude: Option<f64>,
}

impl IpLocation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: http_client().clone(),
            url: DEFAULT_IP_LOOKUP_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_endpoint(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl Default for IpLocation {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationSource for IpLocation {
    async fn locate(&self) -> Result<GeoLocation, LocationError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            return Err(LocationError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: IpLookupResponse = response.json().await?;
        match (parsed.latitude, parsed.longitude) {
            (Some(lat), Some(lon)) => Ok(GeoLocation::new(lat, lon)?),
            _ => Err(LocationError::MissingCoordinates),
        }
    }
}

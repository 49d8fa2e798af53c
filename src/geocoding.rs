//! Forward geocoding: free-text address to coordinates.
//!
//! The response types mirror the Google Geocoding API JSON. Only the fields the
//! map needs are decoded; everything else in the payload is ignored.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::GEOCODE_TIMEOUT_SECS;
use crate::geo::LatLng;

pub const STATUS_OK: &str = "OK";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocoderResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocoderResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocoderResult {
    pub geometry: Geometry,
    pub formatted_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

impl GeocoderResponse {
    /// First result of an `OK` response, or the service's own error otherwise.
    pub fn into_first_result(self) -> Result<GeocoderResult, GeocodeError> {
        if self.status == STATUS_OK {
            if let Some(first) = self.results.into_iter().next() {
                return Ok(first);
            }
        }
        let message = self.error_message.unwrap_or_else(|| self.status.clone());
        Err(GeocodeError::SemanticFailure {
            status: self.status,
            message,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    #[error("Address is empty")]
    InvalidInput,

    #[error("A geocoding request is already in progress")]
    ConcurrentRequestRejected,

    #[error("Geocoder returned {status}: {message}")]
    SemanticFailure { status: String, message: String },

    #[error("Geocoding transport error: {0}")]
    TransportFailure(String),
}

/// The external geocoding service.
///
/// `Ok` carries whatever the service answered, including non-`OK` statuses;
/// `Err(TransportFailure)` is reserved for network and HTTP level problems.
pub trait Geocoder: Send + Sync {
    fn geocode(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<GeocoderResponse, GeocodeError>> + Send;
}

/// Geocoder backed by the Google Geocoding HTTP API.
#[derive(Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(GEOCODE_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                GeocodeError::TransportFailure(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocoderResponse, GeocodeError> {
        debug!(address = address, "Geocoding request starting");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, is_timeout = e.is_timeout(), "Geocoding request failed");
                GeocodeError::TransportFailure(format!("Request failed: {}", e))
            })?;

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "Geocoder HTTP error status");
            return Err(GeocodeError::TransportFailure(format!(
                "HTTP {} from geocoder",
                response.status()
            )));
        }

        let body: GeocoderResponse = response.json().await.map_err(|e| {
            GeocodeError::TransportFailure(format!("Invalid geocoder response: {}", e))
        })?;

        debug!(status = %body.status, results = body.results.len(), "Geocoding response received");
        Ok(body)
    }
}

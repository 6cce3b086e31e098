// Geocoding service - turns one address into one GeocodeOutcome.
//
// The service knows nothing about HTTP or rate limits. It talks to a
// `GeocodingProvider`, and whatever the provider does (succeed, find nothing,
// blow up) ends as a value the batch can write back.

use super::geocoding_models::{GeocodeOutcome, SearchResponse};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoder request failed: {0}")]
    Transport(String),

    #[error("Geocoder returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not decode geocoder response: {0}")]
    Decode(String),
}

/// The one call the service needs from a geocoding backend.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Free-text search for `address`.
    async fn search(&self, address: &str) -> Result<SearchResponse, GeocodeError>;
}

pub struct AddressGeocoder<P: GeocodingProvider> {
    provider: P,
}

impl<P: GeocodingProvider> AddressGeocoder<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Geocode a single address. Never fails: errors are logged and folded into
    /// `GeocodeOutcome::Failed` so one bad address can't sink its batch.
    pub async fn geocode(&self, address: &str) -> GeocodeOutcome {
        // Blank cells never reach the provider.
        if address.trim().is_empty() {
            tracing::debug!("Blank address, nothing to look up");
            return GeocodeOutcome::NoMatch;
        }

        let response = match self.provider.search(address).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(address, error = %e, "Geocoding request failed");
                return GeocodeOutcome::Failed(e.to_string());
            }
        };

        match response.first_coordinates() {
            Ok(Some(coordinates)) => GeocodeOutcome::Matched(coordinates),
            Ok(None) => {
                tracing::debug!(address, "No geocoding candidates");
                GeocodeOutcome::NoMatch
            }
            Err(reason) => {
                tracing::warn!(address, %reason, "Unusable geocoding response");
                GeocodeOutcome::Failed(reason)
            }
        }
    }
}

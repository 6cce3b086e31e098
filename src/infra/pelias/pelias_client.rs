// Pelias search client.
//
// `GET {base}/v1/search?text=<address>` answers with a GeoJSON
// FeatureCollection; the core only cares about `features[].geometry`.
// See https://github.com/pelias/documentation/blob/master/search.md

use crate::core::geocoding::{GeocodeError, GeocodingProvider, SearchResponse};
use crate::infra::http::{FetchError, RateLimitedFetcher};
use async_trait::async_trait;

pub const DEFAULT_BASE_URL: &str = "http://pelias.mapc.org";

pub struct PeliasClient {
    fetcher: RateLimitedFetcher,
    search_url: String,
}

impl PeliasClient {
    pub fn new(fetcher: RateLimitedFetcher, base_url: &str) -> Self {
        Self {
            fetcher,
            search_url: search_url(base_url),
        }
    }
}

fn search_url(base_url: &str) -> String {
    format!("{}/v1/search", base_url.trim_end_matches('/'))
}

impl From<FetchError> for GeocodeError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status { status, body } => GeocodeError::Status { status, body },
            FetchError::Transport(e) if e.is_decode() => GeocodeError::Decode(e.to_string()),
            FetchError::Transport(e) => GeocodeError::Transport(e.to_string()),
        }
    }
}

#[async_trait]
impl GeocodingProvider for PeliasClient {
    async fn search(&self, address: &str) -> Result<SearchResponse, GeocodeError> {
        tracing::debug!(address, "Pelias search");
        Ok(self
            .fetcher
            .get_json(&self.search_url, &[("text", address)])
            .await?)
    }
}

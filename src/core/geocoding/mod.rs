pub mod geocoding_models;
pub mod geocoding_service;

pub use geocoding_models::{GeocodeOutcome, SearchResponse};
pub use geocoding_service::{AddressGeocoder, GeocodeError, GeocodingProvider};

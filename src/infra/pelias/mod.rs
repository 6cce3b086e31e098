#[path = "pelias_client.rs"]
pub mod pelias_client;

pub use pelias_client::{PeliasClient, DEFAULT_BASE_URL};

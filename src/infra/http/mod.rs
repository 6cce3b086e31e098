// Outbound HTTP plumbing.
// - `rate_limiter.rs` keeps request starts under a per-second ceiling.
// - `rate_limited_fetcher.rs` puts a reqwest client behind that limiter.

#[path = "rate_limiter.rs"]
pub mod rate_limiter;

#[path = "rate_limited_fetcher.rs"]
pub mod rate_limited_fetcher;

pub use rate_limited_fetcher::{FetchError, RateLimitedFetcher};

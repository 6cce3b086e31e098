// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "auth/mod.rs"]
pub mod auth;

#[path = "geocoding/mod.rs"]
pub mod geocoding;

#[path = "sheets/mod.rs"]
pub mod sheets;

#[path = "batch/mod.rs"]
pub mod batch;

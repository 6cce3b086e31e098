// Google credentials.
// - `service_account.rs` signs JWTs with a service account key (headless).
// - `installed_app.rs` runs the user OAuth flow and keeps `token.json` fresh.
// - `token_store.rs` reads and writes that token file.

#[path = "installed_app.rs"]
pub mod installed_app;

#[path = "service_account.rs"]
pub mod service_account;

#[path = "token_store.rs"]
pub mod token_store;

pub use installed_app::InstalledAppAuth;
pub use service_account::ServiceAccountAuth;

use crate::core::auth::{AuthError, CredentialProvider};

const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
const DEFAULT_TOKEN_PATH: &str = "token.json";

/// Pick a credential provider from the environment.
///
/// A service account key (`GOOGLE_SERVICE_ACCOUNT_KEY` path, then
/// `GOOGLE_SERVICE_ACCOUNT_JSON` content) wins. Otherwise the installed-app
/// flow is used with `GOOGLE_CREDENTIALS_PATH` and `GOOGLE_TOKEN_PATH`.
pub async fn provider_from_env() -> Result<Box<dyn CredentialProvider>, AuthError> {
    if let Ok(path) = std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY") {
        tracing::info!("Authenticating with service account key {}", path);
        return Ok(Box::new(ServiceAccountAuth::from_file(&path).await?));
    }

    if let Ok(json) = std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
        tracing::info!("Authenticating with inline service account key");
        return Ok(Box::new(ServiceAccountAuth::from_json(&json)?));
    }

    let credentials_path = std::env::var("GOOGLE_CREDENTIALS_PATH")
        .unwrap_or_else(|_| DEFAULT_CREDENTIALS_PATH.to_string());
    let token_path =
        std::env::var("GOOGLE_TOKEN_PATH").unwrap_or_else(|_| DEFAULT_TOKEN_PATH.to_string());

    tracing::info!("Authenticating with OAuth client {}", credentials_path);
    Ok(Box::new(
        InstalledAppAuth::from_files(&credentials_path, &token_path).await?,
    ))
}

use async_trait::async_trait;
use thiserror::Error;

/// OAuth scope for reading and writing spreadsheet values.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Could not read credentials: {0}")]
    Credentials(String),

    #[error("Token store error: {0}")]
    Store(String),

    #[error("Token exchange failed: {0}")]
    Exchange(String),

    #[error("Authorization was not completed: {0}")]
    Authorization(String),
}

/// Supplies bearer tokens for Google API calls.
///
/// Implementations own their token lifecycle (load, refresh, persist), so the
/// rest of the program only ever asks for a currently valid token.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

#[async_trait]
impl CredentialProvider for Box<dyn CredentialProvider> {
    async fn access_token(&self) -> Result<String, AuthError> {
        (**self).access_token().await
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::core::auth::AuthError;

/// OAuth token as persisted between runs.
///
/// Field names follow the `token.json` layout Google's client libraries write,
/// so an existing token file keeps working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Expiry as Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

impl StoredToken {
    /// Usable for at least another minute at `now_ms`. Tokens without an
    /// expiry are trusted until the API says otherwise.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        match self.expiry_date {
            Some(expiry) => expiry - 60_000 > now_ms,
            None => true,
        }
    }
}

/// JSON file holding the token between runs.
pub struct TokenFileStore {
    path: PathBuf,
}

impl TokenFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no token has been stored yet.
    pub async fn load(&self) -> Result<Option<StoredToken>, AuthError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&self.path)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        let token = serde_json::from_str(&text).map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(Some(token))
    }

    pub async fn persist(&self, token: &StoredToken) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthError::Store(e.to_string()))?;
        }

        let text =
            serde_json::to_string_pretty(token).map_err(|e| AuthError::Store(e.to_string()))?;
        fs::write(&self.path, text)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }
}

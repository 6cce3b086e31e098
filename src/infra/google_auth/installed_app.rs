// =============================================================================
// OAUTH 2.0 INSTALLED-APP FLOW
// =============================================================================
//
// For running as a regular Google user rather than a service account.
//
// **First run:**
// 1. Download the OAuth client JSON ("Desktop app") from Google Cloud Console
//    and save it as `credentials.json` (or point GOOGLE_CREDENTIALS_PATH at it).
// 2. Start the program. It prints an authorization URL.
// 3. Open the URL, approve access, paste the code back into the terminal.
// 4. The token (including the refresh token) is written to `token.json`.
//
// **Later runs:** the stored token is loaded and refreshed when it expires, so
// no interaction is needed as long as the refresh token stays valid.

use chrono::Utc;
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;

use super::token_store::{StoredToken, TokenFileStore};
use crate::core::auth::{AuthError, CredentialProvider, SHEETS_SCOPE};
use async_trait::async_trait;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Out-of-band redirect for clients that don't list one.
const FALLBACK_REDIRECT: &str = "urn:ietf:wg:oauth:2.0:oob";

/// The `installed` (or `web`) block of a downloaded OAuth client file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let file: ClientSecretsFile =
            serde_json::from_str(json).map_err(|e| AuthError::Credentials(e.to_string()))?;

        file.installed.or(file.web).ok_or_else(|| {
            AuthError::Credentials("expected an \"installed\" or \"web\" client".to_string())
        })
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(FALLBACK_REDIRECT)
    }

    /// Consent-screen URL asking for offline access to spreadsheets.
    pub fn authorization_url(&self) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &self.auth_uri,
            &[
                ("access_type", "offline"),
                ("scope", SHEETS_SCOPE),
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri()),
            ],
        )
        .map_err(|e| AuthError::Credentials(format!("invalid auth_uri: {e}")))
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
    token_type: Option<String>,
}

impl TokenResponse {
    /// Convert to the stored form. Refresh responses usually omit the refresh
    /// token, so the previous one is carried over.
    fn into_stored(self, previous_refresh: Option<String>, now_ms: i64) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            scope: self.scope,
            token_type: self.token_type,
            expiry_date: self.expires_in.map(|secs| now_ms + secs * 1000),
        }
    }
}

/// Credential provider backed by a user OAuth token on disk.
pub struct InstalledAppAuth {
    secrets: ClientSecrets,
    store: TokenFileStore,
    client: Client,
    token: RwLock<Option<StoredToken>>,
}

impl InstalledAppAuth {
    /// Load client secrets and any previously stored token.
    pub async fn from_files(
        credentials_path: &str,
        token_path: &str,
    ) -> Result<Self, AuthError> {
        let json = tokio::fs::read_to_string(credentials_path)
            .await
            .map_err(|e| AuthError::Credentials(format!("{credentials_path}: {e}")))?;
        let secrets = ClientSecrets::from_json(&json)?;

        let store = TokenFileStore::new(token_path);
        let token = store.load().await?;

        Ok(Self {
            secrets,
            store,
            client: Client::new(),
            token: RwLock::new(token),
        })
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(&self.secrets.token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Exchange(format!("{}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<StoredToken, AuthError> {
        tracing::debug!("Refreshing OAuth access token");

        let response = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.secrets.client_id),
                ("client_secret", &self.secrets.client_secret),
            ])
            .await?;

        Ok(response.into_stored(Some(refresh_token.to_string()), Utc::now().timestamp_millis()))
    }

    /// Walk the user through the consent screen and exchange the pasted code.
    async fn authorize_interactively(&self) -> Result<StoredToken, AuthError> {
        let url = self.secrets.authorization_url()?;
        println!("Authorize this app by visiting this url: {}", url);

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(b"Enter the code from that page here: ")
            .await
            .and(stdout.flush().await)
            .map_err(|e| AuthError::Authorization(e.to_string()))?;

        let mut code = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut code)
            .await
            .map_err(|e| AuthError::Authorization(e.to_string()))?;

        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::Authorization("no code entered".to_string()));
        }

        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", &self.secrets.client_id),
                ("client_secret", &self.secrets.client_secret),
                ("redirect_uri", self.secrets.redirect_uri()),
            ])
            .await?;

        Ok(response.into_stored(None, Utc::now().timestamp_millis()))
    }
}

#[async_trait]
impl CredentialProvider for InstalledAppAuth {
    async fn access_token(&self) -> Result<String, AuthError> {
        let now_ms = Utc::now().timestamp_millis();

        {
            let token = self.token.read().await;
            if let Some(token) = token.as_ref().filter(|t| t.is_fresh(now_ms)) {
                return Ok(token.access_token.clone());
            }
        }

        let mut token = self.token.write().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(current) = token.as_ref().filter(|t| t.is_fresh(now_ms)) {
            return Ok(current.access_token.clone());
        }

        let refreshed = match token.as_ref().and_then(|t| t.refresh_token.clone()) {
            Some(refresh_token) => self.refresh(&refresh_token).await?,
            None => self.authorize_interactively().await?,
        };

        self.store.persist(&refreshed).await?;
        tracing::info!("Token stored to {}", self.store.path().display());

        let access_token = refreshed.access_token.clone();
        *token = Some(refreshed);
        Ok(access_token)
    }
}

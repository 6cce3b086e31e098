pub mod credential_provider;

pub use credential_provider::{AuthError, CredentialProvider, SHEETS_SCOPE};

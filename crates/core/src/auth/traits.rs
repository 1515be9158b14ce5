use thiserror::Error;

use super::types::Identity;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Verifies identity tokens presented at connection time.
///
/// Verification is pure decode-and-check; no network calls, so the trait
/// is synchronous.
pub trait TokenVerifier: Send + Sync {
    /// Verify a raw token string and return the identity it carries.
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;

    /// Name of this verification method
    fn method_name(&self) -> &'static str;
}

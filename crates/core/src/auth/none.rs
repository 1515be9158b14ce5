//! No-verification mode for development and tests.

use super::{AuthError, Identity, TokenVerifier};

/// Accepts the token body as a plain JSON [`Identity`].
///
/// No signature check at all — development and test use only. A token that
/// is not a valid identity document is still rejected, so connections
/// never come up in a degraded half-authenticated state.
pub struct NoneVerifier;

impl NoneVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoneVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenVerifier for NoneVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::NotAuthenticated);
        }
        serde_json::from_str(token).map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}

//! Connection-time token verification.
//!
//! Every live connection presents a signed token carrying the identity
//! minted by the external authentication layer (user id, role, company id,
//! branch id). This module only verifies and decodes; it never issues
//! tokens.

mod jwt;
mod none;
mod traits;
mod types;

pub use jwt::*;
pub use none::*;
pub use traits::*;
pub use types::*;

use crate::config::{AuthConfig, AuthMethod};

/// Factory function to create a token verifier from config.
pub fn create_verifier(config: &AuthConfig) -> Result<Box<dyn TokenVerifier>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneVerifier::new())),
        AuthMethod::Jwt => {
            let secret = config.secret.clone().ok_or_else(|| {
                AuthError::ConfigurationError(
                    "auth.secret must be set when using jwt auth method".to_string(),
                )
            })?;
            Ok(Box::new(JwtVerifier::new(secret.as_bytes())))
        }
    }
}

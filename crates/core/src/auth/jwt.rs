//! JWT (HS256) token verification.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, Identity, Role, TokenVerifier};

/// Claims layout of a waitline identity token.
///
/// The external authentication layer mints these; we only decode them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: String,
    pub role: Role,
    pub company_id: String,
    pub branch_id: String,
    /// Expiration, seconds since epoch.
    pub exp: u64,
    /// Issued at, seconds since epoch.
    pub iat: u64,
}

/// Verifier for HS256-signed identity tokens.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            // Default validation checks exp against current time.
            validation: Validation::default(),
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let claims = data.claims;
        Ok(Identity {
            user_id: claims.sub,
            role: claims.role,
            company_id: claims.company_id,
            branch_id: claims.branch_id,
        })
    }

    fn method_name(&self) -> &'static str {
        "jwt"
    }
}

/// Sign an identity into a token valid for `ttl_secs`.
///
/// The production token issuer lives in the external authentication
/// service; this helper exists for development tooling and tests.
pub fn sign_identity(
    secret: &[u8],
    identity: &Identity,
    ttl_secs: u64,
) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = Claims {
        sub: identity.user_id.clone(),
        role: identity.role,
        company_id: identity.company_id.clone(),
        branch_id: identity.branch_id.clone(),
        exp: now + ttl_secs,
        iat: now,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AuthError::ConfigurationError(e.to_string()))
}

//! HS256 session tokens.
//!
//! Layout is the compact JWT form `header.payload.signature`, each segment
//! base64url without padding. Tokens are never persisted and cannot be
//! revoked; they simply stop verifying once `exp` has passed.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::TimeDelta;
use hmac::{Hmac, Mac};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::Email;

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of every issued token.
pub const TOKEN_TTL: TimeDelta = TimeDelta::hours(1);

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Identity asserted by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    /// Authenticated email.
    #[schema(value_type = String, example = "ada@example.com")]
    pub email: Email,
}

impl IdentityClaims {
    /// Claims for `email`.
    #[must_use]
    pub fn new(email: Email) -> Self {
        Self { email }
    }
}

/// A signed, time-bounded session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Compact `header.claims.signature` form sent as the bearer credential.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reasons a presented token is refused. All of them surface to clients as
/// `401 Unauthorized`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// No bearer credential was presented.
    #[error("token is missing")]
    Missing,
    /// Not three base64url segments, or a segment did not decode.
    #[error("token is malformed")]
    Malformed,
    /// Signed with another key, or tampered with.
    #[error("token signature does not match")]
    BadSignature,
    /// Past its `exp` claim.
    #[error("token has expired")]
    Expired,
}

/// Signing-key misconfiguration, detected when the signer is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningKeyError {
    /// The secret is below [`MIN_SECRET_LEN`].
    #[error("token secret too short: need >= {min_len} bytes, got {length}")]
    TooShort {
        /// Length of the rejected secret.
        length: usize,
        /// Required minimum.
        min_len: usize,
    },
    /// The MAC refused the key.
    #[error("token secret rejected by HMAC-SHA256")]
    Rejected,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    email: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct WireHeader {
    alg: String,
}

/// Issues and verifies session tokens with a shared secret.
///
/// The keyed MAC is built once; each signature works on a clone of it.
#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
    clock: Arc<dyn Clock>,
}

impl TokenSigner {
    /// Build a signer, rejecting secrets shorter than [`MIN_SECRET_LEN`].
    pub fn new(secret: Zeroizing<Vec<u8>>, clock: Arc<dyn Clock>) -> Result<Self, SigningKeyError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(SigningKeyError::TooShort {
                length: secret.len(),
                min_len: MIN_SECRET_LEN,
            });
        }
        let mac = HmacSha256::new_from_slice(&secret).map_err(|_| SigningKeyError::Rejected)?;
        Ok(Self { mac, clock })
    }

    /// Sign `claims` with a one-hour expiry.
    pub fn issue(&self, claims: &IdentityClaims) -> Result<SessionToken, serde_json::Error> {
        let now = self.clock.utc();
        let wire = WireClaims {
            email: claims.email.to_string(),
            iat: now.timestamp(),
            exp: (now + TOKEN_TTL).timestamp(),
        };
        let header = URL_SAFE_NO_PAD.encode(HEADER_JSON);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&wire)?);
        let signing_input = format!("{header}.{payload}");

        let mut mac = self.mac.clone();
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(SessionToken(format!("{signing_input}.{signature}")))
    }

    /// Check signature and expiry and return the asserted identity.
    pub fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Missing);
        }

        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|_| TokenError::Malformed)?;
        let parsed_header: WireHeader =
            serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Malformed)?;
        if parsed_header.alg != "HS256" {
            return Err(TokenError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = self.mac.clone();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let wire: WireClaims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;
        if self.clock.utc().timestamp() >= wire.exp {
            return Err(TokenError::Expired);
        }

        let email = Email::new(&wire.email).map_err(|_| TokenError::Malformed)?;
        Ok(IdentityClaims::new(email))
    }
}

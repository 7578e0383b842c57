//! Access token issuance
//!
//! Mints the short-lived, capability-scoped credentials that let exactly
//! one participant join exactly one session. Tokens are compact
//! HMAC-SHA256 JWS strings: self-contained and verifiable without a
//! round-trip to the issuer. There is no renewal; expired tokens are
//! replaced by re-issuing.

use crate::domain::shared::{DomainError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const MIN_SECRET_BYTES: usize = 32;

/// Media capabilities granted to one participant in one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCapabilities {
    pub can_publish: bool,
    pub can_publish_data: bool,
    pub can_subscribe: bool,
    pub can_update_metadata: bool,
    pub video: bool,
    pub audio: bool,
}

impl MediaCapabilities {
    /// Web-call grant shape; video per caller request
    pub fn web(video: bool, audio: bool) -> Self {
        Self {
            can_publish: true,
            can_publish_data: true,
            can_subscribe: true,
            can_update_metadata: true,
            video,
            audio,
        }
    }

    /// SIP legs carry audio only, always
    pub fn sip_audio_only() -> Self {
        Self {
            can_publish: true,
            can_publish_data: false,
            can_subscribe: true,
            can_update_metadata: false,
            video: false,
            audio: true,
        }
    }
}

/// Per-session grant embedded in the token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionGrant {
    /// The one session this token may join
    pub room: String,
    pub room_join: bool,
    #[serde(flatten)]
    pub capabilities: MediaCapabilities,
}

/// Signed token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer (deployment API key)
    pub iss: String,
    /// Participant identity
    pub sub: String,
    /// Participant display name
    pub name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    pub grants: SessionGrant,
}

impl TokenClaims {
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Issues and verifies session access tokens.
///
/// A bad signing secret fails here, at construction, never per call.
pub struct AccessTokenIssuer {
    api_key: String,
    secret: Vec<u8>,
}

impl AccessTokenIssuer {
    /// `secret` is hex-encoded key material (raw bytes accepted as a
    /// fallback) and must provide at least 32 bytes.
    pub fn new(api_key: impl Into<String>, secret: &str) -> Result<Self> {
        let bytes = hex::decode(secret).unwrap_or_else(|_| secret.as_bytes().to_vec());
        if bytes.len() < MIN_SECRET_BYTES {
            return Err(DomainError::Configuration(format!(
                "token signing secret must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }
        Ok(Self {
            api_key: api_key.into(),
            secret: bytes,
        })
    }

    /// Mint a token binding `participant_identity` to `session_name` with
    /// exactly the requested capabilities, expiring after `ttl_secs`.
    pub fn issue(
        &self,
        session_name: &str,
        participant_identity: &str,
        display_name: &str,
        ttl_secs: i64,
        capabilities: MediaCapabilities,
    ) -> Result<String> {
        if ttl_secs <= 0 {
            return Err(DomainError::ValidationError(
                "token ttl must be positive".to_string(),
            ));
        }

        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            iss: self.api_key.clone(),
            sub: participant_identity.to_string(),
            name: display_name.to_string(),
            iat: now,
            exp: now + ttl_secs,
            grants: SessionGrant {
                room: session_name.to_string(),
                room_join: true,
                capabilities,
            },
        };

        self.encode(&claims)
    }

    /// Verify signature and expiry, returning the decoded claims
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let mut parts = token.split('.');
        let (header, payload, signature) = match (parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(s)) if parts.next().is_none() => (h, p, s),
            _ => {
                return Err(DomainError::Unauthorized(
                    "malformed access token".to_string(),
                ));
            }
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| DomainError::Unauthorized("malformed access token".to_string()))?;

        let mut mac = self.mac();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| DomainError::Unauthorized("invalid token signature".to_string()))?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| DomainError::Unauthorized("malformed access token".to_string()))?;
        let claims: TokenClaims = serde_json::from_slice(&payload)
            .map_err(|_| DomainError::Unauthorized("malformed token claims".to_string()))?;

        if claims.is_expired() {
            return Err(DomainError::Unauthorized("token expired".to_string()));
        }

        Ok(claims)
    }

    fn encode(&self, claims: &TokenClaims) -> Result<String> {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = serde_json::to_vec(claims)
            .map_err(|e| DomainError::ValidationError(format!("unencodable claims: {}", e)))?;
        let payload = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}.{}", header, payload, signature))
    }

    fn mac(&self) -> HmacSha256 {
        // Key length was validated at construction
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }
}

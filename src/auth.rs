//! Identity collaborator: corporate-domain validation and sessions
//!
//! Sign-in is delegated to the surrounding identity provider; the desk only
//! checks that the account belongs to the corporate domain and mints a
//! session with a TTL. The store keeps the SHA-256 digest of the token, not
//! the token itself.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors for identity checks
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("{email:?} is not a {domain} account")]
    ForeignDomain { email: String, domain: String },
}

/// Check that `email` is a well-formed address on the corporate domain.
pub fn validate_email(email: &str, domain: &str) -> Result<(), AuthError> {
    let Some((local, host)) = email.split_once('@') else {
        return Err(AuthError::InvalidEmail(email.to_string()));
    };
    if local.is_empty() || host.is_empty() {
        return Err(AuthError::InvalidEmail(email.to_string()));
    }
    if !host.eq_ignore_ascii_case(domain) {
        return Err(AuthError::ForeignDomain {
            email: email.to_string(),
            domain: domain.to_string(),
        });
    }
    Ok(())
}

/// A signed-in session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token handed to the client
    pub token: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Mint a session for an already-validated account.
    pub fn issue(email: &str, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            token: ulid::Ulid::new().to_string().to_lowercase(),
            email: email.to_string(),
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// SHA-256 hex digest of the token, the form stored at rest.
    pub fn token_digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.token.as_bytes());
        hex::encode(hasher.finalize())
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! HS256 token codec.
//!
//! Pure CPU work: no I/O, no shared mutable state. The secret is fixed at
//! construction and only read afterwards, so one codec is shared by every
//! request without synchronization.
//!
//! Expiry is compared against the verifying process's own clock with no
//! skew tolerance: a token is expired as soon as `now >= exp`.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{CredentialClaims, TokenClaims};
use crate::config::AuthConfig;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// A freshly issued token together with its validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    pub token: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.secret, config.token_ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token valid from now for the configured TTL.
    pub fn issue(&self, claims: &CredentialClaims) -> Result<SignedToken, CodecError> {
        self.issue_at(claims, now())
    }

    /// Issue a token as if the current time were `issued_at` (epoch seconds).
    pub fn issue_at(&self, claims: &CredentialClaims, issued_at: i64) -> Result<SignedToken, CodecError> {
        let ttl = i64::try_from(self.ttl.as_secs())
            .map_err(|_| CodecError::Signing("token ttl out of range".to_string()))?;
        let expires_at = issued_at
            .checked_add(ttl)
            .ok_or_else(|| CodecError::Signing("token expiry out of range".to_string()))?;

        let payload = TokenClaims::from_credentials(claims, issued_at, expires_at);
        let token = encode(&Header::new(ALGORITHM), &payload, &self.encoding_key)
            .map_err(|e| CodecError::Signing(e.to_string()))?;

        Ok(SignedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, CodecError> {
        self.verify_at(token, now())
    }

    /// Verify a token as if the current time were `now` (epoch seconds).
    ///
    /// The signature is checked first; expiry is only evaluated for tokens
    /// that carry a valid signature.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<TokenClaims, CodecError> {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is evaluated below with `now >= exp` and no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => CodecError::SignatureInvalid,
                _ => CodecError::Malformed(e.to_string()),
            }
        })?;

        if now >= data.claims.exp {
            return Err(CodecError::Expired);
        }

        Ok(data.claims)
    }
}

fn now() -> i64 {
    Utc::now().timestamp()
}

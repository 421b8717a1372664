// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Google ID token verification for the OAuth login flow.

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::jwks::JwksManager;
use super::AuthError;
use crate::config::GoogleConfig;

/// Issuers Google uses on ID tokens.
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Clock skew tolerance for Google-issued tokens (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

pub struct GoogleVerifier {
    client_id: String,
    jwks: JwksManager,
}

impl GoogleVerifier {
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            jwks: JwksManager::new(config.jwks_url.clone()),
        }
    }

    pub fn jwks(&self) -> &JwksManager {
        &self.jwks
    }

    /// Verify signature, issuer, audience and expiry of a Google ID token.
    pub async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AuthError> {
        let header = decode_header(id_token).map_err(|_| AuthError::GoogleTokenRejected)?;
        let (key, algorithm) = self.jwks.decoding_key(header.kid.as_deref()).await?;
        validate_identity(id_token, &key, algorithm, &self.client_id)
    }
}

fn validate_identity(
    id_token: &str,
    key: &DecodingKey,
    algorithm: Algorithm,
    client_id: &str,
) -> Result<GoogleIdentity, AuthError> {
    let mut validation = Validation::new(algorithm);
    validation.set_issuer(&GOOGLE_ISSUERS);
    validation.set_audience(&[client_id]);
    validation.leeway = CLOCK_SKEW_LEEWAY;

    let data = decode::<GoogleIdentity>(id_token, key, &validation).map_err(|e| match e.kind() {
        ErrorKind::InvalidKeyFormat => AuthError::InternalError(e.to_string()),
        kind => {
            tracing::debug!(reason = ?kind, "Google ID token rejected");
            AuthError::GoogleTokenRejected
        }
    })?;

    let identity = data.claims;
    if identity.sub.trim().is_empty() {
        return Err(AuthError::GoogleTokenRejected);
    }
    // Accounts are matched by email, so an unverified address is never trusted.
    if identity.email.is_some() && identity.email_verified != Some(true) {
        tracing::debug!(sub = %identity.sub, "Google email not verified");
        return Err(AuthError::GoogleEmailUnverified);
    }
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"google-test-secret";
    const CLIENT_ID: &str = "client-123.apps.googleusercontent.com";

    fn sign(claims: serde_json::Value) -> String {
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn claims(iss: &str, aud: &str, exp_offset: i64) -> serde_json::Value {
        json!({
            "iss": iss,
            "aud": aud,
            "sub": "google-sub-1",
            "email": "reader@gmail.com",
            "email_verified": true,
            "name": "Reader",
            "exp": Utc::now().timestamp() + exp_offset,
        })
    }

    fn check(token: &str) -> Result<GoogleIdentity, AuthError> {
        validate_identity(token, &DecodingKey::from_secret(SECRET), Algorithm::HS256, CLIENT_ID)
    }

    #[test]
    fn accepts_both_google_issuers() {
        for iss in GOOGLE_ISSUERS {
            let identity = check(&sign(claims(iss, CLIENT_ID, 600))).unwrap();
            assert_eq!(identity.sub, "google-sub-1");
            assert_eq!(identity.email.as_deref(), Some("reader@gmail.com"));
            assert_eq!(identity.email_verified, Some(true));
        }
    }

    #[test]
    fn rejects_foreign_audience_and_issuer() {
        let wrong_aud = sign(claims("accounts.google.com", "someone-else", 600));
        assert_eq!(check(&wrong_aud), Err(AuthError::GoogleTokenRejected));

        let wrong_iss = sign(claims("https://evil.example.com", CLIENT_ID, 600));
        assert_eq!(check(&wrong_iss), Err(AuthError::GoogleTokenRejected));
    }

    #[test]
    fn rejects_unverified_or_unstated_email() {
        let mut unverified = claims("accounts.google.com", CLIENT_ID, 600);
        unverified["email"] = json!("victim@news.com");
        unverified["email_verified"] = json!(false);
        assert_eq!(check(&sign(unverified)), Err(AuthError::GoogleEmailUnverified));

        let mut unstated = claims("accounts.google.com", CLIENT_ID, 600);
        unstated.as_object_mut().unwrap().remove("email_verified");
        assert_eq!(check(&sign(unstated)), Err(AuthError::GoogleEmailUnverified));
    }

    #[test]
    fn rejects_expired_beyond_leeway() {
        let expired = sign(claims("accounts.google.com", CLIENT_ID, -600));
        assert_eq!(check(&expired), Err(AuthError::GoogleTokenRejected));
    }
}

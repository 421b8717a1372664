// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::codec::CodecError;
use crate::error::ApiError;

/// Authentication error type.
///
/// The first four variants are the gate's rejection kinds; the rest come from
/// issuance flows and role checks. Every variant renders through
/// [`ApiError`], the shared responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token on any carrier
    TokenMissing,
    /// Bad signature or undecodable token
    TokenInvalid,
    /// Token past its expiration
    TokenExpired,
    /// Verified token without a subject id
    MalformedClaims,
    /// Sign-in password mismatch
    InvalidCredentials,
    /// Role or ownership check failed
    InsufficientPermissions,
    /// Google ID token failed verification
    GoogleTokenRejected,
    /// Google has not verified the token's email address
    GoogleEmailUnverified,
    /// No matching key in JWKS
    NoMatchingKey,
    /// JWKS fetch failed
    JwksFetchError(String),
    /// Internal error
    InternalError(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::TokenMissing => "token_missing",
            AuthError::TokenInvalid => "token_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::MalformedClaims => "malformed_claims",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::GoogleTokenRejected => "google_token_rejected",
            AuthError::GoogleEmailUnverified => "google_email_unverified",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::JwksFetchError(_) => "jwks_fetch_error",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::TokenMissing
            | AuthError::TokenInvalid
            | AuthError::TokenExpired
            | AuthError::MalformedClaims
            | AuthError::InvalidCredentials
            | AuthError::GoogleTokenRejected
            | AuthError::GoogleEmailUnverified
            | AuthError::NoMatchingKey => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::JwksFetchError(_) | AuthError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether a stored token cookie should be dropped alongside this rejection.
    pub fn clears_cookie(&self) -> bool {
        matches!(
            self,
            AuthError::TokenInvalid | AuthError::TokenExpired | AuthError::MalformedClaims
        )
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::TokenMissing => write!(f, "Token Missing"),
            AuthError::TokenInvalid => write!(f, "Invalid token"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::MalformedClaims => write!(f, "Token is missing its subject"),
            AuthError::InvalidCredentials => {
                write!(f, "You have entered an invalid email or password")
            }
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
            AuthError::GoogleTokenRejected => write!(f, "Google sign-in token was rejected"),
            AuthError::GoogleEmailUnverified => {
                write!(f, "Google has not verified this account's email address")
            }
            AuthError::NoMatchingKey => write!(f, "No matching key found in JWKS"),
            AuthError::JwksFetchError(msg) => write!(f, "Failed to fetch JWKS: {msg}"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<CodecError> for AuthError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::SignatureInvalid | CodecError::Malformed(_) => AuthError::TokenInvalid,
            CodecError::Expired => AuthError::TokenExpired,
            CodecError::Signing(msg) => AuthError::InternalError(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn token_missing_returns_401() {
        let response = AuthError::TokenMissing.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "token_missing");
        assert_eq!(body["message"], "Token Missing");
    }

    #[tokio::test]
    async fn insufficient_permissions_returns_403() {
        let response = AuthError::InsufficientPermissions.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn gate_kinds_are_all_unauthorized() {
        for err in [
            AuthError::TokenMissing,
            AuthError::TokenInvalid,
            AuthError::TokenExpired,
            AuthError::MalformedClaims,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn codec_errors_map_to_gate_kinds() {
        assert_eq!(AuthError::from(CodecError::SignatureInvalid), AuthError::TokenInvalid);
        assert_eq!(
            AuthError::from(CodecError::Malformed("bad".into())),
            AuthError::TokenInvalid
        );
        assert_eq!(AuthError::from(CodecError::Expired), AuthError::TokenExpired);
        assert!(matches!(
            AuthError::from(CodecError::Signing("x".into())),
            AuthError::InternalError(_)
        ));
    }

    #[test]
    fn only_verification_failures_clear_the_cookie() {
        assert!(!AuthError::TokenMissing.clears_cookie());
        assert!(AuthError::TokenInvalid.clears_cookie());
        assert!(AuthError::TokenExpired.clears_cookie());
        assert!(AuthError::MalformedClaims.clears_cookie());
        assert!(!AuthError::InsufficientPermissions.clears_cookie());
    }
}

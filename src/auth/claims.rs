// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Token claims and the authenticated request context.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Identity a sign-in, sign-up or Google login flow hands to the codec.
///
/// Claims are immutable once issued; changing any of them means issuing a
/// new token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialClaims {
    pub subject_id: String,
    pub email: String,
    pub role: Role,
}

impl CredentialClaims {
    pub fn new(subject_id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: email.into(),
            role,
        }
    }
}

/// Claims as they travel inside the signed token.
///
/// `sub` is optional on decode so that a correctly signed token missing its
/// subject surfaces as malformed claims rather than a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (user ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    /// Issued at (epoch seconds)
    #[serde(default)]
    pub iat: i64,
    /// Expiration (epoch seconds)
    pub exp: i64,
}

impl TokenClaims {
    pub fn from_credentials(claims: &CredentialClaims, issued_at: i64, expires_at: i64) -> Self {
        Self {
            sub: Some(claims.subject_id.clone()),
            email: claims.email.clone(),
            role: claims.role,
            iat: issued_at,
            exp: expires_at,
        }
    }

    /// Subject id if present and non-blank.
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Authenticated user information attached to a request by the auth gate.
///
/// Lives in the request extensions for the duration of one request and is
/// never shared across requests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Subject id (the user record id)
    pub user_id: String,
    pub email: String,
    pub role: Role,
    /// Token issue time (Unix timestamp)
    #[serde(skip)]
    pub issued_at: i64,
    /// Token expiration (Unix timestamp)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Build from verified claims. Returns `None` when the subject is missing.
    pub fn from_claims(claims: TokenClaims) -> Option<Self> {
        let user_id = claims.subject()?.to_string();
        Some(Self {
            user_id,
            email: claims.email,
            role: claims.role,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    pub fn has_role(&self, required: Role) -> bool {
        self.role.has_privilege(required)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> TokenClaims {
        TokenClaims {
            sub: Some("user_123".to_string()),
            email: "reader@example.com".to_string(),
            role: Role::Admin,
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        }
    }

    #[test]
    fn from_claims_extracts_identity() {
        let user = AuthenticatedUser::from_claims(sample_claims()).unwrap();
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.email, "reader@example.com");
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.expires_at, 1_700_003_600);
    }

    #[test]
    fn from_claims_requires_subject() {
        let mut claims = sample_claims();
        claims.sub = None;
        assert!(AuthenticatedUser::from_claims(claims).is_none());

        let mut claims = sample_claims();
        claims.sub = Some("  ".to_string());
        assert!(AuthenticatedUser::from_claims(claims).is_none());
    }

    #[test]
    fn missing_role_decodes_as_user() {
        let claims: TokenClaims =
            serde_json::from_str(r#"{"sub":"u1","email":"a@b.com","iat":1,"exp":2}"#).unwrap();
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn credentials_round_trip_into_token_claims() {
        let creds = CredentialClaims::new("u1", "a@b.com", Role::User);
        let claims = TokenClaims::from_credentials(&creds, 10, 20);
        assert_eq!(claims.subject(), Some("u1"));
        assert_eq!(claims.iat, 10);
        assert_eq!(claims.exp, 20);
    }

    #[test]
    fn has_role_checks_privilege() {
        let user = AuthenticatedUser::from_claims(sample_claims()).unwrap();
        assert!(user.has_role(Role::User));
        assert!(user.has_role(Role::Admin));
        assert!(!user.has_role(Role::SuperAdmin));
    }
}

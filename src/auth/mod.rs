// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! # Authentication Module
//!
//! Stateless JWT authentication for the Sojo News API.
//!
//! ## Auth Flow
//!
//! 1. Sign-up, sign-in or Google login resolves a user record
//! 2. The server issues an HS256 token with `{sub, email, role, iat, exp}`,
//!    returned in the body and, when enabled, as a `token` cookie
//! 3. On protected routes the gate:
//!    - picks one token from the request (see [`carrier`])
//!    - verifies signature, then expiry
//!    - attaches an [`AuthenticatedUser`] or rejects with 401
//!
//! ## Security
//!
//! - The signing secret is loaded once at startup and never re-read
//! - Signature comparison is constant-time (HMAC verification)
//! - No clock-skew tolerance for our own tokens
//! - Tokens are not persisted; there is no revocation list

pub mod carrier;
pub mod claims;
pub mod codec;
pub mod cookie;
pub mod error;
pub mod extractor;
pub mod google;
pub mod jwks;
pub mod middleware;
pub mod password;
pub mod roles;

pub use claims::{AuthenticatedUser, CredentialClaims, TokenClaims};
pub use codec::{CodecError, SignedToken, TokenCodec};
pub use cookie::TokenCookie;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, OptionalAuth};
pub use google::{GoogleIdentity, GoogleVerifier};
pub use jwks::JwksManager;
pub use middleware::{require_auth, AuthGate, GateOutcome, Rejection};
pub use roles::Role;

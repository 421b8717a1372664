// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::middleware::{GateOutcome, Rejection};
use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

impl From<AuthError> for Rejection {
    fn from(error: AuthError) -> Self {
        Rejection {
            error,
            carrier: None,
            clear_cookie: None,
        }
    }
}

/// Extractor for authenticated users.
///
/// Behind [`require_auth`](super::require_auth) this reads the user the
/// middleware attached. Mounted without it, the extractor runs the same gate
/// itself.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_bookmarks(
///     Auth(user): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<BookmarkListResponse>, ApiError> {
///     // user.user_id is the token subject
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        match state.gate.authorize(&parts.headers, parts.uri.query()) {
            GateOutcome::Authorized(user) => {
                parts.extensions.insert(user.clone());
                Ok(Auth(user))
            }
            GateOutcome::Rejected(rejection) => Err(rejection),
        }
    }
}

/// Extractor that requires admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions.into());
        }

        Ok(AdminOnly(user))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` if no valid authentication is present, instead of rejecting.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(user)) => Ok(OptionalAuth(Some(user))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

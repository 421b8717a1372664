// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Authentication gate and its Axum middleware.
//!
//! [`AuthGate::authorize`] is a pure decision over a request's headers and
//! query string. It returns a [`GateOutcome`] and never touches the handler
//! chain. [`require_auth`] is the only place that turns the outcome into
//! either "continue with the user attached" or "render the rejection", so a
//! request reaches the next handler at most once and never after a rejection.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/check", get(check))
//!     .route_layer(axum::middleware::from_fn_with_state(gate, require_auth));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use super::carrier::{extract_token, TokenCarrier};
use super::codec::TokenCodec;
use super::cookie::TokenCookie;
use super::{AuthError, AuthenticatedUser};
use crate::config::AuthConfig;

/// Terminal state of one authorization check.
#[derive(Debug)]
pub enum GateOutcome {
    Authorized(AuthenticatedUser),
    Rejected(Rejection),
}

/// A rejected request: the error to render and, for verification failures,
/// the cookie that clears a stored token.
#[derive(Debug)]
pub struct Rejection {
    pub error: AuthError,
    pub carrier: Option<TokenCarrier>,
    pub clear_cookie: Option<HeaderValue>,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let mut response = self.error.into_response();
        if let Some(cookie) = self.clear_cookie {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
        response
    }
}

pub struct AuthGate {
    codec: TokenCodec,
    cookie: TokenCookie,
}

impl AuthGate {
    pub fn new(codec: TokenCodec, cookie: TokenCookie) -> Self {
        Self { codec, cookie }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(TokenCodec::from_config(config), TokenCookie::from_config(config))
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn cookie(&self) -> &TokenCookie {
        &self.cookie
    }

    /// Decide whether a request carries a valid token.
    pub fn authorize(&self, headers: &HeaderMap, query: Option<&str>) -> GateOutcome {
        self.authorize_at(headers, query, Utc::now().timestamp())
    }

    /// Same as [`authorize`](Self::authorize), with an explicit clock.
    pub fn authorize_at(&self, headers: &HeaderMap, query: Option<&str>, now: i64) -> GateOutcome {
        let Some(candidate) = extract_token(headers, query) else {
            return self.reject(AuthError::TokenMissing, None);
        };

        let claims = match self.codec.verify_at(&candidate.value, now) {
            Ok(claims) => claims,
            Err(err) => return self.reject(err.into(), Some(candidate.carrier)),
        };

        match AuthenticatedUser::from_claims(claims) {
            Some(user) => GateOutcome::Authorized(user),
            None => self.reject(AuthError::MalformedClaims, Some(candidate.carrier)),
        }
    }

    fn reject(&self, error: AuthError, carrier: Option<TokenCarrier>) -> GateOutcome {
        let clear_cookie = if error.clears_cookie() {
            self.cookie.clear()
        } else {
            None
        };
        GateOutcome::Rejected(Rejection {
            error,
            carrier,
            clear_cookie,
        })
    }
}

/// Middleware requiring a valid token on every request it wraps.
///
/// On success the [`AuthenticatedUser`] is inserted into the request
/// extensions, where the `Auth` extractor picks it up.
pub async fn require_auth(
    State(gate): State<Arc<AuthGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = gate.authorize(request.headers(), request.uri().query());

    match outcome {
        GateOutcome::Authorized(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        GateOutcome::Rejected(rejection) => {
            tracing::debug!(
                carrier = rejection.carrier.map(|c| c.as_str()).unwrap_or("none"),
                error_code = rejection.error.error_code(),
                path = %request.uri().path(),
                "Request rejected by auth gate"
            );
            rejection.into_response()
        }
    }
}

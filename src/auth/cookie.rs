// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! `Set-Cookie` values for the token cookie.

use std::time::Duration;

use axum::http::HeaderValue;

use super::carrier::TOKEN_COOKIE;
use crate::config::{AuthConfig, CookieSameSite};

#[derive(Debug, Clone)]
pub struct TokenCookie {
    enabled: bool,
    secure: bool,
    same_site: CookieSameSite,
}

impl TokenCookie {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            enabled: config.cookie_enabled,
            secure: config.cookie_secure,
            same_site: config.cookie_same_site,
        }
    }

    /// Whether issuance should set the cookie at all.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Cookie carrying `token`, expiring together with it.
    pub fn issue(&self, token: &str, max_age: Duration) -> Option<HeaderValue> {
        self.render(token, max_age.as_secs())
    }

    /// Cookie that makes the browser drop any stored token.
    ///
    /// Produced even when cookie issuance is disabled, since a client may hold
    /// a cookie from an earlier deployment.
    pub fn clear(&self) -> Option<HeaderValue> {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: u64) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{TOKEN_COOKIE}={value}; Path=/; HttpOnly; SameSite={}; Max-Age={max_age}",
            self.same_site.as_str()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(secure: bool) -> TokenCookie {
        let mut config = AuthConfig::new("s", Duration::from_secs(60));
        config.cookie_secure = secure;
        config.cookie_same_site = CookieSameSite::Strict;
        TokenCookie::from_config(&config)
    }

    #[test]
    fn issued_cookie_matches_token_lifetime() {
        let value = cookie(false).issue("abc", Duration::from_secs(3600)).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "token=abc; Path=/; HttpOnly; SameSite=Strict; Max-Age=3600"
        );
    }

    #[test]
    fn clearing_cookie_expires_immediately() {
        let value = cookie(true).clear().unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "token=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0; Secure"
        );
    }

    #[test]
    fn invalid_characters_are_refused() {
        assert!(cookie(false).issue("bad\nvalue", Duration::from_secs(1)).is_none());
    }
}

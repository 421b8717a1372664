// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Google signing keys (JWKS), fetched over HTTPS and cached.
//!
//! Google publishes its ID-token keys with a `Cache-Control: max-age`, which
//! sets how long a fetched set stays fresh. When a token names a `kid` the
//! fresh set does not contain, the set is fetched once more, since Google may
//! have rotated keys before the cached set expired. Our own access tokens are
//! HMAC-signed and never touch this module.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use reqwest::header::CACHE_CONTROL;
use tokio::sync::RwLock;

use super::error::AuthError;

/// Freshness when the response carries no usable `max-age`.
const FALLBACK_MAX_AGE: Duration = Duration::from_secs(300);

/// Upper bound on any advertised `max-age`.
const MAX_CACHE_AGE: Duration = Duration::from_secs(24 * 60 * 60);

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

struct CachedKeys {
    set: JwkSet,
    fresh_until: Instant,
}

#[derive(Clone)]
pub struct JwksManager {
    jwks_url: String,
    fallback_max_age: Duration,
    cache: Arc<RwLock<Option<CachedKeys>>>,
    http: reqwest::Client,
}

impl JwksManager {
    pub fn new(jwks_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            jwks_url: jwks_url.into(),
            fallback_max_age: FALLBACK_MAX_AGE,
            cache: Arc::new(RwLock::new(None)),
            http,
        }
    }

    /// Override the freshness used when Google sends no `max-age`.
    pub fn with_fallback_max_age(mut self, max_age: Duration) -> Self {
        self.fallback_max_age = max_age;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Key for a token header's `kid`. Tokens without a `kid` get the first
    /// usable RSA key.
    pub async fn decoding_key(&self, kid: Option<&str>) -> Result<(DecodingKey, Algorithm), AuthError> {
        let was_cached = self.is_cached().await;
        let set = self.current_set().await?;
        match select_key(&set, kid) {
            Err(AuthError::NoMatchingKey) if was_cached && kid.is_some() => {
                tracing::debug!(kid, "Unknown Google key id, refetching key set");
                self.refresh().await?;
                let set = self.current_set().await?;
                select_key(&set, kid)
            }
            other => other,
        }
    }

    /// Fetch the key set now, replacing the cached one.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let (set, max_age) = self.fetch().await?;
        self.store(set, max_age.unwrap_or(self.fallback_max_age)).await;
        Ok(())
    }

    /// Whether a fresh key set is cached.
    pub async fn is_cached(&self) -> bool {
        self.cache
            .read()
            .await
            .as_ref()
            .is_some_and(|cached| Instant::now() < cached.fresh_until)
    }

    async fn current_set(&self) -> Result<JwkSet, AuthError> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if Instant::now() < cached.fresh_until {
                return Ok(cached.set.clone());
            }
        }
        self.refresh().await?;
        self.cache
            .read()
            .await
            .as_ref()
            .map(|cached| cached.set.clone())
            .ok_or(AuthError::NoMatchingKey)
    }

    pub(crate) async fn store(&self, set: JwkSet, max_age: Duration) {
        let now = Instant::now();
        let fresh_until = now
            .checked_add(max_age.min(MAX_CACHE_AGE))
            .unwrap_or(now);
        *self.cache.write().await = Some(CachedKeys { set, fresh_until });
    }

    async fn fetch(&self) -> Result<(JwkSet, Option<Duration>), AuthError> {
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::JwksFetchError(format!("HTTP {status} from {}", self.jwks_url)));
        }

        let max_age = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age);
        let set = response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;
        tracing::debug!(keys = set.keys.len(), ?max_age, "Fetched Google signing keys");
        Ok((set, max_age))
    }
}

/// `max-age` directive of a `Cache-Control` value, unless caching is forbidden.
fn parse_max_age(cache_control: &str) -> Option<Duration> {
    let mut max_age = None;
    for directive in cache_control.split(',').map(str::trim) {
        let lower = directive.to_ascii_lowercase();
        if lower == "no-store" || lower == "no-cache" {
            return None;
        }
        if let Some(secs) = lower.strip_prefix("max-age=") {
            max_age = secs
                .trim_matches('"')
                .parse::<u64>()
                .ok()
                .map(|secs| Duration::from_secs(secs).min(MAX_CACHE_AGE));
        }
    }
    max_age
}

fn select_key(set: &JwkSet, kid: Option<&str>) -> Result<(DecodingKey, Algorithm), AuthError> {
    match kid {
        Some(kid) => set
            .keys
            .iter()
            .find(|jwk| jwk.common.key_id.as_deref() == Some(kid))
            .ok_or(AuthError::NoMatchingKey)
            .and_then(rsa_key),
        None => set
            .keys
            .iter()
            .find_map(|jwk| rsa_key(jwk).ok())
            .ok_or(AuthError::NoMatchingKey),
    }
}

/// Google signs ID tokens with RSA keys only.
fn rsa_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), AuthError> {
    let AlgorithmParameters::RSA(rsa) = &jwk.algorithm else {
        return Err(AuthError::NoMatchingKey);
    };
    let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
        .map_err(|e| AuthError::InternalError(format!("invalid RSA key in JWKS: {e}")))?;
    let algorithm = match jwk.common.key_algorithm {
        Some(KeyAlgorithm::RS384) => Algorithm::RS384,
        Some(KeyAlgorithm::RS512) => Algorithm::RS512,
        _ => Algorithm::RS256,
    };
    Ok((key, algorithm))
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Token carrier selection.
//!
//! A request may present a token in several places. Exactly one candidate is
//! picked, in this order, and later carriers are ignored even if populated:
//!
//! 1. `Authorization: Bearer <token>` (second whitespace-separated segment)
//! 2. `x-access-token` header
//! 3. `token` header
//! 4. `?token=` query parameter
//! 5. `token` cookie
//!
//! No shape checks happen here; that is the codec's job.

use axum::http::{header, HeaderMap, HeaderValue};

pub const TOKEN_COOKIE: &str = "token";
pub const TOKEN_QUERY_PARAM: &str = "token";
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";
pub const TOKEN_HEADER: &str = "token";

/// Where a token candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCarrier {
    AuthorizationHeader,
    AccessTokenHeader,
    TokenHeader,
    QueryParameter,
    Cookie,
}

impl TokenCarrier {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenCarrier::AuthorizationHeader => "authorization_header",
            TokenCarrier::AccessTokenHeader => "x_access_token_header",
            TokenCarrier::TokenHeader => "token_header",
            TokenCarrier::QueryParameter => "query_parameter",
            TokenCarrier::Cookie => "cookie",
        }
    }
}

impl std::fmt::Display for TokenCarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCandidate {
    pub carrier: TokenCarrier,
    pub value: String,
}

impl TokenCandidate {
    fn new(carrier: TokenCarrier, value: impl Into<String>) -> Self {
        Self {
            carrier,
            value: value.into(),
        }
    }
}

/// Pick the single token candidate for a request, if any.
pub fn extract_token(headers: &HeaderMap, query: Option<&str>) -> Option<TokenCandidate> {
    if let Some(token) = bearer_token(headers) {
        return Some(TokenCandidate::new(TokenCarrier::AuthorizationHeader, token));
    }
    if let Some(token) = header_value(headers.get(ACCESS_TOKEN_HEADER)) {
        return Some(TokenCandidate::new(TokenCarrier::AccessTokenHeader, token));
    }
    if let Some(token) = header_value(headers.get(TOKEN_HEADER)) {
        return Some(TokenCandidate::new(TokenCarrier::TokenHeader, token));
    }
    if let Some(token) = query.and_then(query_token) {
        return Some(TokenCandidate::new(TokenCarrier::QueryParameter, token));
    }
    cookie_token(headers).map(|token| TokenCandidate::new(TokenCarrier::Cookie, token))
}

fn header_value(value: Option<&HeaderValue>) -> Option<&str> {
    let value = value?.to_str().ok()?.trim();
    (!value.is_empty()).then_some(value)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = header_value(headers.get(header::AUTHORIZATION))?;
    // The scheme word is not inspected; the token is the second segment.
    value.split_whitespace().nth(1)
}

fn query_token(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == TOKEN_QUERY_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Value of the `token` cookie, across any number of `Cookie` headers.
pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name.trim() == TOKEN_COOKIE).then(|| value.trim().trim_matches('"').to_string())
        })
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn nothing_present_yields_none() {
        assert_eq!(extract_token(&HeaderMap::new(), None), None);
        assert_eq!(extract_token(&HeaderMap::new(), Some("page=2")), None);
    }

    #[test]
    fn authorization_header_wins_over_cookie() {
        let map = headers(&[("authorization", "Bearer from-header"), ("cookie", "token=from-cookie")]);
        let candidate = extract_token(&map, Some("token=from-query")).unwrap();
        assert_eq!(candidate.carrier, TokenCarrier::AuthorizationHeader);
        assert_eq!(candidate.value, "from-header");
    }

    #[test]
    fn precedence_follows_carrier_order() {
        let map = headers(&[
            ("x-access-token", "access"),
            ("token", "plain"),
            ("cookie", "token=cookie"),
        ]);
        let candidate = extract_token(&map, Some("token=query")).unwrap();
        assert_eq!(candidate, TokenCandidate::new(TokenCarrier::AccessTokenHeader, "access"));

        let map = headers(&[("token", "plain"), ("cookie", "token=cookie")]);
        let candidate = extract_token(&map, Some("token=query")).unwrap();
        assert_eq!(candidate, TokenCandidate::new(TokenCarrier::TokenHeader, "plain"));

        let map = headers(&[("cookie", "token=cookie")]);
        let candidate = extract_token(&map, Some("token=query")).unwrap();
        assert_eq!(candidate, TokenCandidate::new(TokenCarrier::QueryParameter, "query"));

        let candidate = extract_token(&map, None).unwrap();
        assert_eq!(candidate, TokenCandidate::new(TokenCarrier::Cookie, "cookie"));
    }

    #[test]
    fn authorization_without_token_segment_falls_through() {
        let map = headers(&[("authorization", "Bearer"), ("x-access-token", "access")]);
        let candidate = extract_token(&map, None).unwrap();
        assert_eq!(candidate.carrier, TokenCarrier::AccessTokenHeader);

        let map = headers(&[("authorization", "   "), ("cookie", "token=c")]);
        let candidate = extract_token(&map, None).unwrap();
        assert_eq!(candidate.carrier, TokenCarrier::Cookie);
    }

    #[test]
    fn any_scheme_word_yields_the_second_segment() {
        let map = headers(&[("authorization", "Token abc"), ("cookie", "token=c")]);
        let candidate = extract_token(&map, None).unwrap();
        assert_eq!(candidate, TokenCandidate::new(TokenCarrier::AuthorizationHeader, "abc"));
    }

    #[test]
    fn bearer_splits_on_any_whitespace() {
        let map = headers(&[("authorization", "Bearer   abc.def.ghi  ")]);
        assert_eq!(extract_token(&map, None).unwrap().value, "abc.def.ghi");

        let map = headers(&[("authorization", "bearer\tabc")]);
        assert_eq!(extract_token(&map, None).unwrap().value, "abc");
    }

    #[test]
    fn empty_headers_count_as_absent() {
        let map = headers(&[("x-access-token", "   "), ("token", "plain")]);
        assert_eq!(extract_token(&map, None).unwrap().carrier, TokenCarrier::TokenHeader);
    }

    #[test]
    fn query_token_is_percent_decoded() {
        let candidate = extract_token(&HeaderMap::new(), Some("a=1&token=abc%2Edef&b=2")).unwrap();
        assert_eq!(candidate.value, "abc.def");

        assert_eq!(extract_token(&HeaderMap::new(), Some("token=")), None);
    }

    #[test]
    fn cookie_is_found_among_others() {
        let map = headers(&[("cookie", "theme=dark; token=\"quoted\"; lang=en")]);
        assert_eq!(cookie_token(&map).as_deref(), Some("quoted"));

        let map = headers(&[("cookie", "theme=dark"), ("cookie", "token=second-header")]);
        assert_eq!(cookie_token(&map).as_deref(), Some("second-header"));

        let map = headers(&[("cookie", "mytoken=nope; token=")]);
        assert_eq!(cookie_token(&map), None);
    }
}

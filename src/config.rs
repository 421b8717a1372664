// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! # Runtime Configuration
//!
//! Configuration is read from the environment exactly once, at startup, into
//! an [`AppConfig`]. Everything downstream (token codec, auth gate, storage,
//! providers) receives its slice of this struct through its constructor.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET_KEY` | HMAC secret for signing access tokens | Required |
//! | `JWT_EXPIRATION` | Token TTL (`3600`, `30m`, `12h`, `1d`, `2w`) | `1d` |
//! | `AUTH_COOKIE_ENABLED` | Also deliver tokens as a `token` cookie | `true` |
//! | `AUTH_COOKIE_SECURE` | Mark the cookie `Secure` | `false` |
//! | `AUTH_COOKIE_SAMESITE` | `Lax`, `Strict` or `None` | `Lax` |
//! | `GOOGLE_CLIENT_ID` | Enables Google sign-in | Optional |
//! | `GOOGLE_JWKS_URL` | Google signing keys | Google's public JWKS |
//! | `CLOUDINARY_NAME` | Cloudinary cloud name | Optional |
//! | `CLOUDINARY_API_KEY` | Cloudinary API key | Optional |
//! | `CLOUDINARY_API_KEY_SECRET` | Cloudinary API secret | Optional |
//! | `ADMIN_EMAILS` | Comma-separated emails that hold the `admin` role | Optional |
//! | `AUTH_RATE_LIMIT` | Requests per client IP per window on `/api/auth/*` | `200` |
//! | `AUTH_RATE_LIMIT_WINDOW` | Rate limit window (same format as `JWT_EXPIRATION`) | `1h` |
//! | `TRUST_PROXY_HEADERS` | Key the rate limit on `X-Forwarded-For` / `X-Real-IP` | `false` |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated origins allowed credentialed requests | Optional |
//! | `DATA_DIR` | Root directory for the document store | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::validation::{looks_like_email, normalize_email};

pub const JWT_SECRET_ENV: &str = "JWT_SECRET_KEY";
pub const JWT_EXPIRATION_ENV: &str = "JWT_EXPIRATION";
pub const COOKIE_ENABLED_ENV: &str = "AUTH_COOKIE_ENABLED";
pub const COOKIE_SECURE_ENV: &str = "AUTH_COOKIE_SECURE";
pub const COOKIE_SAMESITE_ENV: &str = "AUTH_COOKIE_SAMESITE";
pub const GOOGLE_CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
pub const GOOGLE_JWKS_URL_ENV: &str = "GOOGLE_JWKS_URL";
pub const CLOUDINARY_NAME_ENV: &str = "CLOUDINARY_NAME";
pub const CLOUDINARY_API_KEY_ENV: &str = "CLOUDINARY_API_KEY";
pub const CLOUDINARY_API_SECRET_ENV: &str = "CLOUDINARY_API_KEY_SECRET";
pub const ADMIN_EMAILS_ENV: &str = "ADMIN_EMAILS";
pub const AUTH_RATE_LIMIT_ENV: &str = "AUTH_RATE_LIMIT";
pub const AUTH_RATE_LIMIT_WINDOW_ENV: &str = "AUTH_RATE_LIMIT_WINDOW";
pub const TRUST_PROXY_HEADERS_ENV: &str = "TRUST_PROXY_HEADERS";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default token lifetime (one day).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub const DEFAULT_AUTH_RATE_LIMIT: u32 = 200;
pub const DEFAULT_AUTH_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60 * 60);

pub const DEFAULT_GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET_KEY must be set to a non-empty value")]
    MissingSecret,

    #[error("invalid JWT_EXPIRATION value '{0}' (expected seconds or <n>s/m/h/d/w, > 0)")]
    InvalidTtl(String),

    #[error("invalid AUTH_RATE_LIMIT value '{0}' (expected a positive integer)")]
    InvalidRateLimit(String),

    #[error("invalid AUTH_RATE_LIMIT_WINDOW value '{0}' (expected seconds or <n>s/m/h/d/w, > 0)")]
    InvalidRateLimitWindow(String),

    #[error("invalid email '{0}' in ADMIN_EMAILS")]
    InvalidAdminEmail(String),

    #[error("invalid origin '{0}' in CORS_ALLOWED_ORIGINS (expected scheme://host[:port])")]
    InvalidOrigin(String),

    #[error("invalid PORT value '{0}'")]
    InvalidPort(String),

    #[error("invalid AUTH_COOKIE_SAMESITE value '{0}' (use Lax, Strict or None)")]
    InvalidSameSite(String),

    #[error("{name} must be an https URL, got '{value}'")]
    InsecureUrl { name: &'static str, value: String },

    #[error("Cloudinary is partially configured; missing {0}")]
    PartialCloudinary(&'static str),
}

/// `SameSite` attribute for the token cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieSameSite {
    Lax,
    Strict,
    None,
}

impl CookieSameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            CookieSameSite::Lax => "Lax",
            CookieSameSite::Strict => "Strict",
            CookieSameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Token signing and delivery settings.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret. Read-only after startup.
    pub secret: Vec<u8>,
    /// Lifetime of issued tokens.
    pub token_ttl: Duration,
    /// Whether issuance also sets a `token` cookie.
    pub cookie_enabled: bool,
    pub cookie_secure: bool,
    pub cookie_same_site: CookieSameSite,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("cookie_enabled", &self.cookie_enabled)
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_same_site", &self.cookie_same_site)
            .finish()
    }
}

impl AuthConfig {
    /// Settings for tests and tooling: cookie mode on, insecure cookie.
    pub fn new(secret: impl Into<Vec<u8>>, token_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            token_ttl,
            cookie_enabled: true,
            cookie_secure: false,
            cookie_same_site: CookieSameSite::Lax,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub jwks_url: String,
}

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Fixed-window limit on the `/api/auth` routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    /// Use forwarding headers set by a reverse proxy to find the client IP.
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_AUTH_RATE_LIMIT,
            window: DEFAULT_AUTH_RATE_LIMIT_WINDOW,
            trust_proxy_headers: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub log_format: LogFormat,
    pub auth: AuthConfig,
    pub google: Option<GoogleConfig>,
    pub cloudinary: Option<CloudinaryConfig>,
    /// Normalized emails granted `admin` at signup and at startup.
    pub admin_emails: Vec<String>,
    pub auth_rate_limit: RateLimitConfig,
    /// Origins allowed credentialed cross-site requests. Empty means no
    /// origin may send credentials.
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let secret = get(JWT_SECRET_ENV).ok_or(ConfigError::MissingSecret)?;
        let token_ttl = match get(JWT_EXPIRATION_ENV) {
            Some(raw) => parse_ttl(&raw)?,
            None => DEFAULT_TOKEN_TTL,
        };
        let cookie_same_site = match get(COOKIE_SAMESITE_ENV) {
            Some(raw) => parse_same_site(&raw)?,
            None => CookieSameSite::Lax,
        };
        let auth = AuthConfig {
            secret: secret.into_bytes(),
            token_ttl,
            cookie_enabled: get(COOKIE_ENABLED_ENV).map(|v| parse_bool(&v)).unwrap_or(true),
            cookie_secure: get(COOKIE_SECURE_ENV).map(|v| parse_bool(&v)).unwrap_or(false),
            cookie_same_site,
        };

        let google = match get(GOOGLE_CLIENT_ID_ENV) {
            Some(client_id) => {
                let jwks_url = get(GOOGLE_JWKS_URL_ENV)
                    .unwrap_or_else(|| DEFAULT_GOOGLE_JWKS_URL.to_string());
                require_https(GOOGLE_JWKS_URL_ENV, &jwks_url)?;
                Some(GoogleConfig { client_id, jwks_url })
            }
            None => None,
        };

        let cloudinary = match (
            get(CLOUDINARY_NAME_ENV),
            get(CLOUDINARY_API_KEY_ENV),
            get(CLOUDINARY_API_SECRET_ENV),
        ) {
            (None, None, None) => None,
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            (None, _, _) => return Err(ConfigError::PartialCloudinary(CLOUDINARY_NAME_ENV)),
            (_, None, _) => return Err(ConfigError::PartialCloudinary(CLOUDINARY_API_KEY_ENV)),
            (_, _, None) => return Err(ConfigError::PartialCloudinary(CLOUDINARY_API_SECRET_ENV)),
        };

        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let admin_emails = match get(ADMIN_EMAILS_ENV) {
            Some(raw) => parse_admin_emails(&raw)?,
            None => Vec::new(),
        };

        let auth_rate_limit = RateLimitConfig {
            max_requests: match get(AUTH_RATE_LIMIT_ENV) {
                Some(raw) => raw
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ConfigError::InvalidRateLimit(raw))?,
                None => DEFAULT_AUTH_RATE_LIMIT,
            },
            window: match get(AUTH_RATE_LIMIT_WINDOW_ENV) {
                Some(raw) => {
                    parse_ttl(&raw).map_err(|_| ConfigError::InvalidRateLimitWindow(raw))?
                }
                None => DEFAULT_AUTH_RATE_LIMIT_WINDOW,
            },
            trust_proxy_headers: get(TRUST_PROXY_HEADERS_ENV)
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
        };

        let cors_allowed_origins = match get(CORS_ALLOWED_ORIGINS_ENV) {
            Some(raw) => parse_origins(&raw)?,
            None => Vec::new(),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_dir: PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            log_format,
            auth,
            google,
            cloudinary,
            admin_emails,
            auth_rate_limit,
            cors_allowed_origins,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a token lifetime: bare seconds or a number with an `s`, `m`, `h`,
/// `d` or `w` suffix.
pub fn parse_ttl(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidTtl(raw.to_string());
    let value = raw.trim();
    let (digits, unit) = match value.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => value.split_at(idx),
        None => (value, "s"),
    };
    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        _ => return Err(invalid()),
    };
    let seconds = amount.checked_mul(multiplier).ok_or_else(invalid)?;
    if seconds == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs(seconds))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_same_site(value: &str) -> Result<CookieSameSite, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => Ok(CookieSameSite::Lax),
        "strict" => Ok(CookieSameSite::Strict),
        "none" => Ok(CookieSameSite::None),
        _ => Err(ConfigError::InvalidSameSite(value.to_string())),
    }
}

fn parse_admin_emails(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut emails = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let email = normalize_email(entry);
        if !looks_like_email(&email) {
            return Err(ConfigError::InvalidAdminEmail(entry.to_string()));
        }
        if !emails.contains(&email) {
            emails.push(email);
        }
    }
    Ok(emails)
}

/// Origins as browsers send them: scheme, host and optional port.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|origin| {
            let invalid = || ConfigError::InvalidOrigin(origin.to_string());
            let url = Url::parse(origin).map_err(|_| invalid())?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return Err(invalid());
            }
            Ok(url.origin().ascii_serialization())
        })
        .collect()
}

fn require_https(name: &'static str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "https" => Ok(()),
        _ => Err(ConfigError::InsecureUrl {
            name,
            value: value.to_string(),
        }),
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::api::rate_limit::RateLimiter;
use crate::auth::{AuthGate, GoogleVerifier, Role};
use crate::config::RateLimitConfig;
use crate::providers::{CloudinaryClient, FileUpload, UploadError, UploadedAsset};
use crate::storage::FileStorage;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<FileStorage>,
    /// Token codec and gate, built once from the startup configuration
    pub gate: Arc<AuthGate>,
    /// Present when Google sign-in is configured
    pub google: Option<Arc<GoogleVerifier>>,
    /// Present when image uploads are configured
    pub assets: Option<Arc<CloudinaryClient>>,
    /// Serializes check-then-write sequences (unique email, slug, bookmark)
    pub write_lock: Arc<Mutex<()>>,
    /// Normalized emails whose accounts hold `admin`
    pub admin_emails: Arc<[String]>,
    /// Limits `/api/auth` requests per client
    pub auth_limiter: RateLimiter,
    /// Origins allowed credentialed cross-site requests
    pub cors_allowed_origins: Arc<[String]>,
}

impl AppState {
    pub fn new(storage: FileStorage, gate: AuthGate) -> Self {
        Self {
            storage: Arc::new(storage),
            gate: Arc::new(gate),
            google: None,
            assets: None,
            write_lock: Arc::new(Mutex::new(())),
            admin_emails: Arc::from(Vec::new()),
            auth_limiter: RateLimiter::new(RateLimitConfig::default()),
            cors_allowed_origins: Arc::from(Vec::new()),
        }
    }

    /// Emails must already be normalized.
    pub fn with_admin_emails(mut self, emails: Vec<String>) -> Self {
        self.admin_emails = Arc::from(emails);
        self
    }

    pub fn with_auth_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.auth_limiter = RateLimiter::new(config);
        self
    }

    pub fn with_cors_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_allowed_origins = Arc::from(origins);
        self
    }

    /// Role a newly created account starts with.
    pub fn initial_role(&self, email: &str) -> Role {
        if self.admin_emails.iter().any(|admin| admin == email) {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn with_google(mut self, verifier: GoogleVerifier) -> Self {
        self.google = Some(Arc::new(verifier));
        self
    }

    pub fn with_assets(mut self, client: CloudinaryClient) -> Self {
        self.assets = Some(Arc::new(client));
        self
    }

    /// Upload an optional file, returning its public URL.
    pub async fn upload_image(
        &self,
        file: Option<FileUpload>,
        folder: &str,
    ) -> Result<Option<String>, UploadError> {
        let Some(file) = file else {
            return Ok(None);
        };
        let client = self.assets.as_ref().ok_or(UploadError::NotConfigured)?;
        let UploadedAsset { secure_url, .. } = client.upload(file, folder).await?;
        Ok(Some(secure_url))
    }
}

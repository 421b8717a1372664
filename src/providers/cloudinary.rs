// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Cloudinary image uploads.
//!
//! Uploads are signed: the sorted upload parameters are joined as
//! `k=v&k=v`, the API secret is appended, and the SHA-256 hex digest is sent
//! as `signature` with `signature_algorithm=sha256`.

use std::time::Duration;

use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::config::CloudinaryConfig;

const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com/v1_1";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("image uploads are not configured")]
    NotConfigured,

    #[error("Cloudinary request failed: {0}")]
    Request(String),

    #[error("Cloudinary rejected the upload: {0}")]
    Rejected(String),

    #[error("Cloudinary response was invalid: {0}")]
    InvalidResponse(String),
}

/// A file received in a multipart request.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadedAsset {
    pub secure_url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorDetail,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct CloudinaryClient {
    api_base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    http: Client,
}

impl CloudinaryClient {
    pub fn new(config: &CloudinaryConfig) -> Result<Self, UploadError> {
        let http = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| UploadError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", self.api_base_url, self.cloud_name)
    }

    /// Upload an image into `folder` and return its public URL.
    pub async fn upload(&self, file: FileUpload, folder: &str) -> Result<UploadedAsset, UploadError> {
        let timestamp = Utc::now().timestamp().to_string();
        let params = [("folder", folder), ("timestamp", timestamp.as_str())];
        let signature = sign_params(&params, &self.api_secret);

        let mut part = multipart::Part::bytes(file.bytes)
            .file_name(file.filename.unwrap_or_else(|| "upload".to_string()));
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| UploadError::Request(format!("invalid content type: {e}")))?;
        }

        let form = multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("folder", folder.to_string())
            .text("timestamp", timestamp.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .http
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Request(e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<CloudinaryErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(UploadError::Rejected(detail));
        }

        let asset: UploadedAsset = serde_json::from_str(&body)
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
        info!(folder, public_id = %asset.public_id, "Image uploaded");
        Ok(asset)
    }
}

/// Signature over upload parameters, sorted by name.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

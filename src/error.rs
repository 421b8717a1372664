// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Centralized error responder.
//!
//! Every failure a handler or the auth gate produces converts into an
//! [`ApiError`], which renders `{"message": ..., "error_code": ...}` with the
//! matching status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::providers::UploadError;
use crate::storage::StorageError;
use crate::validation::ValidationError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    pub error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "insufficient_permissions", message)
    }

    /// Internal failure. The detail is logged, never sent to the client.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.status, self.code, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error_code = self.code, message = %self.message, "Request failed");
        }
        let body = Json(ErrorBody {
            message: self.message,
            error_code: self.code.to_string(),
        });
        (self.status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = err.status_code();
        let code = err.error_code();
        let message = match &err {
            AuthError::JwksFetchError(_) | AuthError::InternalError(_) => {
                tracing::error!(error = %err, "Authentication backend failure");
                "Internal server error".to_string()
            }
            _ => err.to_string(),
        };
        Self::new(status, code, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::unprocessable(err.message)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => Self::not_found(format!("{what} not found")),
            StorageError::AlreadyExists(what) => Self::conflict(format!("{what} already exists")),
            StorageError::PermissionDenied { resource, .. } => {
                Self::forbidden(format!("You are not allowed to modify this {resource}"))
            }
            other => Self::internal(other),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        tracing::error!(error = %err, "Image upload failed");
        match err {
            UploadError::NotConfigured => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "upload_not_configured",
                "Image uploads are not configured",
            ),
            _ => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "upload_failed",
                "Image upload failed",
            ),
        }
    }
}

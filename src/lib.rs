// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Sojo News - content management REST backend
//!
//! Accounts, categories, posts and bookmarks over a JSON document store,
//! with every protected request authorized by a stateless HS256 token.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token codec, token extraction and the auth gate
//! - `providers` - Cloudinary image uploads
//! - `storage` - JSON documents under `DATA_DIR`

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod providers;
pub mod state;
pub mod storage;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use tempfile::TempDir;

    use crate::auth::AuthGate;
    use crate::config::AuthConfig;
    use crate::state::AppState;
    use crate::storage::{FileStorage, StoragePaths};

    pub const TEST_SECRET: &[u8] = b"test-secret";

    /// State over a fresh temporary data directory. Keep the `TempDir` alive
    /// for the duration of the test.
    pub fn test_state() -> (AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(dir.path()));
        storage.initialize().unwrap();
        let gate = AuthGate::from_config(&AuthConfig::new(TEST_SECRET, Duration::from_secs(3600)));
        (AppState::new(storage, gate), dir)
    }
}

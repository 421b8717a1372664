// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! # Storage Module
//!
//! Persistent storage as JSON documents under `DATA_DIR`.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   users/{user_id}.json
//!   categories/{category_id}.json
//!   posts/{post_id}.json
//!   bookmarks/{bookmark_id}.json
//! ```
//!
//! Uniqueness rules (user email, post slug, one bookmark per user and post)
//! are checked by the repositories. Handlers serialize check-then-write
//! sequences with the write lock in `AppState`.

pub mod file_store;
pub mod ownership;
pub mod paths;
pub mod repository;

pub use file_store::{FileStorage, StorageError, StorageResult};
pub use ownership::{OwnedResource, OwnershipEnforcer};
pub use paths::StoragePaths;
pub use repository::{
    slugify, BookmarkRepository, CategoryRepository, PostRepository, StoredBookmark,
    StoredCategory, StoredPost, StoredUser, UserRepository,
};

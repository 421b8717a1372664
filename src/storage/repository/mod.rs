// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Repository layer providing typed access to the document store.
//!
//! Each repository provides CRUD operations for one record type, using
//! [`FileStorage`](super::FileStorage) for all file operations.

pub mod bookmarks;
pub mod categories;
pub mod posts;
pub mod users;

pub use bookmarks::{BookmarkRepository, StoredBookmark};
pub use categories::{CategoryRepository, StoredCategory};
pub use posts::{slugify, PostRepository, StoredPost};
pub use users::{StoredUser, UserRepository};

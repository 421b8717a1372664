// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Post bookmarks.
//!
//! A bookmark links one user to one post; a user bookmarks a post at most
//! once. Each bookmark is stored as a separate JSON file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{FileStorage, OwnedResource, StorageError, StorageResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredBookmark {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

impl OwnedResource for StoredBookmark {
    fn owner_user_id(&self) -> &str {
        &self.user_id
    }

    fn resource_kind(&self) -> &'static str {
        "bookmark"
    }
}

pub struct BookmarkRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> BookmarkRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn exists(&self, bookmark_id: &str) -> bool {
        self.storage.exists(self.storage.paths().bookmark(bookmark_id))
    }

    pub fn get(&self, bookmark_id: &str) -> StorageResult<StoredBookmark> {
        let path = self.storage.paths().bookmark(bookmark_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Bookmark {bookmark_id}")));
        }
        self.storage.read_json(path)
    }

    /// Create a bookmark. Fails if the user already bookmarked the post.
    pub fn create(&self, bookmark: &StoredBookmark) -> StorageResult<()> {
        if self.exists(&bookmark.id) {
            return Err(StorageError::AlreadyExists(format!("Bookmark {}", bookmark.id)));
        }
        if self.find(&bookmark.user_id, &bookmark.post_id)?.is_some() {
            return Err(StorageError::AlreadyExists(format!(
                "Bookmark for post {}",
                bookmark.post_id
            )));
        }
        self.storage
            .write_json(self.storage.paths().bookmark(&bookmark.id), bookmark)
    }

    pub fn delete(&self, bookmark_id: &str) -> StorageResult<()> {
        if !self.exists(bookmark_id) {
            return Err(StorageError::NotFound(format!("Bookmark {bookmark_id}")));
        }
        self.storage.delete(self.storage.paths().bookmark(bookmark_id))
    }

    /// Bookmarks owned by a user, newest first.
    pub fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<StoredBookmark>> {
        let mut bookmarks: Vec<StoredBookmark> = self
            .storage
            .read_all::<StoredBookmark>(self.storage.paths().bookmarks_dir())?
            .into_iter()
            .filter(|b| b.user_id == user_id)
            .collect();
        bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookmarks)
    }

    pub fn find(&self, user_id: &str, post_id: &str) -> StorageResult<Option<StoredBookmark>> {
        Ok(self
            .list_by_owner(user_id)?
            .into_iter()
            .find(|b| b.post_id == post_id))
    }

    /// Fetch a bookmark only if `user_id` owns it; otherwise it does not exist.
    pub fn get_owned(&self, bookmark_id: &str, user_id: &str) -> StorageResult<StoredBookmark> {
        let bookmark = self.get(bookmark_id)?;
        if bookmark.user_id != user_id {
            return Err(StorageError::NotFound(format!("Bookmark {bookmark_id}")));
        }
        Ok(bookmark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn test_storage() -> (FileStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(dir.path()));
        storage.initialize().unwrap();
        (storage, dir)
    }

    fn bookmark(id: &str, user_id: &str, post_id: &str) -> StoredBookmark {
        StoredBookmark {
            id: id.to_string(),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_list_by_owner() {
        let (storage, _dir) = test_storage();
        let repo = BookmarkRepository::new(&storage);

        repo.create(&bookmark("b1", "u1", "p1")).unwrap();
        repo.create(&bookmark("b2", "u1", "p2")).unwrap();
        repo.create(&bookmark("b3", "u2", "p1")).unwrap();

        assert_eq!(repo.list_by_owner("u1").unwrap().len(), 2);
        assert_eq!(repo.list_by_owner("u2").unwrap().len(), 1);
        assert!(repo.list_by_owner("u3").unwrap().is_empty());
    }

    #[test]
    fn same_post_twice_is_rejected() {
        let (storage, _dir) = test_storage();
        let repo = BookmarkRepository::new(&storage);

        repo.create(&bookmark("b1", "u1", "p1")).unwrap();
        let result = repo.create(&bookmark("b2", "u1", "p1"));
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn foreign_bookmark_looks_missing() {
        let (storage, _dir) = test_storage();
        let repo = BookmarkRepository::new(&storage);

        repo.create(&bookmark("b1", "u1", "p1")).unwrap();
        assert!(repo.get_owned("b1", "u1").is_ok());
        assert!(matches!(repo.get_owned("b1", "u2"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn delete_removes_bookmark() {
        let (storage, _dir) = test_storage();
        let repo = BookmarkRepository::new(&storage);

        repo.create(&bookmark("b1", "u1", "p1")).unwrap();
        repo.delete("b1").unwrap();
        assert!(!repo.exists("b1"));
        assert!(matches!(repo.delete("b1"), Err(StorageError::NotFound(_))));
    }
}

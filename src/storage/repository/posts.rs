// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Post records.
//!
//! Every post carries a slug derived from its title; slugs are unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::super::{FileStorage, OwnedResource, StorageError, StorageResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredPost {
    pub id: String,
    pub title: String,
    pub description: String,
    pub slug: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub image_link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_id: String,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for StoredPost {
    fn owner_user_id(&self) -> &str {
        &self.author_id
    }

    fn resource_kind(&self) -> &'static str {
        "post"
    }
}

/// Lowercase ASCII slug: accents folded, runs of anything else become `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.nfkd() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_ascii() || c.is_whitespace() {
            pending_dash = true;
        }
        // Non-ASCII leftovers after decomposition are combining marks or
        // scripts without an ASCII form; they are dropped.
    }
    slug
}

pub struct PostRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> PostRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn exists(&self, post_id: &str) -> bool {
        self.storage.exists(self.storage.paths().post(post_id))
    }

    pub fn get(&self, post_id: &str) -> StorageResult<StoredPost> {
        let path = self.storage.paths().post(post_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Post {post_id}")));
        }
        self.storage.read_json(path)
    }

    /// All posts, newest first.
    pub fn list(&self) -> StorageResult<Vec<StoredPost>> {
        let mut posts: Vec<StoredPost> = self.storage.read_all(self.storage.paths().posts_dir())?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(posts)
    }

    pub fn find_by_slug(&self, slug: &str) -> StorageResult<Option<StoredPost>> {
        Ok(self.list()?.into_iter().find(|p| p.slug == slug))
    }

    /// Create a post. Fails if the id or the slug is taken.
    pub fn create(&self, post: &StoredPost) -> StorageResult<()> {
        if self.exists(&post.id) {
            return Err(StorageError::AlreadyExists(format!("Post {}", post.id)));
        }
        self.ensure_slug_free(&post.slug, &post.id)?;
        self.storage.write_json(self.storage.paths().post(&post.id), post)
    }

    pub fn update(&self, post: &StoredPost) -> StorageResult<StoredPost> {
        if !self.exists(&post.id) {
            return Err(StorageError::NotFound(format!("Post {}", post.id)));
        }
        self.ensure_slug_free(&post.slug, &post.id)?;
        let mut updated = post.clone();
        updated.updated_at = Utc::now();
        self.storage.write_json(self.storage.paths().post(&post.id), &updated)?;
        Ok(updated)
    }

    pub fn delete(&self, post_id: &str) -> StorageResult<StoredPost> {
        let post = self.get(post_id)?;
        self.storage.delete(self.storage.paths().post(post_id))?;
        Ok(post)
    }

    /// Fails if a post other than `post_id` already uses `slug`.
    pub fn ensure_slug_free(&self, slug: &str, post_id: &str) -> StorageResult<()> {
        match self.find_by_slug(slug)? {
            Some(other) if other.id != post_id => {
                Err(StorageError::AlreadyExists(format!("Post with slug {slug}")))
            }
            _ => Ok(()),
        }
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

    fn post(id: &str, title: &str) -> StoredPost {
        let now = Utc::now();
        StoredPost {
            id: id.to_string(),
            title: title.to_string(),
            description: "body".to_string(),
            slug: slugify(title),
            is_published: false,
            image_link: None,
            tags: vec!["news".to_string()],
            author_id: "author-1".to_string(),
            category_id: "cat-1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn slugify_folds_and_collapses() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Café   Société  "), "cafe-societe");
        assert_eq!(slugify("Rust 2024 -- edition"), "rust-2024-edition");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn duplicate_slug_is_rejected() {
        let (storage, _dir) = test_storage();
        let repo = PostRepository::new(&storage);

        repo.create(&post("p1", "Breaking News")).unwrap();
        let result = repo.create(&post("p2", "breaking news!"));
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn update_keeps_own_slug_but_not_others() {
        let (storage, _dir) = test_storage();
        let repo = PostRepository::new(&storage);

        let mut first = post("p1", "First");
        repo.create(&first).unwrap();
        repo.create(&post("p2", "Second")).unwrap();

        first.description = "edited".to_string();
        repo.update(&first).unwrap();

        first.slug = "second".to_string();
        assert!(matches!(repo.update(&first), Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn delete_returns_removed_post() {
        let (storage, _dir) = test_storage();
        let repo = PostRepository::new(&storage);

        repo.create(&post("p1", "First")).unwrap();
        assert_eq!(repo.delete("p1").unwrap().slug, "first");
        assert!(repo.list().unwrap().is_empty());
    }
}

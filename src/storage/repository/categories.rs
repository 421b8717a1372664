// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Category records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{FileStorage, StorageError, StorageResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredCategory {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct CategoryRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> CategoryRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn exists(&self, category_id: &str) -> bool {
        self.storage.exists(self.storage.paths().category(category_id))
    }

    pub fn get(&self, category_id: &str) -> StorageResult<StoredCategory> {
        let path = self.storage.paths().category(category_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Category {category_id}")));
        }
        self.storage.read_json(path)
    }

    /// All categories, oldest first.
    pub fn list(&self) -> StorageResult<Vec<StoredCategory>> {
        let mut categories: Vec<StoredCategory> =
            self.storage.read_all(self.storage.paths().categories_dir())?;
        categories.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    pub fn create(&self, category: &StoredCategory) -> StorageResult<()> {
        if self.exists(&category.id) {
            return Err(StorageError::AlreadyExists(format!("Category {}", category.id)));
        }
        self.storage
            .write_json(self.storage.paths().category(&category.id), category)
    }

    pub fn update(&self, category: &StoredCategory) -> StorageResult<StoredCategory> {
        if !self.exists(&category.id) {
            return Err(StorageError::NotFound(format!("Category {}", category.id)));
        }
        let mut updated = category.clone();
        updated.updated_at = Utc::now();
        self.storage
            .write_json(self.storage.paths().category(&category.id), &updated)?;
        Ok(updated)
    }

    /// Delete and return the removed record.
    pub fn delete(&self, category_id: &str) -> StorageResult<StoredCategory> {
        let category = self.get(category_id)?;
        self.storage.delete(self.storage.paths().category(category_id))?;
        Ok(category)
    }
}

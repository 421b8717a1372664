// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Path layout of the document store.

use std::path::{Path, PathBuf};

use crate::config::DEFAULT_DATA_DIR;

#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl StoragePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every collection directory, in creation order.
    pub fn collection_dirs(&self) -> [PathBuf; 4] {
        [
            self.users_dir(),
            self.categories_dir(),
            self.posts_dir(),
            self.bookmarks_dir(),
        ]
    }

    // ========== Users ==========

    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    pub fn user(&self, user_id: &str) -> PathBuf {
        self.users_dir().join(format!("{user_id}.json"))
    }

    // ========== Categories ==========

    pub fn categories_dir(&self) -> PathBuf {
        self.root.join("categories")
    }

    pub fn category(&self, category_id: &str) -> PathBuf {
        self.categories_dir().join(format!("{category_id}.json"))
    }

    // ========== Posts ==========

    pub fn posts_dir(&self) -> PathBuf {
        self.root.join("posts")
    }

    pub fn post(&self, post_id: &str) -> PathBuf {
        self.posts_dir().join(format!("{post_id}.json"))
    }

    // ========== Bookmarks ==========

    pub fn bookmarks_dir(&self) -> PathBuf {
        self.root.join("bookmarks")
    }

    pub fn bookmark(&self, bookmark_id: &str) -> PathBuf {
        self.bookmarks_dir().join(format!("{bookmark_id}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_dir() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("./data"));
    }

    #[test]
    fn record_paths_are_one_file_per_id() {
        let paths = StoragePaths::new("/tmp/sojo");
        assert_eq!(paths.user("u1"), PathBuf::from("/tmp/sojo/users/u1.json"));
        assert_eq!(paths.category("c1"), PathBuf::from("/tmp/sojo/categories/c1.json"));
        assert_eq!(paths.post("p1"), PathBuf::from("/tmp/sojo/posts/p1.json"));
        assert_eq!(paths.bookmark("b1"), PathBuf::from("/tmp/sojo/bookmarks/b1.json"));
    }
}

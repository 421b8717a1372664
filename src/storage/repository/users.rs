// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! User records.
//!
//! Emails are stored normalized and are unique across users. Callers hold
//! the application write lock around check-then-create sequences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{FileStorage, StorageError, StorageResult};
use crate::auth::{CredentialClaims, Role};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    pub id: String,
    pub name: String,
    /// Normalized (trimmed, NFKC, lowercase)
    pub email: String,
    /// Argon2id PHC string; absent for Google-only accounts
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub image_link: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub view_sensitive: bool,
    #[serde(default)]
    pub view_political: bool,
    #[serde(default)]
    pub relevant_categories: Vec<String>,
    /// Google `sub` once the account has signed in with Google
    #[serde(default)]
    pub google_subject: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    /// A fresh verified `user`-role account.
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            password_hash: None,
            image_link: None,
            verified: true,
            role: Role::User,
            gender: None,
            occupation: None,
            view_sensitive: false,
            view_political: false,
            relevant_categories: Vec::new(),
            google_subject: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Claims a token is issued with for this user.
    pub fn credential_claims(&self) -> CredentialClaims {
        CredentialClaims::new(self.id.clone(), self.email.clone(), self.role)
    }
}

pub struct UserRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> UserRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn exists(&self, user_id: &str) -> bool {
        self.storage.exists(self.storage.paths().user(user_id))
    }

    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        let path = self.storage.paths().user(user_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.storage.read_json(path)
    }

    pub fn list(&self) -> StorageResult<Vec<StoredUser>> {
        self.storage.read_all(self.storage.paths().users_dir())
    }

    /// Look up by normalized email.
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        Ok(self.list()?.into_iter().find(|u| u.email == email))
    }

    pub fn find_by_google_subject(&self, subject: &str) -> StorageResult<Option<StoredUser>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|u| u.google_subject.as_deref() == Some(subject)))
    }

    /// Create a user. Fails if the id or the email is taken.
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        if self.exists(&user.id) {
            return Err(StorageError::AlreadyExists(format!("User {}", user.id)));
        }
        if self.find_by_email(&user.email)?.is_some() {
            return Err(StorageError::AlreadyExists(format!("Email {}", user.email)));
        }
        self.storage.write_json(self.storage.paths().user(&user.id), user)
    }

    /// Replace an existing user, bumping `updated_at`.
    pub fn update(&self, user: &StoredUser) -> StorageResult<StoredUser> {
        if !self.exists(&user.id) {
            return Err(StorageError::NotFound(format!("User {}", user.id)));
        }
        let mut updated = user.clone();
        updated.updated_at = Utc::now();
        self.storage.write_json(self.storage.paths().user(&user.id), &updated)?;
        Ok(updated)
    }

    /// Raise listed accounts to `admin`, leaving higher roles alone.
    /// Returns the ids that changed.
    pub fn promote_admins(&self, emails: &[String]) -> StorageResult<Vec<String>> {
        let mut promoted = Vec::new();
        for mut user in self.list()? {
            if user.role.has_privilege(Role::Admin) || !emails.contains(&user.email) {
                continue;
            }
            user.role = Role::Admin;
            self.update(&user)?;
            promoted.push(user.id);
        }
        Ok(promoted)
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

    #[test]
    fn create_and_get_user() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let mut user = StoredUser::new("u1", "a@b.com", "a");
        user.password_hash = Some("$argon2id$stub".to_string());
        repo.create(&user).unwrap();

        let loaded = repo.get("u1").unwrap();
        assert_eq!(loaded, user);
        assert_eq!(repo.find_by_email("a@b.com").unwrap().unwrap().id, "u1");
        assert!(repo.find_by_email("other@b.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        repo.create(&StoredUser::new("u1", "a@b.com", "a")).unwrap();
        let result = repo.create(&StoredUser::new("u2", "a@b.com", "a"));
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn update_requires_existing_user() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let mut user = StoredUser::new("u1", "a@b.com", "a");
        assert!(matches!(repo.update(&user), Err(StorageError::NotFound(_))));

        repo.create(&user).unwrap();
        user.occupation = Some("editor".to_string());
        let updated = repo.update(&user).unwrap();
        assert!(updated.updated_at >= user.updated_at);
        assert_eq!(repo.get("u1").unwrap().occupation.as_deref(), Some("editor"));
    }

    #[test]
    fn google_subject_lookup() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let mut user = StoredUser::new("u1", "a@gmail.com", "a");
        user.google_subject = Some("g-123".to_string());
        repo.create(&user).unwrap();

        assert_eq!(repo.find_by_google_subject("g-123").unwrap().unwrap().id, "u1");
        assert!(repo.find_by_google_subject("g-999").unwrap().is_none());
    }

    #[test]
    fn promote_admins_only_raises_listed_users() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        repo.create(&StoredUser::new("u1", "editor@news.com", "editor")).unwrap();
        repo.create(&StoredUser::new("u2", "reader@news.com", "reader")).unwrap();
        let mut owner = StoredUser::new("u3", "owner@news.com", "owner");
        owner.role = Role::SuperAdmin;
        repo.create(&owner).unwrap();

        let listed = vec!["editor@news.com".to_string(), "owner@news.com".to_string()];
        assert_eq!(repo.promote_admins(&listed).unwrap(), vec!["u1".to_string()]);
        assert_eq!(repo.get("u1").unwrap().role, Role::Admin);
        assert_eq!(repo.get("u2").unwrap().role, Role::User);
        assert_eq!(repo.get("u3").unwrap().role, Role::SuperAdmin);

        assert!(repo.promote_admins(&listed).unwrap().is_empty());
    }

    #[test]
    fn credential_claims_mirror_the_record() {
        let mut user = StoredUser::new("u1", "a@b.com", "a");
        user.role = Role::Admin;
        let claims = user.credential_claims();
        assert_eq!(claims.subject_id, "u1");
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.role, Role::Admin);
    }
}

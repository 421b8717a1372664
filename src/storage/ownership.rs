// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Ownership checks for user-authored records.

use crate::auth::AuthenticatedUser;

use super::{StorageError, StorageResult};

/// Records that belong to a single user.
pub trait OwnedResource {
    fn owner_user_id(&self) -> &str;

    /// Short label used in permission errors ("post", "bookmark").
    fn resource_kind(&self) -> &'static str;
}

pub trait OwnershipEnforcer {
    /// Only the owner passes.
    fn verify_ownership(&self, user: &AuthenticatedUser) -> StorageResult<()>;

    /// The owner or any admin passes.
    fn verify_owner_or_admin(&self, user: &AuthenticatedUser) -> StorageResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, user: &AuthenticatedUser) -> StorageResult<()> {
        if self.owner_user_id() == user.user_id {
            Ok(())
        } else {
            Err(StorageError::PermissionDenied {
                user_id: user.user_id.clone(),
                resource: self.resource_kind().to_string(),
            })
        }
    }

    fn verify_owner_or_admin(&self, user: &AuthenticatedUser) -> StorageResult<()> {
        if user.is_admin() {
            return Ok(());
        }
        self.verify_ownership(user)
    }
}

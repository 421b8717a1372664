// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

use axum::{extract::State, Json};

use super::extract::ValidatedJson;
use crate::{
    auth::{Auth, AuthError},
    error::ApiError,
    models::{ProfileChanges, UpdateUserRequest, UserResponse},
    state::AppState,
    storage::{CategoryRepository, UserRepository},
};

/// Update the caller's own profile.
///
/// Changing `role` needs an admin token, and nobody can grant a role above
/// their own.
#[utoipa::path(
    put,
    path = "/api/user",
    request_body = UpdateUserRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserResponse),
        (status = 403, description = "Role change not allowed", body = crate::error::ErrorBody),
        (status = 404, body = crate::error::ErrorBody),
        (status = 422, body = crate::error::ErrorBody)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Auth(caller): Auth,
    ValidatedJson(changes): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let ProfileChanges {
        name,
        image_link,
        gender,
        occupation,
        view_sensitive,
        view_political,
        relevant_categories,
        role,
    } = changes;

    if let Some(role) = role {
        if !caller.is_admin() || !caller.has_role(role) {
            return Err(AuthError::InsufficientPermissions.into());
        }
    }
    if let Some(ids) = &relevant_categories {
        let categories = CategoryRepository::new(&state.storage);
        for id in ids {
            categories.get(id)?;
        }
    }

    let users = UserRepository::new(&state.storage);
    let mut user = users.get(&caller.user_id)?;

    if let Some(name) = name {
        user.name = name;
    }
    if let Some(link) = image_link {
        user.image_link = Some(link);
    }
    if let Some(gender) = gender {
        user.gender = Some(gender);
    }
    if let Some(occupation) = occupation {
        user.occupation = Some(occupation);
    }
    if let Some(flag) = view_sensitive {
        user.view_sensitive = flag;
    }
    if let Some(flag) = view_political {
        user.view_political = flag;
    }
    if let Some(ids) = relevant_categories {
        user.relevant_categories = ids;
    }
    if let Some(role) = role {
        user.role = role;
    }

    let user = users.update(&user)?;
    Ok(Json(UserResponse {
        message: "user updated successfully.".to_string(),
        user: user.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::storage::StoredUser;
    use crate::test_support::test_state;
    use axum::http::StatusCode;

    fn seed(state: &AppState, id: &str, role: Role) -> Auth {
        let mut user = StoredUser::new(id, format!("{id}@news.com"), id);
        user.role = role;
        UserRepository::new(&state.storage).create(&user).unwrap();
        Auth(AuthenticatedUser {
            user_id: id.into(),
            email: user.email,
            role,
            issued_at: 0,
            expires_at: 0,
        })
    }

    #[tokio::test]
    async fn updates_profile_fields() {
        let (state, _dir) = test_state();
        let caller = seed(&state, "u1", Role::User);
        let changes = ProfileChanges {
            name: Some("Ada".into()),
            occupation: Some("Editor".into()),
            view_political: Some(true),
            ..Default::default()
        };

        let Json(response) = update_user(State(state), caller, ValidatedJson(changes))
            .await
            .unwrap();
        assert_eq!(response.message, "user updated successfully.");
        assert_eq!(response.user.name, "Ada");
        assert_eq!(response.user.occupation.as_deref(), Some("Editor"));
        assert!(response.user.view_political);
        assert!(!response.user.view_sensitive);
    }

    #[tokio::test]
    async fn role_change_needs_admin() {
        let (state, _dir) = test_state();
        let caller = seed(&state, "u1", Role::User);
        let changes = ProfileChanges {
            role: Some(Role::Admin),
            ..Default::default()
        };
        let err = update_user(State(state.clone()), caller, ValidatedJson(changes))
            .await
            .err()
            .unwrap();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let admin = seed(&state, "a1", Role::Admin);
        let changes = ProfileChanges {
            role: Some(Role::SuperAdmin),
            ..Default::default()
        };
        let err = update_user(State(state), admin, ValidatedJson(changes))
            .await
            .err()
            .unwrap();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_relevant_category_is_404() {
        let (state, _dir) = test_state();
        let caller = seed(&state, "u1", Role::User);
        let changes = ProfileChanges {
            relevant_categories: Some(vec![uuid::Uuid::new_v4().to_string()]),
            ..Default::default()
        };
        let err = update_user(State(state), caller, ValidatedJson(changes))
            .await
            .err()
            .unwrap();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}

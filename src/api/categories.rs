// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use uuid::Uuid;

use super::extract::{RecordId, ValidatedForm};
use crate::{
    auth::AdminOnly,
    error::ApiError,
    models::{Category, CategoryListResponse, CategoryRequest, CategoryResponse},
    state::AppState,
    storage::{CategoryRepository, StoredCategory},
};

const IMAGE_FOLDER: &str = "category";

#[utoipa::path(
    get,
    path = "/api/category",
    tag = "Categories",
    responses((status = 200, body = CategoryListResponse))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let categories = CategoryRepository::new(&state.storage).list()?;
    Ok(Json(CategoryListResponse {
        message: "categories fetched successfully.".to_string(),
        categories: categories.into_iter().map(Category::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/category/{id}",
    params(("id" = String, Path, description = "Category id")),
    tag = "Categories",
    responses(
        (status = 200, body = CategoryResponse),
        (status = 404, body = crate::error::ErrorBody)
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = CategoryRepository::new(&state.storage).get(&id)?;
    Ok(Json(CategoryResponse {
        message: "category fetched successfully.".to_string(),
        category: category.into(),
    }))
}

/// Create a category. Accepts JSON or a form with an optional `file` image.
#[utoipa::path(
    post,
    path = "/api/category",
    request_body = CategoryRequest,
    tag = "Categories",
    security(("bearer" = [])),
    responses(
        (status = 201, body = CategoryResponse),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorBody),
        (status = 422, body = crate::error::ErrorBody)
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    ValidatedForm(changes, file): ValidatedForm<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let new = changes.into_new()?;
    let image_link = state.upload_image(file, IMAGE_FOLDER).await?;

    let now = Utc::now();
    let category = StoredCategory {
        id: Uuid::new_v4().to_string(),
        title: new.title,
        description: new.description,
        image_link,
        created_at: now,
        updated_at: now,
    };
    CategoryRepository::new(&state.storage).create(&category)?;
    tracing::info!(category_id = %category.id, admin_id = %admin.user_id, "Category created");

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            message: "category created successfully.".to_string(),
            category: category.into(),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/category/{id}",
    params(("id" = String, Path, description = "Category id")),
    request_body = CategoryRequest,
    tag = "Categories",
    security(("bearer" = [])),
    responses(
        (status = 200, body = CategoryResponse),
        (status = 403, body = crate::error::ErrorBody),
        (status = 404, body = crate::error::ErrorBody)
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    AdminOnly(_admin): AdminOnly,
    RecordId(id): RecordId,
    ValidatedForm(changes, file): ValidatedForm<CategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let _guard = state.write_lock.lock().await;
    let categories = CategoryRepository::new(&state.storage);
    let mut category = categories.get(&id)?;

    if let Some(title) = changes.title {
        category.title = title;
    }
    if let Some(description) = changes.description {
        category.description = description;
    }
    if let Some(link) = state.upload_image(file, IMAGE_FOLDER).await? {
        category.image_link = Some(link);
    }

    let category = categories.update(&category)?;
    Ok(Json(CategoryResponse {
        message: "category updated successfully.".to_string(),
        category: category.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/category/{id}",
    params(("id" = String, Path, description = "Category id")),
    tag = "Categories",
    security(("bearer" = [])),
    responses(
        (status = 200, body = CategoryResponse),
        (status = 403, body = crate::error::ErrorBody),
        (status = 404, body = crate::error::ErrorBody)
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    RecordId(id): RecordId,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = CategoryRepository::new(&state.storage).delete(&id)?;
    tracing::info!(category_id = %id, admin_id = %admin.user_id, "Category deleted");
    Ok(Json(CategoryResponse {
        message: "category deleted successfully.".to_string(),
        category: category.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::models::CategoryChanges;
    use crate::test_support::test_state;

    fn admin() -> AdminOnly {
        AdminOnly(AuthenticatedUser {
            user_id: "admin-1".into(),
            email: "admin@news.com".into(),
            role: Role::Admin,
            issued_at: 0,
            expires_at: 0,
        })
    }

    fn changes(title: Option<&str>, description: Option<&str>) -> CategoryChanges {
        CategoryChanges {
            title: title.map(str::to_string),
            description: description.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn create_update_delete_category() {
        let (state, _dir) = test_state();

        let (status, Json(created)) = create_category(
            State(state.clone()),
            admin(),
            ValidatedForm(changes(Some("World"), Some("World news")), None),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.message, "category created successfully.");
        let id = created.category.id.clone();

        let Json(updated) = update_category(
            State(state.clone()),
            admin(),
            RecordId(id.clone()),
            ValidatedForm(changes(Some("Global"), None), None),
        )
        .await
        .unwrap();
        assert_eq!(updated.category.title, "Global");
        assert_eq!(updated.category.description, "World news");

        let Json(list) = list_categories(State(state.clone())).await.unwrap();
        assert_eq!(list.categories.len(), 1);

        delete_category(State(state.clone()), admin(), RecordId(id.clone()))
            .await
            .unwrap();
        let err = get_category(State(state), RecordId(id)).await.err().unwrap();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_requires_description() {
        let (state, _dir) = test_state();
        let err = create_category(
            State(state),
            admin(),
            ValidatedForm(changes(Some("World"), None), None),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn image_without_upload_config_fails() {
        let (state, _dir) = test_state();
        let file = crate::providers::FileUpload {
            filename: Some("w.png".into()),
            content_type: Some("image/png".into()),
            bytes: vec![1, 2, 3],
        };
        let err = create_category(
            State(state),
            admin(),
            ValidatedForm(changes(Some("World"), Some("News")), Some(file)),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "upload_not_configured");
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Post endpoints. All of them sit behind the auth gate; changing or deleting
//! a post is limited to its author and admins.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use uuid::Uuid;

use super::extract::{RecordId, ValidatedForm};
use crate::{
    auth::{Auth, AuthError},
    error::ApiError,
    models::{CreatePostRequest, Post, PostListResponse, PostResponse, UpdatePostRequest},
    state::AppState,
    storage::{
        slugify, CategoryRepository, OwnershipEnforcer, PostRepository, StoredPost, UserRepository,
    },
    validation::ValidationError,
};

const IMAGE_FOLDER: &str = "post";

#[utoipa::path(
    get,
    path = "/api/post",
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, body = PostListResponse),
        (status = 401, body = crate::error::ErrorBody)
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Auth(_caller): Auth,
) -> Result<Json<PostListResponse>, ApiError> {
    let posts = PostRepository::new(&state.storage).list()?;
    Ok(Json(PostListResponse {
        message: "posts fetched successfully.".to_string(),
        posts: posts.into_iter().map(Post::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/post/{id}",
    params(("id" = String, Path, description = "Post id")),
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, body = PostResponse),
        (status = 404, body = crate::error::ErrorBody)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Auth(_caller): Auth,
    RecordId(id): RecordId,
) -> Result<Json<PostResponse>, ApiError> {
    let post = PostRepository::new(&state.storage).get(&id)?;
    Ok(Json(PostResponse {
        message: "post fetched successfully.".to_string(),
        post: post.into(),
    }))
}

/// Create a post. Only admins may publish on behalf of another author.
#[utoipa::path(
    post,
    path = "/api/post",
    request_body = CreatePostRequest,
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 201, body = PostResponse),
        (status = 403, body = crate::error::ErrorBody),
        (status = 404, description = "Unknown category or author", body = crate::error::ErrorBody),
        (status = 409, description = "Slug already taken", body = crate::error::ErrorBody)
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    Auth(caller): Auth,
    ValidatedForm(new, file): ValidatedForm<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let slug = slug_for(&new.title)?;
    let id = Uuid::new_v4().to_string();

    // Held until the post is written; conflicts surface before any upload.
    let _guard = state.write_lock.lock().await;
    let author_id = match new.author {
        Some(author) if author != caller.user_id => {
            if !caller.is_admin() {
                return Err(AuthError::InsufficientPermissions.into());
            }
            UserRepository::new(&state.storage).get(&author)?;
            author
        }
        _ => caller.user_id.clone(),
    };
    CategoryRepository::new(&state.storage).get(&new.category)?;
    let posts = PostRepository::new(&state.storage);
    posts.ensure_slug_free(&slug, &id)?;

    let image_link = state.upload_image(file, IMAGE_FOLDER).await?;
    let now = Utc::now();
    let post = StoredPost {
        id,
        title: new.title,
        description: new.description,
        slug,
        is_published: new.is_published,
        image_link,
        tags: new.tags,
        author_id,
        category_id: new.category,
        created_at: now,
        updated_at: now,
    };
    posts.create(&post)?;
    tracing::info!(post_id = %post.id, author_id = %post.author_id, "Post created");

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: "post created successfully.".to_string(),
            post: post.into(),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/post/{id}",
    params(("id" = String, Path, description = "Post id")),
    request_body = UpdatePostRequest,
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, body = PostResponse),
        (status = 403, description = "Caller is neither author nor admin", body = crate::error::ErrorBody),
        (status = 404, body = crate::error::ErrorBody),
        (status = 409, body = crate::error::ErrorBody)
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    Auth(caller): Auth,
    RecordId(id): RecordId,
    ValidatedForm(changes, file): ValidatedForm<UpdatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    let _guard = state.write_lock.lock().await;
    let posts = PostRepository::new(&state.storage);
    let mut post = posts.get(&id)?;
    post.verify_owner_or_admin(&caller)?;

    if let Some(title) = changes.title {
        post.slug = slug_for(&title)?;
        post.title = title;
        posts.ensure_slug_free(&post.slug, &post.id)?;
    }
    if let Some(description) = changes.description {
        post.description = description;
    }
    if let Some(category) = changes.category {
        CategoryRepository::new(&state.storage).get(&category)?;
        post.category_id = category;
    }
    if let Some(tags) = changes.tags {
        post.tags = tags;
    }
    if let Some(is_published) = changes.is_published {
        post.is_published = is_published;
    }
    if let Some(link) = changes.image_link {
        post.image_link = Some(link);
    }
    if let Some(link) = state.upload_image(file, IMAGE_FOLDER).await? {
        post.image_link = Some(link);
    }

    let post = posts.update(&post)?;
    Ok(Json(PostResponse {
        message: "post updated successfully.".to_string(),
        post: post.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/post/{id}",
    params(("id" = String, Path, description = "Post id")),
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, body = PostResponse),
        (status = 403, body = crate::error::ErrorBody),
        (status = 404, body = crate::error::ErrorBody)
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Auth(caller): Auth,
    RecordId(id): RecordId,
) -> Result<Json<PostResponse>, ApiError> {
    let _guard = state.write_lock.lock().await;
    let posts = PostRepository::new(&state.storage);
    posts.get(&id)?.verify_owner_or_admin(&caller)?;
    let post = posts.delete(&id)?;
    tracing::info!(post_id = %id, user_id = %caller.user_id, "Post deleted");
    Ok(Json(PostResponse {
        message: "post deleted successfully.".to_string(),
        post: post.into(),
    }))
}

fn slug_for(title: &str) -> Result<String, ValidationError> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(ValidationError::field("title", "must contain letters or digits"));
    }
    Ok(slug)
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use uuid::Uuid;

use super::extract::{RecordId, ValidatedJson};
use crate::{
    auth::Auth,
    error::ApiError,
    models::{Bookmark, BookmarkListResponse, BookmarkResponse, CreateBookmarkRequest},
    state::AppState,
    storage::{BookmarkRepository, PostRepository, StoredBookmark},
};

#[utoipa::path(
    get,
    path = "/api/bookmark",
    tag = "Bookmarks",
    security(("bearer" = [])),
    responses((status = 200, body = BookmarkListResponse))
)]
pub async fn list_bookmarks(
    State(state): State<AppState>,
    Auth(caller): Auth,
) -> Result<Json<BookmarkListResponse>, ApiError> {
    let bookmarks = BookmarkRepository::new(&state.storage).list_by_owner(&caller.user_id)?;
    Ok(Json(BookmarkListResponse {
        message: "bookmarks fetched successfully.".to_string(),
        bookmarks: bookmarks.into_iter().map(Bookmark::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/bookmark",
    request_body = CreateBookmarkRequest,
    tag = "Bookmarks",
    security(("bearer" = [])),
    responses(
        (status = 201, body = BookmarkResponse),
        (status = 404, description = "Unknown post", body = crate::error::ErrorBody),
        (status = 409, description = "Post already bookmarked", body = crate::error::ErrorBody)
    )
)]
pub async fn create_bookmark(
    State(state): State<AppState>,
    Auth(caller): Auth,
    ValidatedJson(post_id): ValidatedJson<CreateBookmarkRequest>,
) -> Result<(StatusCode, Json<BookmarkResponse>), ApiError> {
    PostRepository::new(&state.storage).get(&post_id)?;

    let bookmark = StoredBookmark {
        id: Uuid::new_v4().to_string(),
        user_id: caller.user_id,
        post_id,
        created_at: Utc::now(),
    };
    {
        let _guard = state.write_lock.lock().await;
        BookmarkRepository::new(&state.storage).create(&bookmark)?;
    }

    Ok((
        StatusCode::CREATED,
        Json(BookmarkResponse {
            message: "bookmark created successfully.".to_string(),
            bookmark: bookmark.into(),
        }),
    ))
}

/// Remove one of the caller's bookmarks. Other users' bookmarks are reported
/// as missing.
#[utoipa::path(
    delete,
    path = "/api/bookmark/{id}",
    params(("id" = String, Path, description = "Bookmark id")),
    tag = "Bookmarks",
    security(("bearer" = [])),
    responses(
        (status = 200, body = BookmarkResponse),
        (status = 404, body = crate::error::ErrorBody)
    )
)]
pub async fn delete_bookmark(
    State(state): State<AppState>,
    Auth(caller): Auth,
    RecordId(id): RecordId,
) -> Result<Json<BookmarkResponse>, ApiError> {
    let bookmarks = BookmarkRepository::new(&state.storage);
    let bookmark = bookmarks.get_owned(&id, &caller.user_id)?;
    bookmarks.delete(&id)?;
    Ok(Json(BookmarkResponse {
        message: "bookmark deleted successfully.".to_string(),
        bookmark: bookmark.into(),
    }))
}

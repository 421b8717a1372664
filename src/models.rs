// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! API request and response models.
//!
//! Field names on the wire are camelCase. Request bodies keep every field
//! optional so that [`Validate`] can report the first missing or invalid field
//! by name; the validated forms below are what handlers actually consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::storage::{StoredBookmark, StoredCategory, StoredPost, StoredUser};
use crate::validation::{self, Validate, ValidationError};

const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 100;
const TITLE_MAX: usize = 255;

// =============================================================================
// User Models
// =============================================================================

/// A user as returned to clients. The password hash is never included.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image_link: Option<String>,
    pub verified: bool,
    pub role: Role,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub view_sensitive: bool,
    pub view_political: bool,
    pub relevant_categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredUser> for User {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            image_link: user.image_link,
            verified: user.verified,
            role: user.role,
            gender: user.gender,
            occupation: user.occupation,
            view_sensitive: user.view_sensitive,
            view_political: user.view_political,
            relevant_categories: user.relevant_categories,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Email and password sign-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Email and password sign-in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Checked email and password, shared by sign-up and sign-in.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

fn credentials(email: Option<String>, password: Option<String>) -> Result<Credentials, ValidationError> {
    let email = validation::email("email", email)?;
    let password = password.ok_or_else(|| ValidationError::field("password", "is required"))?;
    validation::length("password", &password, PASSWORD_MIN, PASSWORD_MAX)?;
    Ok(Credentials { email, password })
}

impl Validate for SignupRequest {
    type Valid = Credentials;

    fn validate(self) -> Result<Credentials, ValidationError> {
        credentials(self.email, self.password)
    }
}

impl Validate for SigninRequest {
    type Valid = Credentials;

    fn validate(self) -> Result<Credentials, ValidationError> {
        credentials(self.email, self.password)
    }
}

/// Google sign-in with an ID token obtained by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GoogleLoginRequest {
    pub id_token: Option<String>,
}

impl Validate for GoogleLoginRequest {
    type Valid = String;

    fn validate(self) -> Result<String, ValidationError> {
        validation::required("id_token", self.id_token)
    }
}

/// Profile update for the calling user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub image_link: Option<String>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub view_sensitive: Option<bool>,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub view_political: Option<bool>,
    #[serde(default, alias = "releventCategories", deserialize_with = "lenient::string_list")]
    pub relevant_categories: Option<Vec<String>>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub image_link: Option<String>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub view_sensitive: Option<bool>,
    pub view_political: Option<bool>,
    pub relevant_categories: Option<Vec<String>>,
    pub role: Option<Role>,
}

impl Validate for UpdateUserRequest {
    type Valid = ProfileChanges;

    fn validate(self) -> Result<ProfileChanges, ValidationError> {
        let name = validation::optional("name", self.name)?;
        if let Some(name) = &name {
            validation::length("name", name, 1, TITLE_MAX)?;
        }
        let role = self
            .role
            .map(|r| {
                Role::parse(r.trim()).ok_or_else(|| {
                    ValidationError::field("role", "must be one of [superadmin, admin, user]")
                })
            })
            .transpose()?;
        let relevant_categories = self
            .relevant_categories
            .map(|ids| {
                ids.iter()
                    .map(|id| validation::record_id("relevantCategories", id).map(|u| u.to_string()))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(ProfileChanges {
            name,
            image_link: validation::optional("imageLink", self.image_link)?,
            gender: validation::optional("gender", self.gender)?,
            occupation: validation::optional("occupation", self.occupation)?,
            view_sensitive: self.view_sensitive,
            view_political: self.view_political,
            relevant_categories,
            role,
        })
    }
}

// =============================================================================
// Category Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredCategory> for Category {
    fn from(category: StoredCategory) -> Self {
        Self {
            id: category.id,
            title: category.title,
            description: category.description,
            image_link: category.image_link,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// Create or update a category. Creation requires both fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CategoryRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Validate for CategoryRequest {
    type Valid = CategoryChanges;

    fn validate(self) -> Result<CategoryChanges, ValidationError> {
        let title = validation::optional("title", self.title)?;
        if let Some(title) = &title {
            validation::length("title", title, 1, TITLE_MAX)?;
        }
        Ok(CategoryChanges {
            title,
            description: validation::optional("description", self.description)?,
        })
    }
}

impl CategoryChanges {
    /// Both fields are required when a category is created.
    pub fn into_new(self) -> Result<NewCategory, ValidationError> {
        Ok(NewCategory {
            title: self.title.ok_or_else(|| ValidationError::field("title", "is required"))?,
            description: self
                .description
                .ok_or_else(|| ValidationError::field("description", "is required"))?,
        })
    }
}

// =============================================================================
// Post Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub image_link: Option<String>,
    pub tags: Vec<String>,
    /// Author user id.
    pub author: String,
    /// Category id.
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredPost> for Post {
    fn from(post: StoredPost) -> Self {
        Self {
            id: post.id,
            title: post.title,
            description: post.description,
            slug: post.slug,
            is_published: post.is_published,
            image_link: post.image_link,
            tags: post.tags,
            author: post.author_id,
            category: post.category_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Create a post. `author` defaults to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub author: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub is_published: bool,
}

impl Validate for CreatePostRequest {
    type Valid = NewPost;

    fn validate(self) -> Result<NewPost, ValidationError> {
        let title = validation::required("title", self.title)?;
        validation::length("title", &title, 1, TITLE_MAX)?;
        let description = validation::required("description", self.description)?;
        let author = self
            .author
            .map(|a| validation::record_id("author", &a).map(|u| u.to_string()))
            .transpose()?;
        let category = validation::required("category", self.category)?;
        let category = validation::record_id("category", &category)?.to_string();

        Ok(NewPost {
            title,
            description,
            author,
            category,
            tags: clean_tags(self.tags.unwrap_or_default()),
            is_published: self.is_published.unwrap_or(false),
        })
    }
}

/// Update a post. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_link: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_link: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

impl Validate for UpdatePostRequest {
    type Valid = PostChanges;

    fn validate(self) -> Result<PostChanges, ValidationError> {
        let title = validation::optional("title", self.title)?;
        if let Some(title) = &title {
            validation::length("title", title, 1, TITLE_MAX)?;
        }
        let category = self
            .category
            .map(|c| validation::record_id("category", &c).map(|u| u.to_string()))
            .transpose()?;

        Ok(PostChanges {
            title,
            description: validation::optional("description", self.description)?,
            image_link: validation::optional("imageLink", self.image_link)?,
            category,
            tags: self.tags.map(clean_tags),
            is_published: self.is_published,
        })
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|t| t == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

// =============================================================================
// Bookmark Models
// =============================================================================

/// A post saved by a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<StoredBookmark> for Bookmark {
    fn from(bookmark: StoredBookmark) -> Self {
        Self {
            id: bookmark.id,
            user_id: bookmark.user_id,
            post_id: bookmark.post_id,
            created_at: bookmark.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmarkRequest {
    pub post_id: Option<String>,
}

impl Validate for CreateBookmarkRequest {
    type Valid = String;

    fn validate(self) -> Result<String, ValidationError> {
        let post_id = validation::required("postId", self.post_id)?;
        Ok(validation::record_id("postId", &post_id)?.to_string())
    }
}

// =============================================================================
// Response Envelopes
// =============================================================================

/// Returned by sign-up, sign-in and Google sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub message: String,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryListResponse {
    pub message: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    pub message: String,
    pub post: Post,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostListResponse {
    pub message: String,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookmarkResponse {
    pub message: String,
    pub bookmark: Bookmark,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookmarkListResponse {
    pub message: String,
    pub bookmarks: Vec<Bookmark>,
}

/// Deserializers that accept both JSON values and the plain strings sent by
/// urlencoded and multipart forms.
mod lenient {
    use serde::{de::Error, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrString {
        List(Vec<String>),
        Text(String),
    }

    pub fn boolean<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<BoolOrString>::deserialize(deserializer)? {
            None => Ok(None),
            Some(BoolOrString::Bool(b)) => Ok(Some(b)),
            Some(BoolOrString::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "on" => Ok(Some(true)),
                "false" | "0" | "off" => Ok(Some(false)),
                other => Err(D::Error::custom(format!("invalid boolean `{other}`"))),
            },
        }
    }

    /// A JSON array, or a comma-separated string.
    pub fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<ListOrString>::deserialize(deserializer)? {
            None => None,
            Some(ListOrString::List(items)) => Some(items),
            Some(ListOrString::Text(s)) => Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        })
    }
}

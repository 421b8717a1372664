// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Sign-up, sign-in, Google sign-in, session check and logout.
//!
//! Every successful login issues a token for the stored user's
//! `{subjectId, email, role}` and returns it in the body, plus the `token`
//! cookie when cookie mode is enabled.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;
use uuid::Uuid;

use super::extract::ValidatedJson;
use crate::{
    auth::{password, Auth, AuthError},
    error::ApiError,
    models::{
        AuthResponse, CheckResponse, GoogleLoginRequest, MessageResponse, SigninRequest,
        SignupRequest,
    },
    state::AppState,
    storage::{StorageError, StoredUser, UserRepository},
};

const LOGIN_MESSAGE: &str = "Login Successfully";
const INVALID_LOGIN: &str = "You have entered an invalid email or password";
const EMAIL_TAKEN: &str = "email address is already registered! Please login to continue.";

/// Register with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    tag = "Auth",
    responses(
        (status = 200, body = AuthResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody),
        (status = 422, body = crate::error::ErrorBody)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(credentials): ValidatedJson<SignupRequest>,
) -> Result<Response, ApiError> {
    let _guard = state.write_lock.lock().await;
    let users = UserRepository::new(&state.storage);
    if users.find_by_email(&credentials.email)?.is_some() {
        return Err(ApiError::conflict(EMAIL_TAKEN));
    }

    let hash = password::hash_password_blocking(credentials.password).await?;
    let mut user = StoredUser::new(
        Uuid::new_v4().to_string(),
        credentials.email.clone(),
        local_part(&credentials.email),
    );
    user.password_hash = Some(hash);
    user.role = state.initial_role(&user.email);
    users.create(&user)?;

    info!(user_id = %user.id, role = %user.role, "User signed up");
    issue_session(&state, user)
}

/// Sign in with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SigninRequest,
    tag = "Auth",
    responses(
        (status = 200, body = AuthResponse),
        (status = 401, description = "Wrong password", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown email", body = crate::error::ErrorBody)
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    ValidatedJson(credentials): ValidatedJson<SigninRequest>,
) -> Result<Response, ApiError> {
    let user = UserRepository::new(&state.storage)
        .find_by_email(&credentials.email)?
        .ok_or_else(|| ApiError::not_found(INVALID_LOGIN))?;

    // Google-only accounts have no password to match.
    let Some(hash) = user.password_hash.clone() else {
        return Err(AuthError::InvalidCredentials.into());
    };
    if !password::verify_password_blocking(credentials.password, hash).await? {
        return Err(AuthError::InvalidCredentials.into());
    }

    issue_session(&state, user)
}

/// Sign in with a Google ID token, creating the account on first use.
#[utoipa::path(
    post,
    path = "/api/auth/google",
    request_body = GoogleLoginRequest,
    tag = "Auth",
    responses(
        (status = 200, body = AuthResponse),
        (status = 401, description = "ID token rejected", body = crate::error::ErrorBody),
        (status = 503, description = "Google sign-in not configured", body = crate::error::ErrorBody)
    )
)]
pub async fn google(
    State(state): State<AppState>,
    ValidatedJson(id_token): ValidatedJson<GoogleLoginRequest>,
) -> Result<Response, ApiError> {
    let verifier = state.google.clone().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "google_not_configured",
            "Google sign-in is not configured",
        )
    })?;
    let identity = verifier.verify(&id_token).await?;
    let email = identity
        .email
        .as_deref()
        .map(crate::validation::normalize_email)
        .ok_or_else(|| ApiError::unprocessable("Google account has no email address"))?;

    let _guard = state.write_lock.lock().await;
    let users = UserRepository::new(&state.storage);

    let user = if let Some(user) = users.find_by_google_subject(&identity.sub)? {
        user
    } else if let Some(mut user) = users.find_by_email(&email)? {
        user.google_subject = Some(identity.sub.clone());
        if user.image_link.is_none() {
            user.image_link = identity.picture.clone();
        }
        info!(user_id = %user.id, "Linked Google account");
        users.update(&user)?
    } else {
        let name = identity
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| local_part(&email));
        let mut user = StoredUser::new(Uuid::new_v4().to_string(), email, name);
        user.google_subject = Some(identity.sub.clone());
        user.image_link = identity.picture.clone();
        user.role = state.initial_role(&user.email);
        users.create(&user)?;
        info!(user_id = %user.id, "User signed up with Google");
        user
    };

    issue_session(&state, user)
}

/// Confirm the caller's token and return their account.
#[utoipa::path(
    get,
    path = "/api/auth/check",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, body = CheckResponse),
        (status = 401, description = "Missing, invalid or expired token", body = crate::error::ErrorBody),
        (status = 404, description = "Account no longer exists", body = crate::error::ErrorBody)
    )
)]
pub async fn check(
    State(state): State<AppState>,
    Auth(caller): Auth,
) -> Result<Json<CheckResponse>, ApiError> {
    let user = UserRepository::new(&state.storage)
        .get(&caller.user_id)
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found("User not found."),
            other => other.into(),
        })?;

    Ok(Json(CheckResponse {
        message: "User is authorized.".to_string(),
        user: user.into(),
    }))
}

/// Drop the token cookie.
#[utoipa::path(
    get,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, body = MessageResponse))
)]
pub async fn logout(State(state): State<AppState>) -> Response {
    let mut response = Json(MessageResponse::new("Logged out successfully.")).into_response();
    if let Some(cookie) = state.gate.cookie().clear() {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

fn issue_session(state: &AppState, user: StoredUser) -> Result<Response, ApiError> {
    let codec = state.gate.codec();
    let signed = codec.issue(&user.credential_claims()).map_err(AuthError::from)?;

    let mut response = Json(AuthResponse {
        message: LOGIN_MESSAGE.to_string(),
        user: user.into(),
        token: signed.token.clone(),
    })
    .into_response();

    let cookie = state.gate.cookie();
    if cookie.enabled() {
        if let Some(value) = cookie.issue(&signed.token, codec.ttl()) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    Ok(response)
}

fn local_part(email: &str) -> String {
    email.split_once('@').map_or(email, |(local, _)| local).to_string()
}

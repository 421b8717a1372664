// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::Html,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_auth, AuthenticatedUser, Role},
    error::ErrorBody,
    models::{
        AuthResponse, Bookmark, BookmarkListResponse, BookmarkResponse, Category,
        CategoryListResponse, CategoryRequest, CategoryResponse, CheckResponse,
        CreateBookmarkRequest, CreatePostRequest, GoogleLoginRequest, MessageResponse, Post,
        PostListResponse, PostResponse, SigninRequest, SignupRequest, UpdatePostRequest,
        UpdateUserRequest, User, UserResponse,
    },
    state::AppState,
};

pub mod auth;
pub mod bookmarks;
pub mod categories;
pub mod extract;
pub mod health;
pub mod posts;
pub mod rate_limit;
pub mod users;

/// Request bodies may carry an image upload.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let gate = || middleware::from_fn_with_state(state.gate.clone(), require_auth);

    // Every /api/auth route, gated or not, counts against the client's limit.
    let auth_api = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/google", post(auth::google))
        .route("/logout", get(auth::logout))
        .merge(Router::new().route("/check", get(auth::check)).route_layer(gate()))
        .route_layer(middleware::from_fn_with_state(
            state.auth_limiter.clone(),
            rate_limit::limit_requests,
        ));

    let public_api = Router::new()
        .route("/", get(api_banner))
        .route(
            "/category",
            get(categories::list_categories).post(categories::create_category),
        )
        .route("/category/create", post(categories::create_category))
        .route(
            "/category/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        );

    // Everything below runs only after the gate has attached a user.
    let protected_api = Router::new()
        .route("/post", get(posts::list_posts).post(posts::create_post))
        .route(
            "/post/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/user", put(users::update_user))
        .route(
            "/bookmark",
            get(bookmarks::list_bookmarks).post(bookmarks::create_bookmark),
        )
        .route("/bookmark/{id}", delete(bookmarks::delete_bookmark))
        .route_layer(gate());

    let api = public_api
        .merge(protected_api)
        .nest("/auth", auth_api)
        .fallback(api_not_found);
    let cors = cors_layer(&state.cors_allowed_origins);

    Router::new()
        .route("/", get(root_banner))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// Credentialed cross-site requests are only allowed from configured
/// origins. Without any, every origin may call the API without credentials.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn root_banner() -> Html<&'static str> {
    Html("<h1>Sojo News App</h1>")
}

async fn api_banner() -> Html<&'static str> {
    Html("<h1>Sojo News App Api</h1>")
}

async fn api_not_found() -> (StatusCode, Json<MessageResponse>) {
    (StatusCode::NOT_FOUND, Json(MessageResponse::new("api not found.")))
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        auth::signup,
        auth::signin,
        auth::google,
        auth::check,
        auth::logout,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        posts::list_posts,
        posts::get_post,
        posts::create_post,
        posts::update_post,
        posts::delete_post,
        users::update_user,
        bookmarks::list_bookmarks,
        bookmarks::create_bookmark,
        bookmarks::delete_bookmark
    ),
    components(
        schemas(
            AuthenticatedUser,
            Role,
            ErrorBody,
            User,
            Category,
            Post,
            Bookmark,
            SignupRequest,
            SigninRequest,
            GoogleLoginRequest,
            UpdateUserRequest,
            CategoryRequest,
            CreatePostRequest,
            UpdatePostRequest,
            CreateBookmarkRequest,
            AuthResponse,
            CheckResponse,
            MessageResponse,
            UserResponse,
            CategoryResponse,
            CategoryListResponse,
            PostResponse,
            PostListResponse,
            BookmarkResponse,
            BookmarkListResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Auth", description = "Sign-up, sign-in and session checks"),
        (name = "Categories", description = "News categories"),
        (name = "Posts", description = "News posts"),
        (name = "Users", description = "User profiles"),
        (name = "Bookmarks", description = "Saved posts")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use crate::test_support::test_state;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let _ = router(state).into_make_service();
    }

    #[tokio::test]
    async fn unknown_api_path_is_json_404() {
        let (state, _dir) = test_state();
        let response = router(state)
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "api not found.");
    }

    #[tokio::test]
    async fn banners_and_security_headers() {
        let (state, _dir) = test_state();
        let response = router(state)
            .oneshot(Request::get("/api").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert!(response.headers().contains_key("x-request-id"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>Sojo News App Api</h1>");
    }

    #[tokio::test]
    async fn public_category_listing_needs_no_token() {
        let (state, _dir) = test_state();
        let response = router(state)
            .oneshot(Request::get("/api/category").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn category_writes_need_a_token() {
        let (state, _dir) = test_state();
        let response = router(state)
            .oneshot(
                Request::post("/api/category")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title":"World","description":"News"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_routes_are_rate_limited() {
        let (state, _dir) = test_state();
        let state = state.with_auth_rate_limit(RateLimitConfig {
            max_requests: 2,
            window: std::time::Duration::from_secs(3600),
            trust_proxy_headers: true,
        });
        let app = router(state);
        let logout_from = |ip: &'static str| {
            Request::get("/api/auth/logout")
                .header("x-forwarded-for", ip)
                .body(Body::empty())
                .unwrap()
        };

        for _ in 0..2 {
            let response = app.clone().oneshot(logout_from("203.0.113.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        // The gated check route shares the same budget.
        let response = app
            .clone()
            .oneshot(
                Request::get("/api/auth/check")
                    .header("x-forwarded-for", "203.0.113.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error_code"], "rate_limit_exceeded");
        assert_eq!(body["message"], "Too many requests! Please try again later.");

        let response = app.clone().oneshot(logout_from("203.0.113.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Other API routes are not limited.
        let response = app
            .oneshot(
                Request::get("/api/category")
                    .header("x-forwarded-for", "203.0.113.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    fn preflight(origin: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/post")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn credentials_only_for_configured_origins() {
        let (state, _dir) = test_state();
        let app = router(state.with_cors_allowed_origins(vec!["https://news.example.com".into()]));

        let response = app.clone().oneshot(preflight("https://news.example.com")).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://news.example.com");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

        let response = app.oneshot(preflight("https://evil.example.com")).await.unwrap();
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn unconfigured_cors_never_allows_credentials() {
        let (state, _dir) = test_state();
        let response = router(state).oneshot(preflight("https://evil.example.com")).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS));
    }

    #[test]
    fn openapi_declares_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer"));
    }
}

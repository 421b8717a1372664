// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Request extractors that validate before the handler runs.
//!
//! Every rejection is an [`ApiError`], so clients see the same JSON error
//! body for a malformed payload as for a failed field check.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Request},
    http::{header::CONTENT_TYPE, request::Parts},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::providers::FileUpload;
use crate::validation::{describe_json_error, record_id, Validate};

/// Multipart part carrying the optional image.
pub const FILE_FIELD: &str = "file";

/// JSON body, deserialized into `T` and validated into `T::Valid`.
pub struct ValidatedJson<T: Validate>(pub T::Valid);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
    T::Valid: Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = read_body(req, state).await?;
        let raw: T = parse_json(&body)?;
        Ok(ValidatedJson(raw.validate()?))
    }
}

/// Form body (JSON, urlencoded, or multipart) plus an optional uploaded file.
///
/// Text fields of urlencoded and multipart bodies become JSON strings; a key
/// sent more than once becomes an array.
pub struct ValidatedForm<T: Validate>(pub T::Valid, pub Option<FileUpload>);

impl<S, T> FromRequest<S> for ValidatedForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
    T::Valid: Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let (raw, file): (T, Option<FileUpload>) = if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::unprocessable(e.body_text()))?;
            let (fields, file) = read_multipart(multipart).await?;
            (from_fields(fields)?, file)
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let body = read_body(req, state).await?;
            let mut fields = Map::new();
            for (key, value) in url::form_urlencoded::parse(&body) {
                push_field(&mut fields, key.into_owned(), value.into_owned());
            }
            (from_fields(fields)?, None)
        } else {
            let body = read_body(req, state).await?;
            (parse_json(&body)?, None)
        };

        Ok(ValidatedForm(raw.validate()?, file))
    }
}

/// `{id}` path segment, required to be a UUID.
#[derive(Debug, Clone)]
pub struct RecordId(pub String);

impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::unprocessable(e.body_text()))?;
        Ok(RecordId(record_id("id", &raw)?.to_string()))
    }
}

async fn read_body<S: Send + Sync>(req: Request, state: &S) -> Result<Bytes, ApiError> {
    Bytes::from_request(req, state)
        .await
        .map_err(|e| ApiError::new(e.status(), "invalid_body", e.body_text()))
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    // An empty body validates like `{}` so the first required field is named.
    let body = if body.iter().all(u8::is_ascii_whitespace) { b"{}".as_slice() } else { body };
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, body_size = body.len(), "JSON parsing failed");
        ApiError::unprocessable(describe_json_error(&e))
    })
}

fn from_fields<T: DeserializeOwned>(fields: Map<String, Value>) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| {
        debug!(error = %e, "Form parsing failed");
        ApiError::unprocessable("Invalid form: wrong types for one or more fields")
    })
}

fn push_field(fields: &mut Map<String, Value>, key: String, value: String) {
    let key = key.trim_end_matches("[]").to_string();
    match fields.get_mut(&key) {
        None => {
            fields.insert(key, Value::String(value));
        }
        Some(Value::Array(items)) => items.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
    }
}

async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(Map<String, Value>, Option<FileUpload>), ApiError> {
    let mut fields = Map::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::unprocessable(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == FILE_FIELD {
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::unprocessable(e.body_text()))?;
            if !bytes.is_empty() {
                file = Some(FileUpload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::unprocessable(e.body_text()))?;
        push_field(&mut fields, name, value);
    }

    Ok((fields, file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryRequest, CreatePostRequest, SignupRequest};
    use axum::{body::Body, http::StatusCode};

    fn request(content_type: &str, body: impl Into<Body>) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn json_field_errors_are_422() {
        let req = request("application/json", r#"{"email":"a@b.com"}"#);
        let err = ValidatedJson::<SignupRequest>::from_request(req, &()).await.err().unwrap();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message, "\"password\" is required");
    }

    #[tokio::test]
    async fn malformed_json_is_422() {
        let req = request("application/json", r#"{"email": "#);
        let err = ValidatedJson::<SignupRequest>::from_request(req, &()).await.err().unwrap();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message, "Invalid JSON: unexpected end of input");
    }

    #[tokio::test]
    async fn empty_body_names_first_field() {
        let req = request("application/json", "");
        let err = ValidatedJson::<SignupRequest>::from_request(req, &()).await.err().unwrap();
        assert_eq!(err.message, "\"email\" is required");
    }

    #[tokio::test]
    async fn urlencoded_form_is_accepted() {
        let category = uuid::Uuid::new_v4();
        let body = format!("title=Hello&description=World&category={category}&tags=a&tags=b");
        let req = request("application/x-www-form-urlencoded", body);
        let ValidatedForm(post, file) =
            ValidatedForm::<CreatePostRequest>::from_request(req, &()).await.ok().unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.tags, vec!["a", "b"]);
        assert!(file.is_none());
    }

    #[tokio::test]
    async fn multipart_form_carries_file() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nWorld\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\nAll news\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"w.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let req = request(&format!("multipart/form-data; boundary={boundary}"), body);
        let ValidatedForm(changes, file) =
            ValidatedForm::<CategoryRequest>::from_request(req, &()).await.ok().unwrap();
        assert_eq!(changes.title.as_deref(), Some("World"));
        let file = file.unwrap();
        assert_eq!(file.filename.as_deref(), Some("w.png"));
        assert_eq!(file.content_type.as_deref(), Some("image/png"));
        assert_eq!(file.bytes, b"PNGDATA");
    }

    #[test]
    fn repeated_keys_become_arrays() {
        let mut fields = Map::new();
        push_field(&mut fields, "tags[]".into(), "a".into());
        push_field(&mut fields, "tags[]".into(), "b".into());
        push_field(&mut fields, "tags[]".into(), "c".into());
        assert_eq!(fields["tags"], serde_json::json!(["a", "b", "c"]));
    }
}

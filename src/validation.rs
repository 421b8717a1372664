// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Sojo News

//! Request validation.
//!
//! Request bodies deserialize into "raw" structs whose fields are all
//! optional, then [`Validate::validate`] turns them into a checked value or
//! the first field-level error. Messages follow the `"field" ...` wording
//! API clients already parse.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn field(field: &str, message: impl std::fmt::Display) -> Self {
        Self {
            field: Some(field.to_string()),
            message: format!("\"{field}\" {message}"),
        }
    }

    pub fn body(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// A request payload that can be checked before a handler uses it.
pub trait Validate {
    type Valid;

    fn validate(self) -> Result<Self::Valid, ValidationError>;
}

/// Field must be present and non-blank. Returns the trimmed value.
pub fn required(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::field(field, "is required"))?;
    non_empty(field, value)
}

/// Field may be absent, but must be non-blank when present.
pub fn optional(field: &str, value: Option<String>) -> Result<Option<String>, ValidationError> {
    value.map(|v| non_empty(field, v)).transpose()
}

fn non_empty(field: &str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::field(field, "is not allowed to be empty"));
    }
    Ok(trimmed.to_string())
}

/// Character-count bounds, inclusive.
pub fn length(field: &str, value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let count = value.chars().count();
    if count < min {
        return Err(ValidationError::field(
            field,
            format!("length must be at least {min} characters long"),
        ));
    }
    if count > max {
        return Err(ValidationError::field(
            field,
            format!("length must be less than or equal to {max} characters long"),
        ));
    }
    Ok(())
}

/// Required email, returned normalized.
pub fn email(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    let normalized = normalize_email(&required(field, value)?);
    if !looks_like_email(&normalized) {
        return Err(ValidationError::field(field, "must be a valid email"));
    }
    Ok(normalized)
}

/// Trim, apply NFKC, lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().nfkc().collect::<String>().to_lowercase()
}

pub fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .collect::<Vec<_>>()
            .as_slice()
            .split_last()
            .is_some_and(|(tld, labels)| {
                !labels.is_empty() && tld.len() >= 2 && labels.iter().all(|l| !l.is_empty())
            })
}

/// Path identifiers are UUIDs.
pub fn record_id(field: &str, value: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value.trim()).map_err(|_| ValidationError::field(field, "must be a valid GUID"))
}

/// Sanitized description of a JSON body that failed to parse.
pub fn describe_json_error(error: &serde_json::Error) -> String {
    match error.classify() {
        serde_json::error::Category::Syntax => {
            format!("Invalid JSON at line {}", error.line())
        }
        serde_json::error::Category::Eof => "Invalid JSON: unexpected end of input".to_string(),
        serde_json::error::Category::Data => {
            "Invalid JSON: wrong types for one or more fields".to_string()
        }
        serde_json::error::Category::Io => "Invalid JSON: I/O error while reading body".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_blank() {
        assert_eq!(required("title", None).unwrap_err().message, "\"title\" is required");
        assert_eq!(
            required("title", Some("   ".into())).unwrap_err().message,
            "\"title\" is not allowed to be empty"
        );
        assert_eq!(required("title", Some(" News ".into())).unwrap(), "News");
    }

    #[test]
    fn optional_allows_absent_only() {
        assert_eq!(optional("name", None).unwrap(), None);
        assert!(optional("name", Some("".into())).is_err());
        assert_eq!(optional("name", Some("Ada".into())).unwrap().as_deref(), Some("Ada"));
    }

    #[test]
    fn length_bounds_are_inclusive() {
        assert!(length("password", "123456", 6, 100).is_ok());
        assert_eq!(
            length("password", "12345", 6, 100).unwrap_err().message,
            "\"password\" length must be at least 6 characters long"
        );
        let long = "x".repeat(101);
        assert_eq!(
            length("password", &long, 6, 100).unwrap_err().message,
            "\"password\" length must be less than or equal to 100 characters long"
        );
    }

    #[test]
    fn email_is_normalized_and_checked() {
        assert_eq!(email("email", Some("  Reader@Example.COM ".into())).unwrap(), "reader@example.com");
        // Fullwidth letters fold under NFKC.
        assert_eq!(email("email", Some("ａ@b.com".into())).unwrap(), "a@b.com");

        for bad in ["no-at-sign", "@b.com", "a@b", "a@@b.com", "a b@c.com", "a@.com", "a@b.c"] {
            let err = email("email", Some(bad.into())).unwrap_err();
            assert_eq!(err.message, "\"email\" must be a valid email", "{bad}");
            assert_eq!(err.field.as_deref(), Some("email"));
        }
    }

    #[test]
    fn record_id_requires_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(record_id("id", &id.to_string()).unwrap(), id);
        assert_eq!(
            record_id("id", "1234").unwrap_err().message,
            "\"id\" must be a valid GUID"
        );
    }

    #[test]
    fn json_errors_are_sanitized() {
        let err = serde_json::from_str::<serde_json::Value>("{\"a\": }").unwrap_err();
        assert!(describe_json_error(&err).starts_with("Invalid JSON at line"));

        let err = serde_json::from_str::<serde_json::Value>("{\"a\": 1").unwrap_err();
        assert_eq!(describe_json_error(&err), "Invalid JSON: unexpected end of input");
    }
}

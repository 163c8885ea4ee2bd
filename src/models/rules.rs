//! Field rules used by the `validator` derives on input types

use std::borrow::Cow;

use serde_json::Value;
use validator::ValidationError;

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Lowercase ASCII letters, digits and hyphens, 1 to 100 characters
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() || slug.len() > 100 {
        return Err(rule_error("slug_length", "Slug must be 1 to 100 characters"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(rule_error(
            "slug_format",
            "Slug may only contain lowercase letters, digits and hyphens",
        ));
    }
    Ok(())
}

/// Rich content is either a non-empty HTML string or a block structure
pub fn validate_rich_content(content: &Value) -> Result<(), ValidationError> {
    match content {
        Value::String(s) if !s.trim().is_empty() => Ok(()),
        Value::Array(_) | Value::Object(_) => Ok(()),
        Value::Null => Err(rule_error("required", "Content is required")),
        _ => Err(rule_error(
            "invalid_type",
            "Content must be an HTML string or a block structure",
        )),
    }
}

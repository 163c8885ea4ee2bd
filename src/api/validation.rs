//! `ValidJson<T>`: a JSON body extractor that also runs `validator` rules
//!
//! Malformed JSON is a plain 400. Rule failures are a 400 `Invalid data`
//! whose `details` list one issue per failed rule, addressed by the
//! camelCase path of the offending field (array positions as numbers).

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use super::middleware::{ApiError, ValidationIssue};

pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        value
            .validate()
            .map_err(|errors| ApiError::validation(collect_issues(&errors)))?;

        Ok(Self(value))
    }
}

/// Flatten nested validation errors into a stable, path-sorted list
pub fn collect_issues(errors: &ValidationErrors) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    walk(errors, &mut Vec::new(), &mut issues);
    issues.sort_by(|a, b| path_key(&a.path).cmp(&path_key(&b.path)).then(a.code.cmp(&b.code)));
    issues
}

fn walk(errors: &ValidationErrors, prefix: &mut Vec<Value>, out: &mut Vec<ValidationIssue>) {
    for (field, kind) in errors.errors() {
        prefix.push(Value::String(to_camel_case(&field.to_string())));
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    out.push(ValidationIssue {
                        path: prefix.clone(),
                        code: error.code.to_string(),
                        message: describe(error),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => walk(nested, prefix, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    prefix.push(Value::from(*index));
                    walk(nested, prefix, out);
                    prefix.pop();
                }
            }
        }
        prefix.pop();
    }
}

fn path_key(path: &[Value]) -> String {
    path.iter()
        .map(|segment| match segment {
            Value::String(s) => s.clone(),
            other => format!("{:08}", other.as_u64().unwrap_or_default()),
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Explicit rule message, else one derived from the rule code and params
fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let param = |name: &str| error.params.get(name).map(|v| v.to_string());
    match error.code.as_ref() {
        "length" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("Must be between {} and {} characters", min, max),
            (Some(min), None) => format!("Must be at least {} characters", min),
            (None, Some(max)) => format!("Must be at most {} characters", max),
            (None, None) => "Invalid length".to_string(),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("Must be between {} and {}", min, max),
            (Some(min), None) => format!("Must be at least {}", min),
            (None, Some(max)) => format!("Must be at most {}", max),
            (None, None) => "Out of range".to_string(),
        },
        "email" => "Invalid email address".to_string(),
        "url" => "Invalid URL".to_string(),
        code => format!("Failed rule '{}'", code),
    }
}

//! Uploaded file serving
//!
//! `GET /uploads/{*path}` reads from the configured upload directory.
//! Any path segment containing `..` is refused before the disk is touched.

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use tokio::fs;

use crate::api::middleware::{ApiError, AppState};

const UPLOADS_PREFIX: &str = "/uploads/";

pub async fn serve_upload(State(state): State<AppState>, uri: Uri) -> Response {
    let raw = uri.path().strip_prefix(UPLOADS_PREFIX).unwrap_or_default();
    // URL decode the path to handle encoded characters like %2E%2E -> ..
    let decoded = urlencoding::decode(raw).map(|p| p.into_owned()).unwrap_or_else(|_| raw.to_string());

    let Some(relative) = resolve_relative(&decoded) else {
        tracing::warn!(path = %decoded, "Rejected upload path with traversal segment");
        return ApiError::forbidden().into_response();
    };

    let file_path = state.upload_config.path.join(relative);
    match fs::read(&file_path).await {
        Ok(contents) => (
            [
                (header::CONTENT_TYPE, get_content_type(&decoded)),
                (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
            ],
            contents,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            ApiError::not_found("File not found").into_response()
        }
        Err(e) if file_path.is_dir() => {
            tracing::debug!(error = %e, "Upload path is a directory");
            ApiError::not_found("File not found").into_response()
        }
        Err(e) => ApiError::internal(format!("Failed to read {}: {}", file_path.display(), e)).into_response(),
    }
}

/// Relative path under the upload root, or `None` when any segment contains `..`
fn resolve_relative(path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for segment in path.split(['/', '\\']) {
        if segment.contains("..") {
            return None;
        }
        if !segment.is_empty() && segment != "." {
            relative.push(segment);
        }
    }
    Some(relative)
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match extension.as_str() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Fallback for anything outside the API and upload routes
pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_rejects_traversal() {
        assert_eq!(resolve_relative("a/b.png"), Some(PathBuf::from("a/b.png")));
        assert_eq!(resolve_relative("./x.png"), Some(PathBuf::from("x.png")));
        assert_eq!(resolve_relative("../secret"), None);
        assert_eq!(resolve_relative("a/../../b"), None);
        assert_eq!(resolve_relative("a\\..\\b"), None);
        assert_eq!(resolve_relative("file..png"), None);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(get_content_type("photo.JPG"), "image/jpeg");
        assert_eq!(get_content_type("doc.pdf"), "application/pdf");
        assert_eq!(get_content_type("noext"), "application/octet-stream");
    }
}

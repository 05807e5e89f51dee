//! File attachment endpoints
//!
//! Uploads arrive as a raw request body with `sectionId` and `filename` query
//! parameters. The stored name is freshly generated (the client-supplied name
//! only contributes its extension), so uploads can never collide or escape
//! their section directory.

use serde_json::json;

use super::{bad_request, created, ok, ApiResult, Query};
use crate::model::new_id;
use crate::store::Store;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Content types accepted without looking at the extension.
const ALLOWED_TYPES: &[&str] = &[
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "text/csv",
    "text/markdown",
    // Code
    "text/javascript",
    "application/javascript",
    "text/typescript",
    "application/json",
    "text/html",
    "text/css",
    "text/x-python",
    "application/x-python-code",
    // Archives
    "application/zip",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
];

/// Fallback allow-list for clients that send a generic content type.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", "pdf", "doc", "docx", "xls", "xlsx", "ppt",
    "pptx", "txt", "csv", "md", "js", "ts", "jsx", "tsx", "json", "html", "css", "py", "sql",
    "sh", "zip", "rar", "7z",
];

fn extension_of(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .filter(|ext| *ext != filename)
        .unwrap_or_default()
        .to_lowercase()
}

// POST /api/upload?sectionId=..&filename=.. (raw body)
pub fn post(
    store: &Store,
    query: &Query,
    content_type: Option<&str>,
    body: &[u8],
) -> ApiResult {
    let Some(section_id) = query.get("sectionId").filter(|s| !s.is_empty()) else {
        return Ok(bad_request("sectionId is required"));
    };
    let Some(original_name) = query.get("filename").filter(|s| !s.is_empty()) else {
        return Ok(bad_request("filename is required"));
    };

    let extension = extension_of(original_name);
    let type_ok = content_type.map_or(false, |t| {
        let bare = t.split(';').next().unwrap_or(t).trim();
        ALLOWED_TYPES.contains(&bare)
    });
    let extension_ok = ALLOWED_EXTENSIONS.contains(&extension.as_str());
    if !type_ok && !extension_ok {
        return Ok(bad_request(
            "Invalid file type. Please upload images, documents, or code files.",
        ));
    }
    if body.len() > MAX_FILE_SIZE {
        return Ok(bad_request("File too large. Maximum size: 10MB"));
    }

    let stamp = chrono::Utc::now().timestamp_millis();
    let unique = &new_id("f")[2..]; // just the 8 hex chars
    let stored_name = if extension.is_empty() {
        format!("{}-{}.bin", unique, stamp)
    } else {
        format!("{}-{}.{}", unique, stamp, extension)
    };

    let url = store.save_upload(section_id, &stored_name, body)?;
    Ok(created(json!({ "url": url })))
}

// GET /api/upload?sectionId=..
pub fn list(store: &Store, query: &Query) -> ApiResult {
    let Some(section_id) = query.get("sectionId").filter(|s| !s.is_empty()) else {
        return Ok(bad_request("sectionId is required"));
    };
    Ok(ok(json!({ "files": store.list_uploads(section_id) })))
}

// DELETE /api/upload/{filename}?sectionId=..
pub fn delete(store: &Store, filename: &str, query: &Query) -> ApiResult {
    let Some(section_id) = query.get("sectionId").filter(|s| !s.is_empty()) else {
        return Ok(bad_request("sectionId is required"));
    };
    if filename.contains("..") || filename.contains('/') {
        return Ok(bad_request("Invalid filename"));
    }
    store.delete_upload(section_id, filename)?;
    Ok(ok(json!({ "deleted": true })))
}

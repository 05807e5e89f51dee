//! On-demand backup endpoint

use serde_json::json;

use super::{ok, ApiResult};
use crate::store::Store;

// POST /api/backup
pub fn post(store: &Store) -> ApiResult {
    let path = store.backup()?;
    Ok(ok(json!({ "path": path.to_string_lossy() })))
}

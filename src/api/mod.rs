//! HTTP handler groups, one module per entity family
//!
//! Every handler follows the same pattern: load the owning document, find or
//! mutate one entity in memory, persist the whole document back, and answer
//! with the uniform envelope `{ success, data?, error? }`. "Not found" and
//! bad input are expected outcomes (404/400); anything unexpected bubbles up
//! as a 500 with the underlying message.

use serde::Serialize;
use std::collections::HashMap;

use crate::store::StoreError;

pub mod backup;
pub mod notes;
pub mod progress;
pub mod projects;
pub mod resources;
pub mod roadmap;
pub mod settings;
pub mod upload;

/// Uniform response envelope shared by every endpoint.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// A fully rendered JSON reply: status code plus envelope body.
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

fn render<T: Serialize>(status: u16, envelope: &ApiResponse<T>) -> ApiReply {
    ApiReply {
        status,
        // Envelope of serializable parts; serialization itself cannot fail
        body: serde_json::to_string(envelope).unwrap_or_else(|_| {
            "{\"success\":false,\"error\":\"serialization failure\"}".to_string()
        }),
    }
}

pub fn ok<T: Serialize>(data: T) -> ApiReply {
    render(200, &ApiResponse::success(data))
}

pub fn created<T: Serialize>(data: T) -> ApiReply {
    render(201, &ApiResponse::success(data))
}

pub fn bad_request(message: impl Into<String>) -> ApiReply {
    render(400, &ApiResponse::failure(message))
}

pub fn not_found(message: impl Into<String>) -> ApiReply {
    render(404, &ApiResponse::failure(message))
}

pub fn internal(message: impl Into<String>) -> ApiReply {
    render(500, &ApiResponse::failure(message))
}

/// Handler result: expected outcomes are encoded in the reply, unexpected
/// store failures propagate and become 500s at the router.
pub type ApiResult = Result<ApiReply, StoreError>;

/// Query-string parameters, e.g. `?sectionId=s1&q=joins`.
pub type Query = HashMap<String, String>;

pub fn parse_query(raw: Option<&str>) -> Query {
    raw.and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default()
}

/// Parse a JSON request body, mapping malformed input to a 400 reply.
pub fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiReply> {
    serde_json::from_slice(body).map_err(|e| bad_request(format!("Invalid JSON: {}", e)))
}

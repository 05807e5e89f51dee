//! Resource library endpoints
//!
//! Flat list of external learning resources. Listing filters by `type`,
//! `sectionId`, and a case-insensitive `q` over title and description.

use serde::Deserialize;

use super::{bad_request, created, not_found, ok, parse_body, ApiResult, Query};
use crate::model::{new_id, now_iso, Resource, ResourceKind, ResourcesData};
use crate::store::Store;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceCreate {
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "type")]
    kind: Option<ResourceKind>,
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    section_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceUpdate {
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "type")]
    kind: Option<ResourceKind>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    section_id: Option<String>,
}

// GET /api/resources - optional type / sectionId / q filters
pub fn list(store: &Store, query: &Query) -> ApiResult {
    store.initialize()?;
    let data = store.read_resources()?;

    let kind = query
        .get("type")
        .and_then(|t| serde_json::from_value::<ResourceKind>(serde_json::Value::String(t.clone())).ok());
    let section_id = query.get("sectionId");
    let search = query.get("q").map(|q| q.to_lowercase());

    let resources: Vec<Resource> = data
        .resources
        .into_iter()
        .filter(|r| kind.map_or(true, |k| r.kind == k))
        .filter(|r| section_id.map_or(true, |sid| r.section_id.as_ref() == Some(sid)))
        .filter(|r| {
            search.as_ref().map_or(true, |q| {
                r.title.to_lowercase().contains(q) || r.description.to_lowercase().contains(q)
            })
        })
        .collect();

    Ok(ok(ResourcesData {
        resources,
        last_updated: data.last_updated,
    }))
}

// POST /api/resources
pub fn create(store: &Store, body: &[u8]) -> ApiResult {
    let payload: ResourceCreate = match parse_body(body) {
        Ok(payload) => payload,
        Err(reply) => return Ok(reply),
    };
    let (Some(title), Some(url)) = (payload.title, payload.url) else {
        return Ok(bad_request("title and url are required"));
    };
    if title.is_empty() || url.is_empty() {
        return Ok(bad_request("title and url are required"));
    }

    let mut data = store.read_resources()?;
    let resource = Resource {
        id: new_id("res"),
        title,
        url,
        kind: payload.kind.unwrap_or_default(),
        description: payload.description.unwrap_or_default(),
        tags: payload.tags,
        section_id: payload.section_id,
        created_at: now_iso(),
    };

    data.resources.push(resource.clone());
    data.last_updated = now_iso();
    store.write_resources(&data)?;
    Ok(created(resource))
}

// GET /api/resources/{id}
pub fn get(store: &Store, resource_id: &str) -> ApiResult {
    let data = store.read_resources()?;
    match data.resources.into_iter().find(|r| r.id == resource_id) {
        Some(resource) => Ok(ok(resource)),
        None => Ok(not_found("Resource not found")),
    }
}

// PUT /api/resources/{id}
pub fn update(store: &Store, resource_id: &str, body: &[u8]) -> ApiResult {
    let updates: ResourceUpdate = match parse_body(body) {
        Ok(updates) => updates,
        Err(reply) => return Ok(reply),
    };
    let mut data = store.read_resources()?;
    let Some(resource) = data.resources.iter_mut().find(|r| r.id == resource_id) else {
        return Ok(not_found("Resource not found"));
    };

    if let Some(title) = updates.title {
        resource.title = title;
    }
    if let Some(url) = updates.url {
        resource.url = url;
    }
    if let Some(kind) = updates.kind {
        resource.kind = kind;
    }
    if let Some(description) = updates.description {
        resource.description = description;
    }
    if let Some(tags) = updates.tags {
        resource.tags = tags;
    }
    if let Some(section_id) = updates.section_id {
        resource.section_id = Some(section_id);
    }
    let updated = resource.clone();

    data.last_updated = now_iso();
    store.write_resources(&data)?;
    Ok(ok(updated))
}

// DELETE /api/resources/{id}
pub fn delete(store: &Store, resource_id: &str) -> ApiResult {
    let mut data = store.read_resources()?;
    let Some(index) = data.resources.iter().position(|r| r.id == resource_id) else {
        return Ok(not_found("Resource not found"));
    };

    data.resources.remove(index);
    data.last_updated = now_iso();
    store.write_resources(&data)?;
    Ok(ok(serde_json::json!({ "deleted": true })))
}

//! Project endpoints
//!
//! Projects are portfolio entries that can link a GitHub repository. The
//! linked repo's snapshot is cached on the entity and refreshed through an
//! explicit endpoint, gated by the snapshot TTL unless forced.

use serde::Deserialize;

use super::{bad_request, created, not_found, ok, parse_body, ApiResult, Query};
use crate::github;
use crate::model::{
    new_id, now_iso, GitHubRepoData, Project, ProjectStatus, ProjectTopic, ProjectsData,
};
use crate::store::Store;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectCreate {
    title: Option<String>,
    description: Option<String>,
    status: Option<ProjectStatus>,
    github_url: Option<String>,
    demo_url: Option<String>,
    #[serde(default)]
    topics: Vec<ProjectTopic>,
    #[serde(default)]
    sections: Vec<String>,
    #[serde(default)]
    technologies: Vec<String>,
    notes: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    started_at: Option<String>,
    completed_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectUpdate {
    title: Option<String>,
    description: Option<String>,
    status: Option<ProjectStatus>,
    github_url: Option<String>,
    demo_url: Option<String>,
    github_data: Option<GitHubRepoData>,
    topics: Option<Vec<ProjectTopic>>,
    sections: Option<Vec<String>>,
    technologies: Option<Vec<String>>,
    notes: Option<String>,
    images: Option<Vec<String>>,
    started_at: Option<String>,
    completed_at: Option<String>,
}

// GET /api/projects
pub fn list(store: &Store) -> ApiResult {
    store.initialize()?;
    let data = store.read_projects()?;
    Ok(ok(data))
}

// POST /api/projects
pub fn create(store: &Store, body: &[u8]) -> ApiResult {
    let payload: ProjectCreate = match parse_body(body) {
        Ok(payload) => payload,
        Err(reply) => return Ok(reply),
    };
    let mut data = store.read_projects()?;

    let project = Project {
        id: new_id("project"),
        title: payload.title.unwrap_or_else(|| "Untitled Project".to_string()),
        description: payload.description.unwrap_or_default(),
        status: payload.status.unwrap_or_default(),
        github_url: payload.github_url,
        demo_url: payload.demo_url,
        github_data: None,
        topics: payload.topics,
        sections: payload.sections,
        technologies: payload.technologies,
        notes: payload.notes.unwrap_or_default(),
        images: payload.images,
        started_at: payload.started_at,
        completed_at: payload.completed_at,
        created_at: now_iso(),
        updated_at: now_iso(),
    };

    data.projects.push(project.clone());
    data.last_updated = now_iso();
    store.write_projects(&data)?;
    Ok(created(project))
}

// GET /api/projects/{id}
pub fn get(store: &Store, project_id: &str) -> ApiResult {
    let data = store.read_projects()?;
    match data.projects.into_iter().find(|p| p.id == project_id) {
        Some(project) => Ok(ok(project)),
        None => Ok(not_found("Project not found")),
    }
}

// PUT /api/projects/{id}
pub fn update(store: &Store, project_id: &str, body: &[u8]) -> ApiResult {
    let updates: ProjectUpdate = match parse_body(body) {
        Ok(updates) => updates,
        Err(reply) => return Ok(reply),
    };
    let mut data = store.read_projects()?;
    let Some(project) = data.projects.iter_mut().find(|p| p.id == project_id) else {
        return Ok(not_found("Project not found"));
    };

    if let Some(title) = updates.title {
        project.title = title;
    }
    if let Some(description) = updates.description {
        project.description = description;
    }
    if let Some(status) = updates.status {
        project.status = status;
    }
    if let Some(github_url) = updates.github_url {
        project.github_url = Some(github_url);
    }
    if let Some(demo_url) = updates.demo_url {
        project.demo_url = Some(demo_url);
    }
    if let Some(github_data) = updates.github_data {
        project.github_data = Some(github_data);
    }
    if let Some(topics) = updates.topics {
        project.topics = topics;
    }
    if let Some(sections) = updates.sections {
        project.sections = sections;
    }
    if let Some(technologies) = updates.technologies {
        project.technologies = technologies;
    }
    if let Some(notes) = updates.notes {
        project.notes = notes;
    }
    if let Some(images) = updates.images {
        project.images = images;
    }
    if let Some(started_at) = updates.started_at {
        project.started_at = Some(started_at);
    }
    if let Some(completed_at) = updates.completed_at {
        project.completed_at = Some(completed_at);
    }
    project.updated_at = now_iso();
    let updated = project.clone();

    data.last_updated = now_iso();
    store.write_projects(&data)?;
    Ok(ok(updated))
}

// DELETE /api/projects/{id}
pub fn delete(store: &Store, project_id: &str) -> ApiResult {
    let mut data = store.read_projects()?;
    let Some(index) = data.projects.iter().position(|p| p.id == project_id) else {
        return Ok(not_found("Project not found"));
    };

    data.projects.remove(index);
    data.last_updated = now_iso();
    store.write_projects(&data)?;
    Ok(ok(serde_json::json!({ "deleted": true })))
}

// POST /api/projects/{id}/github[?force=true] - refresh the cached snapshot.
// A fresh cache short-circuits unless forced; the project must link a repo.
pub fn refresh_github(
    store: &Store,
    project_id: &str,
    query: &Query,
    config_token: Option<&str>,
) -> ApiResult {
    let force = query.get("force").map(String::as_str) == Some("true");

    let mut data = store.read_projects()?;
    let Some(project) = data.projects.iter_mut().find(|p| p.id == project_id) else {
        return Ok(not_found("Project not found"));
    };
    let Some(github_url) = project.github_url.clone() else {
        return Ok(bad_request("Project has no githubUrl"));
    };

    if !force && !github::is_stale(project.github_data.as_ref()) {
        return Ok(ok(project.clone()));
    }

    // Config token wins; the one stored in settings is the fallback
    let settings_token = store.read_settings()?.settings.github_token;
    let token = config_token.or(settings_token.as_deref());

    let snapshot = match github::fetch_snapshot(&github_url, token) {
        Ok(snapshot) => snapshot,
        Err(github::GitHubError::InvalidUrl(url)) => {
            return Ok(bad_request(format!("Not a GitHub repository URL: {}", url)))
        }
        Err(e) => return Ok(super::internal(e.to_string())),
    };

    project.github_data = Some(snapshot);
    project.updated_at = now_iso();
    let updated = project.clone();

    data.last_updated = now_iso();
    store.write_projects(&data)?;
    Ok(ok(updated))
}

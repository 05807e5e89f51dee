//! Typed HTTP client with a local mirror of the server documents
//!
//! The mirror is explicit state: `load_all` pulls every document, and each
//! mutating call sends the request first, then folds the entity the server
//! confirmed back into the mirror. Nothing is updated optimistically.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::model::{
    Note, NotesData, Phase, Project, ProjectsData, ProgressData, Resource, ResourcesData,
    RoadmapData, Section, SectionProgress, SettingsData,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] Box<ureq::Error>),
    #[error("malformed response: {0}")]
    Decode(#[from] std::io::Error),
    #[error("server answered {status}: {message}")]
    Api { status: u16, message: String },
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[allow(dead_code)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

/// Client-side store: the five documents as the server last confirmed them.
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    pub roadmap: Option<RoadmapData>,
    pub progress: Option<ProgressData>,
    pub notes: Option<NotesData>,
    pub resources: Option<ResourcesData>,
    pub projects: Option<ProjectsData>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            roadmap: None,
            progress: None,
            notes: None,
            resources: None,
            projects: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn unwrap_envelope<T>(response: ureq::Response) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let envelope: Envelope<T> = response.into_json()?;
        envelope.data.ok_or_else(|| ClientError::Api {
            status,
            message: envelope
                .error
                .unwrap_or_else(|| "response carried no data".to_string()),
        })
    }

    fn handle<T>(result: Result<ureq::Response, ureq::Error>) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        match result {
            Ok(response) => Self::unwrap_envelope(response),
            Err(ureq::Error::Status(status, response)) => {
                let message = response
                    .into_json::<Envelope<Value>>()
                    .ok()
                    .and_then(|e| e.error)
                    .unwrap_or_else(|| "unknown error".to_string());
                Err(ClientError::Api { status, message })
            }
            Err(e) => Err(ClientError::Http(Box::new(e))),
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        Self::handle(self.agent.get(&self.url(path)).call())
    }

    fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: &Value,
    ) -> Result<T, ClientError> {
        Self::handle(
            self.agent
                .request(method, &self.url(path))
                .set("Content-Type", "application/json")
                .send_string(&body.to_string()),
        )
    }

    fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        Self::handle(self.agent.delete(&self.url(path)).call())
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Pull every document into the mirror.
    pub fn load_all(&mut self) -> Result<(), ClientError> {
        self.roadmap = Some(self.get("/api/roadmap")?);
        self.progress = Some(self.get("/api/progress")?);
        self.notes = Some(self.get("/api/notes")?);
        self.resources = Some(self.get("/api/resources")?);
        self.projects = Some(self.get("/api/projects")?);
        Ok(())
    }

    pub fn fetch_settings(&self) -> Result<SettingsData, ClientError> {
        self.get("/api/settings")
    }

    // =========================================================================
    // Roadmap
    // =========================================================================

    pub fn add_phase(&mut self, payload: Value) -> Result<Phase, ClientError> {
        let phase: Phase = self.send("POST", "/api/roadmap", &payload)?;
        if let Some(roadmap) = &mut self.roadmap {
            roadmap.phases.push(phase.clone());
        }
        Ok(phase)
    }

    pub fn update_phase(&mut self, phase_id: &str, payload: Value) -> Result<Phase, ClientError> {
        let path = format!("/api/roadmap/{}", phase_id);
        let phase: Phase = self.send("PUT", &path, &payload)?;
        if let Some(roadmap) = &mut self.roadmap {
            if let Some(slot) = roadmap.phases.iter_mut().find(|p| p.id == phase_id) {
                *slot = phase.clone();
            }
        }
        Ok(phase)
    }

    pub fn delete_phase(&mut self, phase_id: &str) -> Result<(), ClientError> {
        let _: Value = self.delete(&format!("/api/roadmap/{}", phase_id))?;
        // The server renumbers surviving phases, so refresh the whole document
        self.roadmap = Some(self.get("/api/roadmap")?);
        Ok(())
    }

    pub fn add_section(&mut self, phase_id: &str, payload: Value) -> Result<Section, ClientError> {
        let path = format!("/api/roadmap/{}/sections", phase_id);
        let section: Section = self.send("POST", &path, &payload)?;
        if let Some(roadmap) = &mut self.roadmap {
            if let Some(phase) = roadmap.phases.iter_mut().find(|p| p.id == phase_id) {
                phase.sections.push(section.clone());
            }
        }
        Ok(section)
    }

    pub fn get_section(&self, phase_id: &str, section_id: &str) -> Result<Section, ClientError> {
        self.get(&format!("/api/roadmap/{}/sections/{}", phase_id, section_id))
    }

    pub fn update_section(
        &mut self,
        phase_id: &str,
        section_id: &str,
        payload: Value,
    ) -> Result<Section, ClientError> {
        let path = format!("/api/roadmap/{}/sections/{}", phase_id, section_id);
        let section: Section = self.send("PUT", &path, &payload)?;
        if let Some(roadmap) = &mut self.roadmap {
            if let Some(phase) = roadmap.phases.iter_mut().find(|p| p.id == phase_id) {
                if let Some(slot) = phase.sections.iter_mut().find(|s| s.id == section_id) {
                    *slot = section.clone();
                }
            }
        }
        Ok(section)
    }

    // =========================================================================
    // Progress
    // =========================================================================

    pub fn patch_progress(
        &mut self,
        section_id: &str,
        payload: Value,
    ) -> Result<SectionProgress, ClientError> {
        let path = format!("/api/progress/{}", section_id);
        let entry: SectionProgress = self.send("PATCH", &path, &payload)?;
        if let Some(progress) = &mut self.progress {
            progress
                .sections
                .insert(section_id.to_string(), entry.clone());
        }
        Ok(entry)
    }

    // =========================================================================
    // Notes
    // =========================================================================

    pub fn create_note(&mut self, payload: Value) -> Result<Note, ClientError> {
        let note: Note = self.send("POST", "/api/notes", &payload)?;
        if let Some(notes) = &mut self.notes {
            notes.notes.insert(0, note.clone());
        }
        Ok(note)
    }

    pub fn update_note(&mut self, note_id: &str, payload: Value) -> Result<Note, ClientError> {
        let note: Note = self.send("PUT", &format!("/api/notes/{}", note_id), &payload)?;
        if let Some(notes) = &mut self.notes {
            if let Some(slot) = notes.notes.iter_mut().find(|n| n.id == note_id) {
                *slot = note.clone();
            }
        }
        Ok(note)
    }

    pub fn delete_note(&mut self, note_id: &str) -> Result<(), ClientError> {
        let _: Value = self.delete(&format!("/api/notes/{}", note_id))?;
        if let Some(notes) = &mut self.notes {
            notes.notes.retain(|n| n.id != note_id);
        }
        Ok(())
    }

    /// Server-side filtering; does not touch the mirror.
    pub fn search_notes(&self, query: &str) -> Result<NotesData, ClientError> {
        let encoded: String = serde_urlencoded::to_string([("q", query)]).unwrap_or_default();
        self.get(&format!("/api/notes?{}", encoded))
    }

    // =========================================================================
    // Resources
    // =========================================================================

    pub fn create_resource(&mut self, payload: Value) -> Result<Resource, ClientError> {
        let resource: Resource = self.send("POST", "/api/resources", &payload)?;
        if let Some(resources) = &mut self.resources {
            resources.resources.push(resource.clone());
        }
        Ok(resource)
    }

    pub fn delete_resource(&mut self, resource_id: &str) -> Result<(), ClientError> {
        let _: Value = self.delete(&format!("/api/resources/{}", resource_id))?;
        if let Some(resources) = &mut self.resources {
            resources.resources.retain(|r| r.id != resource_id);
        }
        Ok(())
    }

    // =========================================================================
    // Projects
    // =========================================================================

    pub fn create_project(&mut self, payload: Value) -> Result<Project, ClientError> {
        let project: Project = self.send("POST", "/api/projects", &payload)?;
        if let Some(projects) = &mut self.projects {
            projects.projects.push(project.clone());
        }
        Ok(project)
    }

    pub fn update_project(
        &mut self,
        project_id: &str,
        payload: Value,
    ) -> Result<Project, ClientError> {
        let path = format!("/api/projects/{}", project_id);
        let project: Project = self.send("PUT", &path, &payload)?;
        self.mirror_project(project.clone());
        Ok(project)
    }

    pub fn refresh_project_github(
        &mut self,
        project_id: &str,
        force: bool,
    ) -> Result<Project, ClientError> {
        let path = if force {
            format!("/api/projects/{}/github?force=true", project_id)
        } else {
            format!("/api/projects/{}/github", project_id)
        };
        let project: Project = self.send("POST", &path, &json!({}))?;
        self.mirror_project(project.clone());
        Ok(project)
    }

    fn mirror_project(&mut self, project: Project) {
        if let Some(projects) = &mut self.projects {
            if let Some(slot) = projects.projects.iter_mut().find(|p| p.id == project.id) {
                *slot = project;
            }
        }
    }

    // =========================================================================
    // Settings and maintenance
    // =========================================================================

    pub fn record_study_session(&self, payload: Value) -> Result<SettingsData, ClientError> {
        self.send("POST", "/api/settings", &payload)
    }

    pub fn backup(&self) -> Result<Value, ClientError> {
        self.send("POST", "/api/backup", &json!({}))
    }
}

//! Roadmap endpoints: phases and their sections
//!
//! Phases and sections are ordered collections; deletes renumber the
//! surviving siblings so `order` stays a dense 1-based sequence. Section GET
//! applies the legacy-topic migration lazily and persists the result only
//! when it actually changed the stored shape.

use serde::{Deserialize, Deserializer};

use super::{created, not_found, ok, parse_body, ApiResult};
use crate::migrate::normalize_section;
use crate::model::{
    new_id, now_iso, Attachment, LearningResource, Phase, RoadmapData, Section, Task, TopicEntry,
};
use crate::store::Store;

/// Distinguishes an absent field from an explicit null, so `null` can clear
/// an optional value during a merge.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhaseCreate {
    id: Option<String>,
    title: Option<String>,
    duration: Option<String>,
    description: Option<String>,
    sections: Option<Vec<Section>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhaseUpdate {
    title: Option<String>,
    duration: Option<String>,
    description: Option<String>,
    sections: Option<Vec<Section>>,
    order: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionCreate {
    id: Option<String>,
    title: Option<String>,
    topics: Option<Vec<TopicEntry>>,
    why: Option<String>,
    how: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionUpdate {
    title: Option<String>,
    topics: Option<Vec<TopicEntry>>,
    tasks: Option<Vec<Task>>,
    attachments: Option<Vec<Attachment>>,
    #[serde(default, deserialize_with = "double_option")]
    learning_resource: Option<Option<LearningResource>>,
    why: Option<String>,
    how: Option<String>,
    order: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderRequest {
    section_ids: Vec<String>,
}

// GET /api/roadmap
pub fn get_roadmap(store: &Store) -> ApiResult {
    store.initialize()?;
    let roadmap = store.read_roadmap()?;
    Ok(ok(roadmap))
}

// PUT /api/roadmap - replace the whole document
pub fn put_roadmap(store: &Store, body: &[u8]) -> ApiResult {
    let mut data: RoadmapData = match parse_body(body) {
        Ok(data) => data,
        Err(reply) => return Ok(reply),
    };
    data.last_updated = now_iso();
    store.write_roadmap(&data)?;
    Ok(ok(data))
}

// POST /api/roadmap - add a phase at the end
pub fn add_phase(store: &Store, body: &[u8]) -> ApiResult {
    let payload: PhaseCreate = match parse_body(body) {
        Ok(payload) => payload,
        Err(reply) => return Ok(reply),
    };
    let mut roadmap = store.read_roadmap()?;

    let phase = Phase {
        id: payload.id.unwrap_or_else(|| new_id("phase")),
        title: payload.title.unwrap_or_else(|| "New Phase".to_string()),
        duration: payload.duration.unwrap_or_else(|| "TBD".to_string()),
        description: payload.description.unwrap_or_default(),
        sections: payload.sections.unwrap_or_default(),
        order: roadmap.phases.len() as u32 + 1,
    };

    roadmap.phases.push(phase.clone());
    roadmap.last_updated = now_iso();
    store.write_roadmap(&roadmap)?;
    Ok(created(phase))
}

// GET /api/roadmap/{phaseId}
pub fn get_phase(store: &Store, phase_id: &str) -> ApiResult {
    let roadmap = store.read_roadmap()?;
    match roadmap.phases.into_iter().find(|p| p.id == phase_id) {
        Some(phase) => Ok(ok(phase)),
        None => Ok(not_found("Phase not found")),
    }
}

// PUT /api/roadmap/{phaseId} - shallow-merge provided fields
pub fn update_phase(store: &Store, phase_id: &str, body: &[u8]) -> ApiResult {
    let updates: PhaseUpdate = match parse_body(body) {
        Ok(updates) => updates,
        Err(reply) => return Ok(reply),
    };
    let mut roadmap = store.read_roadmap()?;
    let Some(phase) = roadmap.phases.iter_mut().find(|p| p.id == phase_id) else {
        return Ok(not_found("Phase not found"));
    };

    if let Some(title) = updates.title {
        phase.title = title;
    }
    if let Some(duration) = updates.duration {
        phase.duration = duration;
    }
    if let Some(description) = updates.description {
        phase.description = description;
    }
    if let Some(sections) = updates.sections {
        phase.sections = sections;
    }
    if let Some(order) = updates.order {
        phase.order = order;
    }
    let updated = phase.clone();

    roadmap.last_updated = now_iso();
    store.write_roadmap(&roadmap)?;
    Ok(ok(updated))
}

// DELETE /api/roadmap/{phaseId} - renumber survivors
pub fn delete_phase(store: &Store, phase_id: &str) -> ApiResult {
    let mut roadmap = store.read_roadmap()?;
    let Some(index) = roadmap.phases.iter().position(|p| p.id == phase_id) else {
        return Ok(not_found("Phase not found"));
    };

    roadmap.phases.remove(index);
    for (i, phase) in roadmap.phases.iter_mut().enumerate() {
        phase.order = i as u32 + 1;
    }
    roadmap.last_updated = now_iso();
    store.write_roadmap(&roadmap)?;
    Ok(ok(serde_json::json!({ "deleted": true })))
}

// POST /api/roadmap/{phaseId}/sections
pub fn add_section(store: &Store, phase_id: &str, body: &[u8]) -> ApiResult {
    let payload: SectionCreate = match parse_body(body) {
        Ok(payload) => payload,
        Err(reply) => return Ok(reply),
    };
    let mut roadmap = store.read_roadmap()?;
    let Some(phase) = roadmap.phases.iter_mut().find(|p| p.id == phase_id) else {
        return Ok(not_found("Phase not found"));
    };

    let section = Section {
        id: payload.id.unwrap_or_else(|| new_id("section")),
        title: payload.title.unwrap_or_else(|| "New Section".to_string()),
        topics: payload.topics.unwrap_or_default(),
        tasks: vec![],
        attachments: vec![],
        learning_resource: None,
        why: payload.why.unwrap_or_default(),
        how: payload.how.unwrap_or_default(),
        order: phase.sections.len() as u32 + 1,
    };

    phase.sections.push(section.clone());
    roadmap.last_updated = now_iso();
    store.write_roadmap(&roadmap)?;
    Ok(created(section))
}

// PUT /api/roadmap/{phaseId}/sections - reorder by explicit id list.
// Ids missing from the list are dropped; survivors are renumbered 1..n.
pub fn reorder_sections(store: &Store, phase_id: &str, body: &[u8]) -> ApiResult {
    let payload: ReorderRequest = match parse_body(body) {
        Ok(payload) => payload,
        Err(reply) => return Ok(reply),
    };
    let mut roadmap = store.read_roadmap()?;
    let Some(phase) = roadmap.phases.iter_mut().find(|p| p.id == phase_id) else {
        return Ok(not_found("Phase not found"));
    };

    let mut reordered = Vec::with_capacity(payload.section_ids.len());
    for (i, id) in payload.section_ids.iter().enumerate() {
        if let Some(mut section) = phase.sections.iter().find(|s| &s.id == id).cloned() {
            section.order = i as u32 + 1;
            reordered.push(section);
        }
    }
    phase.sections = reordered.clone();

    roadmap.last_updated = now_iso();
    store.write_roadmap(&roadmap)?;
    Ok(ok(reordered))
}

// GET /api/roadmap/{phaseId}/sections/{sectionId} - with lazy migration
pub fn get_section(store: &Store, phase_id: &str, section_id: &str) -> ApiResult {
    let mut roadmap = store.read_roadmap()?;
    let Some(phase) = roadmap.phases.iter_mut().find(|p| p.id == phase_id) else {
        return Ok(not_found("Phase not found"));
    };
    let Some(index) = phase.sections.iter().position(|s| s.id == section_id) else {
        return Ok(not_found("Section not found"));
    };

    let migrated = normalize_section(phase.sections[index].clone());
    if migrated != phase.sections[index] {
        phase.sections[index] = migrated.clone();
        roadmap.last_updated = now_iso();
        store.write_roadmap(&roadmap)?;
    }
    Ok(ok(migrated))
}

// PUT /api/roadmap/{phaseId}/sections/{sectionId}
pub fn update_section(store: &Store, phase_id: &str, section_id: &str, body: &[u8]) -> ApiResult {
    let updates: SectionUpdate = match parse_body(body) {
        Ok(updates) => updates,
        Err(reply) => return Ok(reply),
    };
    let mut roadmap = store.read_roadmap()?;
    let Some(phase) = roadmap.phases.iter_mut().find(|p| p.id == phase_id) else {
        return Ok(not_found("Phase not found"));
    };
    let Some(section) = phase.sections.iter_mut().find(|s| s.id == section_id) else {
        return Ok(not_found("Section not found"));
    };

    if let Some(title) = updates.title {
        section.title = title;
    }
    if let Some(topics) = updates.topics {
        section.topics = topics;
    }
    if let Some(tasks) = updates.tasks {
        section.tasks = tasks;
    }
    if let Some(attachments) = updates.attachments {
        section.attachments = attachments;
    }
    if let Some(learning_resource) = updates.learning_resource {
        // An explicit null detaches the learning resource
        section.learning_resource = learning_resource;
    }
    if let Some(why) = updates.why {
        section.why = why;
    }
    if let Some(how) = updates.how {
        section.how = how;
    }
    if let Some(order) = updates.order {
        section.order = order;
    }
    let updated = section.clone();

    roadmap.last_updated = now_iso();
    store.write_roadmap(&roadmap)?;
    Ok(ok(updated))
}

// DELETE /api/roadmap/{phaseId}/sections/{sectionId} - renumber survivors
pub fn delete_section(store: &Store, phase_id: &str, section_id: &str) -> ApiResult {
    let mut roadmap = store.read_roadmap()?;
    let Some(phase) = roadmap.phases.iter_mut().find(|p| p.id == phase_id) else {
        return Ok(not_found("Phase not found"));
    };
    let Some(index) = phase.sections.iter().position(|s| s.id == section_id) else {
        return Ok(not_found("Section not found"));
    };

    phase.sections.remove(index);
    for (i, section) in phase.sections.iter_mut().enumerate() {
        section.order = i as u32 + 1;
    }
    roadmap.last_updated = now_iso();
    store.write_roadmap(&roadmap)?;
    Ok(ok(serde_json::json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("data"));
        (dir, store)
    }

    fn phase_ids(store: &Store) -> Vec<(String, u32)> {
        store
            .read_roadmap()
            .unwrap()
            .phases
            .iter()
            .map(|p| (p.id.clone(), p.order))
            .collect()
    }

    #[test]
    fn test_add_phase_defaults_and_order() {
        let (_dir, store) = store();
        let reply = add_phase(&store, b"{}").unwrap();
        assert_eq!(reply.status, 201);
        assert!(reply.body.contains("\"title\":\"New Phase\""));
        assert!(reply.body.contains("\"duration\":\"TBD\""));
        assert!(reply.body.contains("\"order\":1"));

        let reply = add_phase(&store, br#"{"title":"Streaming"}"#).unwrap();
        assert!(reply.body.contains("\"order\":2"));
    }

    #[test]
    fn test_delete_phase_renumbers_dense() {
        let (_dir, store) = store();
        for title in ["a", "b", "c"] {
            let body = format!(r#"{{"title":"{}"}}"#, title);
            add_phase(&store, body.as_bytes()).unwrap();
        }
        let ids = phase_ids(&store);
        assert_eq!(ids.iter().map(|(_, o)| *o).collect::<Vec<_>>(), [1, 2, 3]);

        // Delete the middle phase: first and third remain with orders 1, 2
        delete_phase(&store, &ids[1].0).unwrap();
        let after = phase_ids(&store);
        assert_eq!(after.len(), 2);
        assert_eq!(after[0], (ids[0].0.clone(), 1));
        assert_eq!(after[1], (ids[2].0.clone(), 2));
    }

    #[test]
    fn test_delete_unknown_phase_is_404() {
        let (_dir, store) = store();
        let reply = delete_phase(&store, "phase-missing").unwrap();
        assert_eq!(reply.status, 404);
    }

    #[test]
    fn test_update_phase_merges_and_keeps_id() {
        let (_dir, store) = store();
        add_phase(&store, br#"{"id":"phase-1","title":"Old"}"#).unwrap();
        let reply = update_phase(&store, "phase-1", br#"{"title":"Renamed"}"#).unwrap();
        assert_eq!(reply.status, 200);

        let roadmap = store.read_roadmap().unwrap();
        assert_eq!(roadmap.phases[0].title, "Renamed");
        assert_eq!(roadmap.phases[0].id, "phase-1");
        assert_eq!(roadmap.phases[0].duration, "TBD");
    }

    #[test]
    fn test_section_lifecycle_and_renumbering() {
        let (_dir, store) = store();
        add_phase(&store, br#"{"id":"phase-1"}"#).unwrap();
        for id in ["section-a", "section-b", "section-c"] {
            let body = format!(r#"{{"id":"{}"}}"#, id);
            add_section(&store, "phase-1", body.as_bytes()).unwrap();
        }

        delete_section(&store, "phase-1", "section-b").unwrap();
        let roadmap = store.read_roadmap().unwrap();
        let sections = &roadmap.phases[0].sections;
        assert_eq!(sections.len(), 2);
        assert_eq!((sections[0].id.as_str(), sections[0].order), ("section-a", 1));
        assert_eq!((sections[1].id.as_str(), sections[1].order), ("section-c", 2));
    }

    #[test]
    fn test_reorder_sections_drops_unknown_ids() {
        let (_dir, store) = store();
        add_phase(&store, br#"{"id":"phase-1"}"#).unwrap();
        for id in ["section-a", "section-b"] {
            let body = format!(r#"{{"id":"{}"}}"#, id);
            add_section(&store, "phase-1", body.as_bytes()).unwrap();
        }

        let body = br#"{"sectionIds":["section-b","section-ghost","section-a"]}"#;
        reorder_sections(&store, "phase-1", body).unwrap();

        let roadmap = store.read_roadmap().unwrap();
        let sections = &roadmap.phases[0].sections;
        assert_eq!(sections[0].id, "section-b");
        assert_eq!(sections[0].order, 1);
        assert_eq!(sections[1].id, "section-a");
        assert_eq!(sections[1].order, 2);
    }

    #[test]
    fn test_get_section_migrates_and_persists() {
        let (_dir, store) = store();
        add_phase(&store, br#"{"id":"phase-1"}"#).unwrap();
        add_section(
            &store,
            "phase-1",
            br#"{"id":"section-1","topics":["Hashing","Replication"]}"#,
        )
        .unwrap();

        let reply = get_section(&store, "phase-1", "section-1").unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("topic-section-1-1"));

        // The migrated shape was written back to disk
        let roadmap = store.read_roadmap().unwrap();
        let section = &roadmap.phases[0].sections[0];
        assert!(section
            .topics
            .iter()
            .all(|t| matches!(t, TopicEntry::Structured(_))));
    }

    #[test]
    fn test_update_section_null_clears_learning_resource() {
        let (_dir, store) = store();
        add_phase(&store, br#"{"id":"phase-1"}"#).unwrap();
        add_section(&store, "phase-1", br#"{"id":"section-1"}"#).unwrap();

        let attach = br#"{"learningResource":{"id":"lr-1","type":"course","title":"DDIA"}}"#;
        update_section(&store, "phase-1", "section-1", attach).unwrap();
        let roadmap = store.read_roadmap().unwrap();
        assert!(roadmap.phases[0].sections[0].learning_resource.is_some());

        update_section(&store, "phase-1", "section-1", br#"{"learningResource":null}"#).unwrap();
        let roadmap = store.read_roadmap().unwrap();
        assert!(roadmap.phases[0].sections[0].learning_resource.is_none());
    }
}

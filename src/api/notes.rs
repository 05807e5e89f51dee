//! Notes endpoints
//!
//! Notes live newest-first; creation prepends. Listing supports equality
//! filtering on `sectionId` and a case-insensitive substring search over
//! title and content via `q`.

use serde::Deserialize;

use super::{bad_request, created, not_found, ok, parse_body, ApiResult, Query};
use crate::model::{new_id, now_iso, Note, NotesData};
use crate::store::Store;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteCreate {
    title: Option<String>,
    content: Option<String>,
    section_id: Option<String>,
    topic_id: Option<String>,
    template: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteUpdate {
    title: Option<String>,
    content: Option<String>,
    section_id: Option<String>,
    topic_id: Option<String>,
    linked_notes: Option<Vec<String>>,
    template: Option<String>,
    images: Option<Vec<String>>,
    tags: Option<Vec<String>>,
}

// GET /api/notes - optional sectionId / q filters
pub fn list(store: &Store, query: &Query) -> ApiResult {
    store.initialize()?;
    let data = store.read_notes()?;

    let section_id = query.get("sectionId");
    let search = query.get("q").map(|q| q.to_lowercase());
    if section_id.is_none() && search.is_none() {
        return Ok(ok(data));
    }

    let notes: Vec<Note> = data
        .notes
        .into_iter()
        .filter(|n| section_id.map_or(true, |sid| n.section_id.as_ref() == Some(sid)))
        .filter(|n| {
            search.as_ref().map_or(true, |q| {
                n.title.to_lowercase().contains(q) || n.content.to_lowercase().contains(q)
            })
        })
        .collect();

    Ok(ok(NotesData {
        notes,
        last_updated: data.last_updated,
    }))
}

// POST /api/notes
pub fn create(store: &Store, body: &[u8]) -> ApiResult {
    let payload: NoteCreate = match parse_body(body) {
        Ok(payload) => payload,
        Err(reply) => return Ok(reply),
    };
    let (Some(title), Some(content)) = (payload.title, payload.content) else {
        return Ok(bad_request("title and content are required"));
    };
    if title.is_empty() || content.is_empty() {
        return Ok(bad_request("title and content are required"));
    }

    let mut data = store.read_notes()?;
    let note = Note {
        id: new_id("note"),
        title,
        content,
        section_id: payload.section_id,
        topic_id: payload.topic_id,
        linked_notes: None,
        template: payload.template,
        created_at: now_iso(),
        updated_at: now_iso(),
        images: payload.images,
        tags: Some(payload.tags),
    };

    // Newest first
    data.notes.insert(0, note.clone());
    data.last_updated = now_iso();
    store.write_notes(&data)?;
    Ok(created(note))
}

// GET /api/notes/{id}
pub fn get(store: &Store, note_id: &str) -> ApiResult {
    let data = store.read_notes()?;
    match data.notes.into_iter().find(|n| n.id == note_id) {
        Some(note) => Ok(ok(note)),
        None => Ok(not_found("Note not found")),
    }
}

// PUT /api/notes/{id}
pub fn update(store: &Store, note_id: &str, body: &[u8]) -> ApiResult {
    let updates: NoteUpdate = match parse_body(body) {
        Ok(updates) => updates,
        Err(reply) => return Ok(reply),
    };
    let mut data = store.read_notes()?;
    let Some(note) = data.notes.iter_mut().find(|n| n.id == note_id) else {
        return Ok(not_found("Note not found"));
    };

    if let Some(title) = updates.title {
        note.title = title;
    }
    if let Some(content) = updates.content {
        note.content = content;
    }
    if let Some(section_id) = updates.section_id {
        note.section_id = Some(section_id);
    }
    if let Some(topic_id) = updates.topic_id {
        note.topic_id = Some(topic_id);
    }
    if let Some(linked_notes) = updates.linked_notes {
        note.linked_notes = Some(linked_notes);
    }
    if let Some(template) = updates.template {
        note.template = Some(template);
    }
    if let Some(images) = updates.images {
        note.images = images;
    }
    if let Some(tags) = updates.tags {
        note.tags = Some(tags);
    }
    note.updated_at = now_iso();
    let updated = note.clone();

    data.last_updated = now_iso();
    store.write_notes(&data)?;
    Ok(ok(updated))
}

// DELETE /api/notes/{id}
pub fn delete(store: &Store, note_id: &str) -> ApiResult {
    let mut data = store.read_notes()?;
    let Some(index) = data.notes.iter().position(|n| n.id == note_id) else {
        return Ok(not_found("Note not found"));
    };

    data.notes.remove(index);
    data.last_updated = now_iso();
    store.write_notes(&data)?;
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

    fn query(pairs: &[(&str, &str)]) -> Query {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_create_requires_title_and_content() {
        let (_dir, store) = store();
        let reply = create(&store, br#"{"title":"only a title"}"#).unwrap();
        assert_eq!(reply.status, 400);

        let reply = create(&store, br#"{"title":"","content":""}"#).unwrap();
        assert_eq!(reply.status, 400);

        assert!(store.read_notes().unwrap().notes.is_empty());
    }

    #[test]
    fn test_create_prepends_newest_first() {
        let (_dir, store) = store();
        create(&store, br#"{"title":"first","content":"a"}"#).unwrap();
        create(&store, br#"{"title":"second","content":"b"}"#).unwrap();

        let data = store.read_notes().unwrap();
        assert_eq!(data.notes[0].title, "second");
        assert_eq!(data.notes[1].title, "first");
    }

    #[test]
    fn test_created_note_has_prefixed_id() {
        let (_dir, store) = store();
        let reply = create(&store, br#"{"title":"X","content":"Y","sectionId":"s1"}"#).unwrap();
        assert_eq!(reply.status, 201);

        let data = store.read_notes().unwrap();
        let note = &data.notes[0];
        assert!(note.id.starts_with("note-"));
        assert_eq!(note.id.len(), "note-".len() + 8);
        assert_eq!(note.section_id.as_deref(), Some("s1"));
        assert!(chrono::DateTime::parse_from_rfc3339(&note.created_at).is_ok());
    }

    #[test]
    fn test_list_filters_by_section_and_search() {
        let (_dir, store) = store();
        create(&store, br#"{"title":"Joins","content":"hash joins","sectionId":"s1"}"#).unwrap();
        create(&store, br#"{"title":"Kafka","content":"consumer groups","sectionId":"s2"}"#)
            .unwrap();

        let reply = list(&store, &query(&[("sectionId", "s1")])).unwrap();
        assert!(reply.body.contains("Joins"));
        assert!(!reply.body.contains("Kafka"));

        let reply = list(&store, &query(&[("q", "CONSUMER")])).unwrap();
        assert!(reply.body.contains("Kafka"));
        assert!(!reply.body.contains("Joins"));
    }

    #[test]
    fn test_update_merges_and_bumps_updated_at() {
        let (_dir, store) = store();
        create(&store, br#"{"title":"X","content":"Y"}"#).unwrap();
        let id = store.read_notes().unwrap().notes[0].id.clone();

        let reply = update(&store, &id, br#"{"content":"Z"}"#).unwrap();
        assert_eq!(reply.status, 200);
        let note = store.read_notes().unwrap().notes[0].clone();
        assert_eq!(note.title, "X");
        assert_eq!(note.content, "Z");
    }

    #[test]
    fn test_delete_then_absent() {
        let (_dir, store) = store();
        create(&store, br#"{"title":"X","content":"Y"}"#).unwrap();
        let id = store.read_notes().unwrap().notes[0].id.clone();

        let reply = delete(&store, &id).unwrap();
        assert_eq!(reply.status, 200);
        assert!(store.read_notes().unwrap().notes.is_empty());

        let reply = delete(&store, &id).unwrap();
        assert_eq!(reply.status, 404);
    }
}

//! End-to-end tests over a real HTTP round trip: each test gets its own
//! server on an OS-assigned port backed by a throwaway data directory.

use std::io::Read;
use std::thread;

use serde_json::json;
use tempfile::TempDir;
use tiny_http::Server;

use trailmap::serve::{serve, ServerContext};
use trailmap::{ApiClient, ClientError, SectionStatus, Store};

fn spawn_server() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path().join("data"));
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let ctx = ServerContext {
        store,
        github_token: None,
    };
    thread::spawn(move || serve(server, ctx));
    (dir, format!("http://127.0.0.1:{}", port))
}

#[test]
fn test_note_create_filter_delete_scenario() {
    let (_dir, base) = spawn_server();
    let mut client = ApiClient::new(&base);
    client.load_all().unwrap();
    assert!(client.notes.as_ref().unwrap().notes.is_empty());

    let joins = client
        .create_note(json!({
            "title": "Window functions",
            "content": "OVER (PARTITION BY ...) runs after WHERE",
            "sectionId": "sql-advanced",
        }))
        .unwrap();
    assert!(joins.id.starts_with("note-"));
    client
        .create_note(json!({
            "title": "Normalization",
            "content": "3NF removes transitive dependencies",
            "sectionId": "sql-design",
        }))
        .unwrap();

    // Newest first in the mirror too
    assert_eq!(client.notes.as_ref().unwrap().notes[0].title, "Normalization");

    // Server-side substring search is case-insensitive
    let hits = client.search_notes("partition").unwrap();
    assert_eq!(hits.notes.len(), 1);
    assert_eq!(hits.notes[0].id, joins.id);

    client.delete_note(&joins.id).unwrap();
    let err = client.search_notes("partition").unwrap();
    assert!(err.notes.is_empty());

    // Deleting again answers 404 through the typed error
    match client.delete_note(&joins.id) {
        Err(ClientError::Api { status: 404, .. }) => {}
        other => panic!("expected 404, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_title_is_rejected() {
    let (_dir, base) = spawn_server();
    let mut client = ApiClient::new(&base);
    let err = client.create_note(json!({ "content": "no title" }));
    match err {
        Err(ClientError::Api { status: 400, message }) => {
            assert!(message.contains("title"));
        }
        other => panic!("expected 400, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_roadmap_phase_and_section_lifecycle() {
    let (_dir, base) = spawn_server();
    let mut client = ApiClient::new(&base);
    client.load_all().unwrap();

    let phase = client
        .add_phase(json!({ "title": "Foundations", "duration": "4 weeks" }))
        .unwrap();
    assert!(phase.id.starts_with("phase-"));
    assert_eq!(phase.order, 1);

    let section = client
        .add_section(&phase.id, json!({ "title": "Relational model" }))
        .unwrap();
    assert!(section.id.starts_with("section-"));

    let updated = client
        .update_section(&phase.id, &section.id, json!({ "why": "Everything builds on it" }))
        .unwrap();
    assert_eq!(updated.id, section.id);
    assert_eq!(updated.why, "Everything builds on it");
    assert_eq!(updated.title, "Relational model");

    // Mirror tracks the server's copy
    let mirrored = &client.roadmap.as_ref().unwrap().phases[0].sections[0];
    assert_eq!(mirrored.why, "Everything builds on it");

    client.delete_phase(&phase.id).unwrap();
    assert!(client.roadmap.as_ref().unwrap().phases.is_empty());
}

#[test]
fn test_phase_delete_renumbers_survivors() {
    let (_dir, base) = spawn_server();
    let mut client = ApiClient::new(&base);
    client.load_all().unwrap();

    let a = client.add_phase(json!({ "title": "A" })).unwrap();
    let b = client.add_phase(json!({ "title": "B" })).unwrap();
    let c = client.add_phase(json!({ "title": "C" })).unwrap();
    assert_eq!((a.order, b.order, c.order), (1, 2, 3));

    client.delete_phase(&b.id).unwrap();
    let phases = &client.roadmap.as_ref().unwrap().phases;
    let orders: Vec<u32> = phases.iter().map(|p| p.order).collect();
    assert_eq!(orders, vec![1, 2]);
    assert_eq!(phases[1].title, "C");
}

#[test]
fn test_progress_patch_transitions_over_http() {
    let (_dir, base) = spawn_server();
    let mut client = ApiClient::new(&base);
    client.load_all().unwrap();

    let entry = client
        .patch_progress("sql-advanced", json!({ "status": "in-progress", "progress": 40 }))
        .unwrap();
    assert_eq!(entry.status, SectionStatus::InProgress);
    assert_eq!(entry.progress, 40);
    let started = entry.start_date.clone().expect("startDate stamped");

    // Reaching 100 completes the section; startDate is preserved
    let done = client
        .patch_progress("sql-advanced", json!({ "progress": 100 }))
        .unwrap();
    assert_eq!(done.status, SectionStatus::Completed);
    assert_eq!(done.start_date.as_deref(), Some(started.as_str()));
    assert!(done.completed_date.is_some());

    // Out-of-range input is clamped
    let clamped = client
        .patch_progress("another", json!({ "progress": 150 }))
        .unwrap();
    assert_eq!(clamped.progress, 100);
}

#[test]
fn test_upload_rejection_and_serving() {
    let (dir, base) = spawn_server();

    // Disallowed type never reaches disk
    let rejected = ureq::post(&format!(
        "{}/api/upload?sectionId=s1&filename=evil.exe",
        base
    ))
    .set("Content-Type", "application/x-msdownload")
    .send_bytes(b"MZ");
    match rejected {
        Err(ureq::Error::Status(400, _)) => {}
        other => panic!("expected 400, got {:?}", other.map(|_| ())),
    }
    let uploads_dir = dir.path().join("data").join("uploads").join("s1");
    assert!(!uploads_dir.exists());

    // Allowed upload is stored and served back byte for byte
    let accepted = ureq::post(&format!(
        "{}/api/upload?sectionId=s1&filename=cheatsheet.md",
        base
    ))
    .set("Content-Type", "text/markdown")
    .send_bytes(b"# SQL cheatsheet")
    .unwrap();
    assert_eq!(accepted.status(), 201);
    let body: serde_json::Value = accepted.into_json().unwrap();
    let url = body["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/s1/"));

    let fetched = ureq::get(&format!("{}{}", base, url)).call().unwrap();
    assert_eq!(fetched.header("Content-Type"), Some("text/markdown"));
    let mut served = String::new();
    fetched.into_reader().read_to_string(&mut served).unwrap();
    assert_eq!(served, "# SQL cheatsheet");
}

#[test]
fn test_study_session_and_backup() {
    let (dir, base) = spawn_server();
    let client = ApiClient::new(&base);

    let settings = client
        .record_study_session(json!({ "durationMinutes": 25, "sectionId": "sql-basics" }))
        .unwrap();
    assert_eq!(settings.streak.current_streak, 1);
    assert_eq!(settings.streak.study_sessions.len(), 1);

    let backup = client.backup().unwrap();
    let path = std::path::PathBuf::from(backup["path"].as_str().unwrap());
    assert!(path.exists());
    assert!(path.join("settings.json").exists());
    assert!(path.starts_with(dir.path()));
}

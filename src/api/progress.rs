//! Progress endpoints
//!
//! Progress is a map from section id to status/percentage. Entries appear
//! lazily on first write; reading an untouched section answers the implicit
//! not-started value. PATCH carries the status transition rules: completion
//! pins progress to 100, restarting clears dates, and percentage edits can
//! auto-promote the status.

use serde::Deserialize;

use super::{created, ok, parse_body, ApiResult};
use crate::model::{now_iso, ProgressData, SectionProgress, SectionStatus};
use crate::store::Store;

#[derive(Debug, Deserialize)]
struct ProgressInit {
    #[serde(rename = "sectionId")]
    section_id: String,
    status: Option<SectionStatus>,
    progress: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressPut {
    status: Option<SectionStatus>,
    progress: Option<i64>,
    start_date: Option<String>,
    completed_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProgressPatch {
    status: Option<SectionStatus>,
    progress: Option<i64>,
}

fn clamp_percent(value: i64) -> u32 {
    value.clamp(0, 100) as u32
}

// GET /api/progress
pub fn get_all(store: &Store) -> ApiResult {
    store.initialize()?;
    let progress = store.read_progress()?;
    Ok(ok(progress))
}

// PUT /api/progress - replace the whole document
pub fn put_all(store: &Store, body: &[u8]) -> ApiResult {
    let mut data: ProgressData = match parse_body(body) {
        Ok(data) => data,
        Err(reply) => return Ok(reply),
    };
    data.last_updated = now_iso();
    store.write_progress(&data)?;
    Ok(ok(data))
}

// POST /api/progress - initialize one section's entry
pub fn init_section(store: &Store, body: &[u8]) -> ApiResult {
    let payload: ProgressInit = match parse_body(body) {
        Ok(payload) => payload,
        Err(reply) => return Ok(reply),
    };
    let status = payload.status.unwrap_or(SectionStatus::NotStarted);
    let entry = SectionProgress {
        status,
        progress: clamp_percent(payload.progress.unwrap_or(0)),
        start_date: (status == SectionStatus::InProgress).then(now_iso),
        completed_date: (status == SectionStatus::Completed).then(now_iso),
        last_updated: now_iso(),
    };

    let mut data = store.read_progress()?;
    data.sections.insert(payload.section_id, entry.clone());
    data.last_updated = now_iso();
    store.write_progress(&data)?;
    Ok(created(entry))
}

// GET /api/progress/{sectionId} - absent entries read as not-started
pub fn get_section(store: &Store, section_id: &str) -> ApiResult {
    let data = store.read_progress()?;
    let entry = data
        .sections
        .get(section_id)
        .cloned()
        .unwrap_or_else(SectionProgress::not_started);
    Ok(ok(entry))
}

// PUT /api/progress/{sectionId} - shallow-merge over the existing entry
pub fn put_section(store: &Store, section_id: &str, body: &[u8]) -> ApiResult {
    let updates: ProgressPut = match parse_body(body) {
        Ok(updates) => updates,
        Err(reply) => return Ok(reply),
    };
    let mut data = store.read_progress()?;
    let mut entry = data
        .sections
        .get(section_id)
        .cloned()
        .unwrap_or_else(SectionProgress::not_started);

    if let Some(status) = updates.status {
        entry.status = status;
    }
    if let Some(progress) = updates.progress {
        entry.progress = clamp_percent(progress);
    }
    if let Some(start_date) = updates.start_date {
        entry.start_date = Some(start_date);
    }
    if let Some(completed_date) = updates.completed_date {
        entry.completed_date = Some(completed_date);
    }
    entry.last_updated = now_iso();

    data.sections.insert(section_id.to_string(), entry.clone());
    data.last_updated = now_iso();
    store.write_progress(&data)?;
    Ok(ok(entry))
}

/// The PATCH transition rules, pulled out so they can be tested as a pure
/// function of (existing entry, patch).
fn apply_patch(existing: &SectionProgress, patch: &ProgressPatch) -> SectionProgress {
    let mut updated = existing.clone();
    updated.last_updated = now_iso();

    if let Some(status) = patch.status {
        updated.status = status;
        match status {
            SectionStatus::InProgress => {
                // Idempotent start: the first start date survives re-patching
                if existing.start_date.is_none() {
                    updated.start_date = Some(now_iso());
                }
            }
            SectionStatus::Completed => {
                updated.completed_date = Some(now_iso());
                updated.progress = 100;
            }
            SectionStatus::NotStarted => {
                updated.start_date = None;
                updated.completed_date = None;
                updated.progress = 0;
            }
        }
    }

    if let Some(progress) = patch.progress {
        updated.progress = clamp_percent(progress);

        if updated.progress == 100 && updated.status != SectionStatus::Completed {
            updated.status = SectionStatus::Completed;
            updated.completed_date = Some(now_iso());
        } else if updated.progress > 0
            && updated.progress < 100
            && updated.status == SectionStatus::NotStarted
        {
            updated.status = SectionStatus::InProgress;
            updated.start_date = Some(now_iso());
        }
    }

    updated
}

// PATCH /api/progress/{sectionId}
pub fn patch_section(store: &Store, section_id: &str, body: &[u8]) -> ApiResult {
    let patch: ProgressPatch = match parse_body(body) {
        Ok(patch) => patch,
        Err(reply) => return Ok(reply),
    };
    let mut data = store.read_progress()?;
    let existing = data
        .sections
        .get(section_id)
        .cloned()
        .unwrap_or_else(SectionProgress::not_started);

    let updated = apply_patch(&existing, &patch);
    data.sections.insert(section_id.to_string(), updated.clone());
    data.last_updated = now_iso();
    store.write_progress(&data)?;
    Ok(ok(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("data"));
        (dir, store)
    }

    fn patch(status: Option<SectionStatus>, progress: Option<i64>) -> ProgressPatch {
        ProgressPatch { status, progress }
    }

    #[test]
    fn test_completed_forces_full_progress() {
        let existing = SectionProgress::not_started();
        let updated = apply_patch(&existing, &patch(Some(SectionStatus::Completed), None));
        assert_eq!(updated.status, SectionStatus::Completed);
        assert_eq!(updated.progress, 100);
        assert!(updated.completed_date.is_some());
    }

    #[test]
    fn test_not_started_clears_everything() {
        let mut existing = SectionProgress::not_started();
        existing.status = SectionStatus::Completed;
        existing.progress = 100;
        existing.start_date = Some(now_iso());
        existing.completed_date = Some(now_iso());

        let updated = apply_patch(&existing, &patch(Some(SectionStatus::NotStarted), None));
        assert_eq!(updated.status, SectionStatus::NotStarted);
        assert_eq!(updated.progress, 0);
        assert!(updated.start_date.is_none());
        assert!(updated.completed_date.is_none());
    }

    #[test]
    fn test_in_progress_start_is_idempotent() {
        let existing = SectionProgress::not_started();
        let first = apply_patch(&existing, &patch(Some(SectionStatus::InProgress), None));
        let started = first.start_date.clone();
        assert!(started.is_some());

        let second = apply_patch(&first, &patch(Some(SectionStatus::InProgress), None));
        assert_eq!(second.start_date, started);
    }

    #[test]
    fn test_full_progress_auto_completes() {
        let existing = SectionProgress::not_started();
        let updated = apply_patch(&existing, &patch(None, Some(100)));
        assert_eq!(updated.status, SectionStatus::Completed);
        assert!(updated.completed_date.is_some());
    }

    #[test]
    fn test_recompletion_keeps_original_date() {
        let mut existing = SectionProgress::not_started();
        existing.status = SectionStatus::Completed;
        existing.progress = 100;
        existing.completed_date = Some("2026-01-01T00:00:00.000Z".to_string());

        let updated = apply_patch(&existing, &patch(None, Some(100)));
        assert_eq!(updated.status, SectionStatus::Completed);
        assert_eq!(
            updated.completed_date.as_deref(),
            Some("2026-01-01T00:00:00.000Z")
        );
    }

    #[test]
    fn test_partial_progress_auto_starts() {
        let existing = SectionProgress::not_started();
        let updated = apply_patch(&existing, &patch(None, Some(40)));
        assert_eq!(updated.status, SectionStatus::InProgress);
        assert!(updated.start_date.is_some());
    }

    #[test]
    fn test_progress_is_clamped() {
        let existing = SectionProgress::not_started();
        assert_eq!(apply_patch(&existing, &patch(None, Some(150))).progress, 100);

        let mut started = SectionProgress::not_started();
        started.status = SectionStatus::InProgress;
        started.progress = 30;
        assert_eq!(apply_patch(&started, &patch(None, Some(-10))).progress, 0);
    }

    #[test]
    fn test_absent_entry_reads_as_not_started() {
        let (_dir, store) = store();
        let reply = get_section(&store, "section-untouched").unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("\"status\":\"not-started\""));
        assert!(reply.body.contains("\"progress\":0"));
    }

    #[test]
    fn test_patch_persists_lazily_created_entry() {
        let (_dir, store) = store();
        let reply = patch_section(&store, "section-1", br#"{"status":"in-progress"}"#).unwrap();
        assert_eq!(reply.status, 200);

        let data = store.read_progress().unwrap();
        let entry = data.sections.get("section-1").unwrap();
        assert_eq!(entry.status, SectionStatus::InProgress);
    }

    #[test]
    fn test_init_section_stamps_dates_by_status() {
        let (_dir, store) = store();
        let reply = init_section(
            &store,
            br#"{"sectionId":"section-1","status":"in-progress","progress":10}"#,
        )
        .unwrap();
        assert_eq!(reply.status, 201);

        let data = store.read_progress().unwrap();
        let entry = data.sections.get("section-1").unwrap();
        assert!(entry.start_date.is_some());
        assert!(entry.completed_date.is_none());
    }

    proptest! {
        #[test]
        fn prop_patch_progress_always_in_range(value in -1000i64..1000) {
            let existing = SectionProgress::not_started();
            let updated = apply_patch(&existing, &patch(None, Some(value)));
            prop_assert!(updated.progress <= 100);
        }

        #[test]
        fn prop_full_progress_always_completes(value in 100i64..10_000) {
            let existing = SectionProgress::not_started();
            let updated = apply_patch(&existing, &patch(None, Some(value)));
            prop_assert_eq!(updated.status, SectionStatus::Completed);
            prop_assert!(updated.completed_date.is_some());
        }
    }
}

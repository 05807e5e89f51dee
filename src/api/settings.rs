//! Settings and streak endpoints
//!
//! A singleton document: user preferences plus the learning streak. Reading
//! an absent document answers defaults; POST records a study session and
//! advances or resets the streak based on calendar days.

use chrono::{Duration, Utc};
use serde::Deserialize;

use super::{ok, parse_body, ApiResult};
use crate::model::{new_id, now_iso, LearningStreak, StudySession, Theme};
use crate::store::Store;

/// Sessions kept on the streak; older ones age out.
const MAX_SESSIONS: usize = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsPut {
    #[serde(default)]
    settings: SettingsPatch,
    streak: Option<StreakPatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsPatch {
    github_token: Option<String>,
    theme: Option<Theme>,
    accent_color: Option<String>,
    show_streak: Option<bool>,
    enable_spaced_repetition: Option<bool>,
    daily_goal_minutes: Option<u32>,
    default_note_template: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreakPatch {
    current_streak: Option<u32>,
    longest_streak: Option<u32>,
    last_study_date: Option<String>,
    total_study_days: Option<u32>,
    study_sessions: Option<Vec<StudySession>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionCreate {
    section_id: Option<String>,
    topic_id: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    #[serde(default)]
    duration_minutes: u32,
    notes: Option<String>,
}

// GET /api/settings
pub fn get(store: &Store) -> ApiResult {
    let data = store.read_settings()?;
    Ok(ok(data))
}

// PUT /api/settings - merge settings, optionally merge streak
pub fn put(store: &Store, body: &[u8]) -> ApiResult {
    let updates: SettingsPut = match parse_body(body) {
        Ok(updates) => updates,
        Err(reply) => return Ok(reply),
    };
    let mut data = store.read_settings()?;

    let patch = updates.settings;
    if let Some(github_token) = patch.github_token {
        data.settings.github_token = Some(github_token);
    }
    if let Some(theme) = patch.theme {
        data.settings.theme = theme;
    }
    if let Some(accent_color) = patch.accent_color {
        data.settings.accent_color = accent_color;
    }
    if let Some(show_streak) = patch.show_streak {
        data.settings.show_streak = show_streak;
    }
    if let Some(enable) = patch.enable_spaced_repetition {
        data.settings.enable_spaced_repetition = enable;
    }
    if let Some(minutes) = patch.daily_goal_minutes {
        data.settings.daily_goal_minutes = minutes;
    }
    if let Some(template) = patch.default_note_template {
        data.settings.default_note_template = template;
    }

    if let Some(streak) = updates.streak {
        if let Some(current) = streak.current_streak {
            data.streak.current_streak = current;
        }
        if let Some(longest) = streak.longest_streak {
            data.streak.longest_streak = longest;
        }
        if let Some(last) = streak.last_study_date {
            data.streak.last_study_date = last;
        }
        if let Some(total) = streak.total_study_days {
            data.streak.total_study_days = total;
        }
        if let Some(sessions) = streak.study_sessions {
            data.streak.study_sessions = sessions;
        }
    }

    data.last_updated = now_iso();
    store.write_settings(&data)?;
    Ok(ok(data))
}

/// Streak bookkeeping for one recorded session, pure over "today".
/// Same-day sessions leave the streak alone; a session on the day after the
/// last study extends it; anything else resets to 1.
fn advance_streak(streak: &mut LearningStreak, today: &str, yesterday: &str) {
    let last_day = streak
        .last_study_date
        .split('T')
        .next()
        .unwrap_or_default()
        .to_string();

    if last_day == today {
        // Second session today; nothing moves
    } else if last_day == yesterday {
        streak.current_streak += 1;
        if streak.current_streak > streak.longest_streak {
            streak.longest_streak = streak.current_streak;
        }
        streak.total_study_days += 1;
    } else {
        streak.current_streak = 1;
        if streak.longest_streak == 0 {
            streak.longest_streak = 1;
        }
        streak.total_study_days += 1;
    }
}

// POST /api/settings - record a study session
pub fn record_session(store: &Store, body: &[u8]) -> ApiResult {
    let payload: SessionCreate = match parse_body(body) {
        Ok(payload) => payload,
        Err(reply) => return Ok(reply),
    };
    let mut data = store.read_settings()?;

    let now = Utc::now();
    let today = now.format("%Y-%m-%d").to_string();
    let yesterday = (now - Duration::days(1)).format("%Y-%m-%d").to_string();

    advance_streak(&mut data.streak, &today, &yesterday);
    data.streak.last_study_date = now_iso();

    let session = StudySession {
        id: new_id("session"),
        section_id: payload.section_id,
        topic_id: payload.topic_id,
        start_time: payload.start_time.unwrap_or_else(now_iso),
        end_time: payload.end_time,
        duration_minutes: payload.duration_minutes,
        notes: payload.notes,
    };
    data.streak.study_sessions.push(session);
    let len = data.streak.study_sessions.len();
    if len > MAX_SESSIONS {
        data.streak.study_sessions.drain(..len - MAX_SESSIONS);
    }

    data.last_updated = now_iso();
    store.write_settings(&data)?;
    Ok(ok(data))
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

    #[test]
    fn test_get_returns_defaults_without_persisting() {
        let (_dir, store) = store();
        let reply = get(&store).unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("\"theme\":\"system\""));
        assert!(reply.body.contains("\"dailyGoalMinutes\":60"));
    }

    #[test]
    fn test_put_merges_partial_settings() {
        let (_dir, store) = store();
        put(&store, br#"{"settings":{"theme":"dark"}}"#).unwrap();

        let data = store.read_settings().unwrap();
        assert_eq!(data.settings.theme, Theme::Dark);
        // Untouched fields keep their defaults
        assert_eq!(data.settings.daily_goal_minutes, 60);
    }

    #[test]
    fn test_record_session_starts_streak() {
        let (_dir, store) = store();
        let reply = record_session(&store, br#"{"durationMinutes":45}"#).unwrap();
        assert_eq!(reply.status, 200);

        let data = store.read_settings().unwrap();
        assert_eq!(data.streak.current_streak, 1);
        assert_eq!(data.streak.total_study_days, 1);
        assert_eq!(data.streak.study_sessions.len(), 1);
        assert!(data.streak.study_sessions[0].id.starts_with("session-"));
    }

    #[test]
    fn test_same_day_session_does_not_double_count() {
        let (_dir, store) = store();
        record_session(&store, br#"{"durationMinutes":30}"#).unwrap();
        record_session(&store, br#"{"durationMinutes":30}"#).unwrap();

        let data = store.read_settings().unwrap();
        assert_eq!(data.streak.current_streak, 1);
        assert_eq!(data.streak.total_study_days, 1);
        assert_eq!(data.streak.study_sessions.len(), 2);
    }

    #[test]
    fn test_advance_streak_consecutive_day() {
        let mut streak = LearningStreak {
            current_streak: 3,
            longest_streak: 3,
            last_study_date: "2026-08-28T21:00:00.000Z".to_string(),
            total_study_days: 5,
            study_sessions: vec![],
        };
        advance_streak(&mut streak, "2026-08-29", "2026-08-28");
        assert_eq!(streak.current_streak, 4);
        assert_eq!(streak.longest_streak, 4);
        assert_eq!(streak.total_study_days, 6);
    }

    #[test]
    fn test_advance_streak_broken() {
        let mut streak = LearningStreak {
            current_streak: 7,
            longest_streak: 9,
            last_study_date: "2026-08-20T21:00:00.000Z".to_string(),
            total_study_days: 12,
            study_sessions: vec![],
        };
        advance_streak(&mut streak, "2026-08-29", "2026-08-28");
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 9);
        assert_eq!(streak.total_study_days, 13);
    }

    #[test]
    fn test_sessions_capped_at_hundred() {
        let (_dir, store) = store();
        let mut data = store.read_settings().unwrap();
        for i in 0..MAX_SESSIONS {
            data.streak.study_sessions.push(StudySession {
                id: format!("session-{}", i),
                section_id: None,
                topic_id: None,
                start_time: now_iso(),
                end_time: None,
                duration_minutes: 10,
                notes: None,
            });
        }
        store.write_settings(&data).unwrap();

        record_session(&store, br#"{"durationMinutes":5}"#).unwrap();
        let data = store.read_settings().unwrap();
        assert_eq!(data.streak.study_sessions.len(), MAX_SESSIONS);
        // Oldest session aged out
        assert_ne!(data.streak.study_sessions[0].id, "session-0");
    }
}

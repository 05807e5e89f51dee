//! Persisted document and entity types
//!
//! Every document is one flat JSON file (`roadmap.json`, `progress.json`,
//! `notes.json`, `resources.json`, `projects.json`, `settings.json`) holding
//! an entire collection plus a `lastUpdated` stamp. Field names on disk and
//! on the wire are camelCase; timestamps are RFC 3339 strings.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Current time as an RFC 3339 string with millisecond precision,
/// e.g. `2026-08-29T14:03:07.512Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generate a prefixed entity id: `<prefix>-<8 hex chars>`.
pub fn new_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &uuid[..8])
}

// =============================================================================
// Roadmap
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapData {
    pub phases: Vec<Phase>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    pub title: String,
    pub duration: String,
    pub description: String,
    pub sections: Vec<Section>,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    pub topics: Vec<TopicEntry>,
    /// Absent on documents written before tasks existed.
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_resource: Option<LearningResource>,
    pub why: String,
    pub how: String,
    pub order: u32,
}

/// The two shapes a stored topic can take. Legacy documents wrote topics as
/// bare strings; the migration helper rewrites those into [`Topic`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TopicEntry {
    Structured(Topic),
    Legacy(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub tasks: Vec<TopicTask>,
    pub notes: Vec<TopicNote>,
    pub resources: Vec<TopicResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicTask {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicNote {
    pub id: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicResource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TopicResourceKind,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicResourceKind {
    Code,
    Link,
    File,
    Github,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    File,
    Link,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningResource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LearningResourceKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningResourceKind {
    Youtube,
    Course,
    Book,
    Documentation,
    Tutorial,
    Other,
}

// =============================================================================
// Progress
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    /// Keyed by section id. Entries appear lazily on first write; a missing
    /// entry reads as not-started with zero progress.
    pub sections: BTreeMap<String, SectionProgress>,
    pub last_updated: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionProgress {
    pub status: SectionStatus,
    /// Percentage, clamped to 0..=100.
    pub progress: u32,
    pub start_date: Option<String>,
    pub completed_date: Option<String>,
    pub last_updated: String,
}

impl SectionProgress {
    /// The implicit value for a section nobody has touched yet.
    pub fn not_started() -> Self {
        Self {
            status: SectionStatus::NotStarted,
            progress: 0,
            start_date: None,
            completed_date: None,
            last_updated: now_iso(),
        }
    }
}

// =============================================================================
// Notes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesData {
    /// Newest first by insertion.
    pub notes: Vec<Note>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_notes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

// =============================================================================
// Resources
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesData {
    pub resources: Vec<Resource>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Book,
    Course,
    Tutorial,
    Documentation,
    Tool,
    Community,
    Certification,
    #[default]
    Other,
}

// =============================================================================
// Projects
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsData {
    pub projects: Vec<Project>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<String>,
    /// Cached snapshot of the linked repository, refreshed when stale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_data: Option<GitHubRepoData>,
    pub topics: Vec<ProjectTopic>,
    /// Roadmap section ids this project relates to.
    pub sections: Vec<String>,
    pub technologies: Vec<String>,
    pub notes: String,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    NotStarted,
    #[default]
    Planning,
    InProgress,
    Completed,
    OnHold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTopic {
    pub id: String,
    pub title: String,
    /// True when the user wrote it, false when linked from the roadmap.
    pub is_custom: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubRepoData {
    pub name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub language: Option<String>,
    /// Language name -> bytes of code.
    pub languages: BTreeMap<String, u64>,
    pub topics: Vec<String>,
    pub open_issues: u64,
    pub last_push: String,
    pub created_at: String,
    pub updated_at: String,
    pub recent_commits: Vec<GitHubCommit>,
    /// When this snapshot was taken; drives the refresh TTL.
    pub fetched_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubCommit {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: String,
    pub url: String,
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsData {
    pub settings: UserSettings,
    pub streak: LearningStreak,
    pub last_updated: String,
}

impl Default for SettingsData {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            streak: LearningStreak::default(),
            last_updated: now_iso(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    pub theme: Theme,
    pub accent_color: String,
    pub show_streak: bool,
    pub enable_spaced_repetition: bool,
    pub daily_goal_minutes: u32,
    pub default_note_template: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            github_token: None,
            theme: Theme::System,
            accent_color: "#8b5cf6".to_string(),
            show_streak: true,
            enable_spaced_repetition: true,
            daily_goal_minutes: 60,
            default_note_template: "blank".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStreak {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_study_date: String,
    pub total_study_days: u32,
    pub study_sessions: Vec<StudySession>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    pub start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// =============================================================================
// Derived views
// =============================================================================

/// Per-phase and overall completion numbers for the `stats` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_sections: usize,
    pub completed_sections: usize,
    pub in_progress_sections: usize,
    pub not_started_sections: usize,
    /// Mean of per-section percentages, 0..=100.
    pub overall_progress: u32,
    pub total_notes: usize,
    pub phase_progress: Vec<PhaseProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseProgress {
    pub phase_id: String,
    pub title: String,
    pub progress: u32,
    pub completed: usize,
    pub total: usize,
}

impl DashboardStats {
    pub fn compute(roadmap: &RoadmapData, progress: &ProgressData, notes: &NotesData) -> Self {
        let mut total = 0usize;
        let mut completed = 0usize;
        let mut in_progress = 0usize;
        let mut percent_sum = 0u64;
        let mut phase_progress = Vec::with_capacity(roadmap.phases.len());

        for phase in &roadmap.phases {
            let mut phase_completed = 0usize;
            let mut phase_percent_sum = 0u64;
            for section in &phase.sections {
                total += 1;
                let sp = progress.sections.get(&section.id);
                let status = sp.map(|p| p.status).unwrap_or(SectionStatus::NotStarted);
                let pct = sp.map(|p| p.progress.min(100)).unwrap_or(0);
                percent_sum += u64::from(pct);
                phase_percent_sum += u64::from(pct);
                match status {
                    SectionStatus::Completed => {
                        completed += 1;
                        phase_completed += 1;
                    }
                    SectionStatus::InProgress => in_progress += 1,
                    SectionStatus::NotStarted => {}
                }
            }
            let phase_total = phase.sections.len();
            phase_progress.push(PhaseProgress {
                phase_id: phase.id.clone(),
                title: phase.title.clone(),
                progress: if phase_total == 0 {
                    0
                } else {
                    (phase_percent_sum / phase_total as u64) as u32
                },
                completed: phase_completed,
                total: phase_total,
            });
        }

        Self {
            total_sections: total,
            completed_sections: completed,
            in_progress_sections: in_progress,
            not_started_sections: total - completed - in_progress,
            overall_progress: if total == 0 {
                0
            } else {
                (percent_sum / total as u64) as u32
            },
            total_notes: notes.notes.len(),
            phase_progress,
        }
    }
}

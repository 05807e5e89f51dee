//! Legacy document-shape normalization and entity builders
//!
//! Early roadmap documents stored section topics as bare strings and predate
//! the `tasks`/`attachments` fields. [`normalize_section`] rewrites those
//! shapes into the current structured form at the load boundary; it is
//! idempotent, so applying it to an already-current section is a no-op.

use crate::model::{
    new_id, now_iso, Attachment, AttachmentKind, Section, Task, TaskPriority, Topic, TopicEntry,
};

/// Convert any legacy topic entries into structured [`Topic`] values.
///
/// A legacy string at position `i` (0-based) becomes a topic with the
/// deterministic id `topic-<sectionId>-<i+1>`, so repeated migrations of the
/// same document agree on ids. Structured entries pass through untouched.
pub fn normalize_section(mut section: Section) -> Section {
    section.topics = section
        .topics
        .into_iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            TopicEntry::Structured(topic) => TopicEntry::Structured(topic),
            TopicEntry::Legacy(title) => TopicEntry::Structured(Topic {
                id: format!("topic-{}-{}", section.id, i + 1),
                title,
                completed: false,
                tasks: vec![],
                notes: vec![],
                resources: vec![],
                started_at: None,
                completed_at: None,
            }),
        })
        .collect();
    section
}

/// True when every topic entry is already in the structured form.
pub fn is_normalized(section: &Section) -> bool {
    section
        .topics
        .iter()
        .all(|t| matches!(t, TopicEntry::Structured(_)))
}

/// Build a fresh topic owned by a section.
pub fn new_topic(title: impl Into<String>, section_id: &str) -> Topic {
    Topic {
        id: format!("topic-{}-{}", section_id, &new_id("x")[2..]),
        title: title.into(),
        completed: false,
        tasks: vec![],
        notes: vec![],
        resources: vec![],
        started_at: None,
        completed_at: None,
    }
}

/// Build a fresh section task.
pub fn new_task(
    title: impl Into<String>,
    description: Option<String>,
    priority: TaskPriority,
    due_date: Option<String>,
) -> Task {
    Task {
        id: new_id("task"),
        title: title.into(),
        description,
        completed: false,
        due_date,
        priority,
        created_at: now_iso(),
        completed_at: None,
    }
}

/// Build a fresh attachment.
pub fn new_attachment(
    kind: AttachmentKind,
    title: impl Into<String>,
    url: impl Into<String>,
    description: Option<String>,
    file_type: Option<String>,
) -> Attachment {
    Attachment {
        id: new_id("attachment"),
        kind,
        title: title.into(),
        url: url.into(),
        description,
        file_type,
        created_at: now_iso(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_section() -> Section {
        Section {
            id: "section-sql".to_string(),
            title: "SQL Fundamentals".to_string(),
            topics: vec![
                TopicEntry::Legacy("SELECT basics".to_string()),
                TopicEntry::Legacy("JOIN strategies".to_string()),
            ],
            tasks: vec![],
            attachments: vec![],
            learning_resource: None,
            why: "Everything starts with queries".to_string(),
            how: "Work through exercises".to_string(),
            order: 1,
        }
    }

    #[test]
    fn test_legacy_topics_become_structured() {
        let section = normalize_section(legacy_section());
        assert!(is_normalized(&section));
        match &section.topics[0] {
            TopicEntry::Structured(t) => {
                assert_eq!(t.id, "topic-section-sql-1");
                assert_eq!(t.title, "SELECT basics");
                assert!(!t.completed);
                assert!(t.tasks.is_empty() && t.notes.is_empty() && t.resources.is_empty());
            }
            TopicEntry::Legacy(_) => panic!("topic not migrated"),
        }
        match &section.topics[1] {
            TopicEntry::Structured(t) => assert_eq!(t.id, "topic-section-sql-2"),
            TopicEntry::Legacy(_) => panic!("topic not migrated"),
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_section(legacy_section());
        let twice = normalize_section(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_structured_section_passes_through_unchanged() {
        let section = normalize_section(legacy_section());
        let again = normalize_section(section.clone());
        assert_eq!(section, again);
    }

    #[test]
    fn test_mixed_entries_migrate_by_position() {
        let mut section = legacy_section();
        section.topics = vec![
            TopicEntry::Structured(new_topic("already done", "section-sql")),
            TopicEntry::Legacy("still a string".to_string()),
        ];
        let migrated = normalize_section(section);
        match &migrated.topics[1] {
            TopicEntry::Structured(t) => assert_eq!(t.id, "topic-section-sql-2"),
            TopicEntry::Legacy(_) => panic!("topic not migrated"),
        }
    }

    #[test]
    fn test_new_task_defaults() {
        let task = new_task("Read chapter 3", None, TaskPriority::Medium, None);
        assert!(task.id.starts_with("task-"));
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_new_topic_id_carries_section() {
        let topic = new_topic("Streams", "section-kafka");
        assert!(topic.id.starts_with("topic-section-kafka-"));
    }
}

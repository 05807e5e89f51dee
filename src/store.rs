//! Flat-file JSON document store
//!
//! One JSON file per collection under the data directory, read and written
//! wholesale. Missing documents are bootstrapped from seed templates embedded
//! at compile time. Backups copy the full document set into a timestamped
//! subdirectory with retention pruning; binary uploads live under
//! `uploads/<sectionId>/`.
//!
//! There is no locking anywhere: this is a single-user local tool and
//! concurrent writers to the same document race with last-write-wins.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::{
    now_iso, NotesData, ProgressData, ProjectsData, ResourcesData, RoadmapData, SettingsData,
};

pub const ROADMAP_FILE: &str = "roadmap.json";
pub const PROGRESS_FILE: &str = "progress.json";
pub const NOTES_FILE: &str = "notes.json";
pub const RESOURCES_FILE: &str = "resources.json";
pub const PROJECTS_FILE: &str = "projects.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// Documents included in backups and seed bootstrap. Settings are excluded:
/// they are synthesized from defaults rather than a seed, and backed up only
/// once they exist on disk.
const SEEDED_DOCUMENTS: &[&str] = &[
    ROADMAP_FILE,
    PROGRESS_FILE,
    NOTES_FILE,
    RESOURCES_FILE,
    PROJECTS_FILE,
];

/// Seed templates bundled into the binary.
fn seed_for(filename: &str) -> Option<&'static str> {
    match filename {
        ROADMAP_FILE => Some(include_str!("seeds/roadmap.json")),
        PROGRESS_FILE => Some(include_str!("seeds/progress.json")),
        NOTES_FILE => Some(include_str!("seeds/notes.json")),
        RESOURCES_FILE => Some(include_str!("seeds/resources.json")),
        PROJECTS_FILE => Some(include_str!("seeds/projects.json")),
        _ => None,
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Document not found: {0}")]
    NotFound(String),
}

/// Handle to one data directory. Cheap to clone; holds no open files.
#[derive(Debug, Clone)]
pub struct Store {
    data_dir: PathBuf,
    backup_retain: usize,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backup_retain: 7,
        }
    }

    /// Number of timestamped backup directories kept after pruning.
    pub fn with_backup_retain(mut self, retain: usize) -> Self {
        self.backup_retain = retain;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    fn document_path(&self, filename: &str) -> PathBuf {
        self.data_dir.join(filename)
    }

    /// Create the data tree and copy any missing seed documents into place.
    pub fn initialize(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(self.backups_dir())?;
        fs::create_dir_all(self.uploads_dir())?;

        for filename in SEEDED_DOCUMENTS {
            let target = self.document_path(filename);
            if !target.exists() {
                if let Some(seed) = seed_for(filename) {
                    fs::write(&target, seed)?;
                }
            }
        }
        Ok(())
    }

    /// Read and parse a named document. A missing file is bootstrapped from
    /// its seed template (written to disk once, then parsed); a document with
    /// neither a file nor a seed is `NotFound`.
    pub fn read<T: DeserializeOwned>(&self, filename: &str) -> Result<T, StoreError> {
        let path = self.document_path(filename);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => match seed_for(filename) {
                Some(seed) => {
                    fs::create_dir_all(&self.data_dir)?;
                    fs::write(&path, seed)?;
                    seed.to_string()
                }
                None => return Err(StoreError::NotFound(filename.to_string())),
            },
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    /// Serialize and overwrite a named document wholesale. Writes go through
    /// a temp file and an atomic rename so a crash never leaves half a
    /// document behind.
    pub fn write<T: Serialize>(&self, filename: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.document_path(filename);
        let temp = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(value)?;
        let mut file = fs::File::create(&temp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(temp, path)?;
        Ok(())
    }

    // Typed accessors, one per document.

    pub fn read_roadmap(&self) -> Result<RoadmapData, StoreError> {
        self.read(ROADMAP_FILE)
    }

    pub fn write_roadmap(&self, data: &RoadmapData) -> Result<(), StoreError> {
        self.write(ROADMAP_FILE, data)
    }

    pub fn read_progress(&self) -> Result<ProgressData, StoreError> {
        self.read(PROGRESS_FILE)
    }

    pub fn write_progress(&self, data: &ProgressData) -> Result<(), StoreError> {
        self.write(PROGRESS_FILE, data)
    }

    pub fn read_notes(&self) -> Result<NotesData, StoreError> {
        self.read(NOTES_FILE)
    }

    pub fn write_notes(&self, data: &NotesData) -> Result<(), StoreError> {
        self.write(NOTES_FILE, data)
    }

    pub fn read_resources(&self) -> Result<ResourcesData, StoreError> {
        self.read(RESOURCES_FILE)
    }

    pub fn write_resources(&self, data: &ResourcesData) -> Result<(), StoreError> {
        self.write(RESOURCES_FILE, data)
    }

    pub fn read_projects(&self) -> Result<ProjectsData, StoreError> {
        self.read(PROJECTS_FILE)
    }

    pub fn write_projects(&self, data: &ProjectsData) -> Result<(), StoreError> {
        self.write(PROJECTS_FILE, data)
    }

    /// Settings have no seed file; an absent document reads as defaults.
    pub fn read_settings(&self) -> Result<SettingsData, StoreError> {
        match self.read(SETTINGS_FILE) {
            Ok(data) => Ok(data),
            Err(StoreError::NotFound(_)) => Ok(SettingsData::default()),
            Err(e) => Err(e),
        }
    }

    pub fn write_settings(&self, data: &SettingsData) -> Result<(), StoreError> {
        self.write(SETTINGS_FILE, data)
    }

    // =========================================================================
    // Backups
    // =========================================================================

    /// Copy the current document set into `backups/<timestamp>/`, then prune
    /// old backup directories beyond the retention count. Returns the new
    /// backup path.
    pub fn backup(&self) -> Result<PathBuf, StoreError> {
        let backups_dir = self.backups_dir();
        fs::create_dir_all(&backups_dir)?;

        // Colons and dots make the stamp unfriendly to filesystems; the
        // replaced form still sorts chronologically.
        let timestamp = now_iso().replace([':', '.'], "-");
        let backup_path = backups_dir.join(timestamp);
        fs::create_dir_all(&backup_path)?;

        for filename in SEEDED_DOCUMENTS.iter().chain([&SETTINGS_FILE]) {
            let source = self.document_path(filename);
            if source.exists() {
                fs::copy(&source, backup_path.join(filename))?;
            }
        }

        self.prune_backups();
        Ok(backup_path)
    }

    /// Drop the oldest backup directories beyond the retention count.
    /// Pruning failures are swallowed; a backup that copied cleanly should
    /// not report an error over housekeeping.
    fn prune_backups(&self) {
        let Ok(entries) = fs::read_dir(self.backups_dir()) else {
            return;
        };
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.path())
            .collect();
        // Directory names are timestamp-sortable: newest last.
        dirs.sort();
        let excess = dirs.len().saturating_sub(self.backup_retain);
        for dir in dirs.into_iter().take(excess) {
            let _ = fs::remove_dir_all(dir);
        }
    }

    // =========================================================================
    // Uploads
    // =========================================================================

    /// Create (if needed) and return the upload directory for a section.
    pub fn ensure_upload_dir(&self, section_id: &str) -> Result<PathBuf, StoreError> {
        let dir = self.uploads_dir().join(section_id);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Store an uploaded file and return its public URL path.
    pub fn save_upload(
        &self,
        section_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, StoreError> {
        let dir = self.ensure_upload_dir(section_id)?;
        fs::write(dir.join(filename), bytes)?;
        Ok(format!("/uploads/{}/{}", section_id, filename))
    }

    /// Delete an uploaded file; removes the section directory once empty.
    /// Deleting a file that is already gone is not an error.
    pub fn delete_upload(&self, section_id: &str, filename: &str) -> Result<(), StoreError> {
        let dir = self.uploads_dir().join(section_id);
        match fs::remove_file(dir.join(filename)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        if let Ok(mut entries) = fs::read_dir(&dir) {
            if entries.next().is_none() {
                let _ = fs::remove_dir(&dir);
            }
        }
        Ok(())
    }

    /// URL paths of every stored upload for a section, sorted by filename.
    pub fn list_uploads(&self, section_id: &str) -> Vec<String> {
        let dir = self.uploads_dir().join(section_id);
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut urls: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .map(|name| format!("/uploads/{}/{}", section_id, name))
            .collect();
        urls.sort();
        urls
    }

    /// On-disk path of a stored upload, for serving the bytes back.
    pub fn upload_path(&self, section_id: &str, filename: &str) -> PathBuf {
        self.uploads_dir().join(section_id).join(filename)
    }
}

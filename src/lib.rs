//! Trailmap - Personal learning roadmap tracker
//!
//! Phases, sections, notes, resources and projects persisted as flat JSON
//! documents on local disk, served over a small localhost HTTP API.
//!
//! # Overview
//!
//! Every collection is one JSON file read and written wholesale: there is no
//! database, no migrations beyond a lazy topic-shape upgrade, and no locking.
//! The server is a single-threaded loop; the CLI works against the same data
//! directory directly.
//!
//! | Document | Contents |
//! |----------|----------|
//! | `roadmap.json` | Phases and their sections |
//! | `progress.json` | Per-section status and percentage |
//! | `notes.json` | Free-form notes, newest first |
//! | `resources.json` | Links, books, courses |
//! | `projects.json` | Practice projects with GitHub snapshots |
//! | `settings.json` | Preferences and the learning streak |
//!
//! # Quick Start
//!
//! ```no_run
//! use trailmap::Store;
//!
//! let store = Store::new("data");
//! store.initialize().unwrap();
//!
//! let roadmap = store.read_roadmap().unwrap();
//! println!("{} phases", roadmap.phases.len());
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod github;
pub mod migrate;
pub mod model;
pub mod serve;
pub mod store;

pub use client::{ApiClient, ClientError};
pub use config::Config;
pub use model::{
    DashboardStats, Note, NotesData, Phase, ProgressData, Project, ProjectsData, Resource,
    ResourcesData, RoadmapData, Section, SectionProgress, SectionStatus, SettingsData,
};
pub use store::{Store, StoreError};

#![forbid(unsafe_code)]

//! Core domain model and business logic for the Liftlog workout tracker.
//!
//! This crate provides:
//! - Domain types (exercises, programs, sessions, sets)
//! - Exercise catalog and program store
//! - Workout rotation and the session lifecycle
//! - History aggregation
//! - Persistence (JSON store, event journal, export/import, CSV)
//! - Presentation state for front ends

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod persist;
pub mod events;
pub mod journal;
pub mod programs;
pub mod scheduler;
pub mod session;
pub mod history;
pub mod transfer;
pub mod csv_export;
pub mod context;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use types::*;
pub use catalog::{parse_muscle_group, predefined_exercises};
pub use config::Config;
pub use store::{Backend, MemoryBackend, OpenOptions, Store, StoreDocument};
pub use persist::JsonFileBackend;
pub use events::{StoreEvent, SubscriptionId};
pub use journal::{read_journal, EventSink, JournalEntry, JsonlJournal};
pub use programs::ProgramDraft;
pub use session::{FinishOutcome, SessionPhase, SetInput, StartOutcome};
pub use history::{format_performance, LastWorkout, PerformanceSummary, SessionHistory};
pub use transfer::{ExportDocument, ImportSummary};
pub use context::{AppState, ProgramBuilder, Tab};

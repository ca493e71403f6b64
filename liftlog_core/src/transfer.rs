//! Full-data export and import.
//!
//! The export document is `{version, exportDate, data: {exercises, programs,
//! workoutSessions, sets}}`. Import replaces all four collections in a single
//! write.

use crate::events::StoreEvent;
use crate::store::{Store, MAX_RECORD_ID};
use crate::types::*;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Export format version written by this crate
pub const EXPORT_VERSION: u32 = 1;

/// A complete export of the store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    pub export_date: DateTime<Utc>,
    pub data: Dataset,
}

/// Counts of what an import brought in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportSummary {
    pub exercises: usize,
    pub programs: usize,
    pub workout_sessions: usize,
    pub sets: usize,
}

impl ImportSummary {
    fn of(data: &Dataset) -> Self {
        Self {
            exercises: data.exercises.len(),
            programs: data.programs.len(),
            workout_sessions: data.workout_sessions.len(),
            sets: data.sets.len(),
        }
    }
}

/// Parse and validate an export document
///
/// Requires `version` and `data`; collections missing from `data` are empty.
pub fn parse_export(json: &str) -> Result<Dataset> {
    let root: Value = serde_json::from_str(json)
        .map_err(|e| Error::format(format!("Not a JSON document: {}", e)))?;
    let root = root
        .as_object()
        .ok_or_else(|| Error::format("Export must be a JSON object"))?;

    let version = match root.get("version") {
        None | Some(Value::Null) => return Err(Error::format("Missing 'version'")),
        Some(v) => v,
    };
    match version.as_u64() {
        None | Some(0) => {
            return Err(Error::format(format!(
                "'version' must be a positive integer, got {}",
                version
            )))
        }
        Some(v) if v != EXPORT_VERSION as u64 => {
            tracing::warn!("Importing export with unrecognised version {}", v);
        }
        Some(_) => {}
    }

    let data = match root.get("data") {
        Some(Value::Object(data)) => data,
        Some(Value::Null) | None => return Err(Error::format("Missing 'data'")),
        Some(_) => return Err(Error::format("'data' must be an object")),
    };

    let dataset = Dataset {
        exercises: collection(data.get("exercises"), "exercises")?,
        programs: collection(data.get("programs"), "programs")?,
        workout_sessions: collection(data.get("workoutSessions"), "workoutSessions")?,
        sets: collection(data.get("sets"), "sets")?,
    };
    check_consistency(&dataset)?;
    Ok(dataset)
}

fn collection<T: DeserializeOwned>(value: Option<&Value>, name: &str) -> Result<Vec<T>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| Error::format(format!("Invalid '{}' collection: {}", name, e))),
    }
}

/// Ids must be unique and within the range new ids are drawn from
fn check_ids<T, F>(items: &[T], name: &str, key: F) -> Result<()>
where
    F: Fn(&T) -> u64,
{
    let mut seen = HashSet::new();
    for item in items {
        let id = key(item);
        if id > MAX_RECORD_ID {
            return Err(Error::format(format!(
                "Id {} in '{}' exceeds the maximum of {}",
                id, name, MAX_RECORD_ID
            )));
        }
        if !seen.insert(id) {
            return Err(Error::format(format!("Duplicate id {} in '{}'", id, name)));
        }
    }
    Ok(())
}

fn check_consistency(data: &Dataset) -> Result<()> {
    check_ids(&data.exercises, "exercises", |e| e.id.0)?;
    check_ids(&data.programs, "programs", |p| p.id.0)?;
    check_ids(&data.workout_sessions, "workoutSessions", |s| s.id.0)?;
    check_ids(&data.sets, "sets", |s| s.id.0)?;

    let active = data.programs.iter().filter(|p| p.is_active).count();
    if active > 1 {
        return Err(Error::format(format!(
            "{} programs are marked active; at most one may be",
            active
        )));
    }
    let open = data
        .workout_sessions
        .iter()
        .filter(|s| !s.is_complete)
        .count();
    if open > 1 {
        return Err(Error::format(format!(
            "{} sessions are in progress; at most one may be",
            open
        )));
    }
    Ok(())
}

impl Store {
    /// Snapshot everything as an export document
    pub fn export_all(&self) -> ExportDocument {
        ExportDocument {
            version: EXPORT_VERSION,
            export_date: Utc::now(),
            data: self.data().clone(),
        }
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_all())?)
    }

    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.export_json()?)?;
        tracing::info!("Exported data to {:?}", path);
        Ok(())
    }

    /// Replace all data with the contents of an export document
    pub fn import_json(&mut self, json: &str) -> Result<ImportSummary> {
        let dataset = parse_export(json)?;
        let summary = ImportSummary::of(&dataset);

        self.transact(|doc, events| {
            // Counters only move forward, so ids issued before the import stay retired
            doc.next_ids.reconcile(&dataset);
            doc.data = dataset;
            events.push(StoreEvent::DataImported {
                exercises: summary.exercises,
                programs: summary.programs,
                workout_sessions: summary.workout_sessions,
                sets: summary.sets,
            });
            Ok(())
        })?;

        tracing::info!(
            "Imported {} exercises, {} programs, {} sessions, {} sets",
            summary.exercises,
            summary.programs,
            summary.workout_sessions,
            summary.sets
        );
        Ok(summary)
    }

    pub fn import_from_file(&mut self, path: &Path) -> Result<ImportSummary> {
        let contents = std::fs::read_to_string(path)?;
        self.import_json(&contents)
    }
}

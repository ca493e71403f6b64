//! JSON file backend with file locking.
//!
//! The whole store document lives in one JSON file. Reads take a shared lock;
//! writes go through a locked temp file in the same directory which is
//! fsynced and renamed over the original.

use crate::store::{Backend, StoreDocument, SCHEMA_VERSION};
use crate::{Error, Result};
use chrono::Utc;
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Store backend persisting to a single JSON file
#[derive(Clone, Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_locked(&self) -> Result<String> {
        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;
        Ok(contents)
    }

    /// Move an unreadable store out of the way so it is never overwritten
    fn quarantine(&self) -> Result<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store.json".into());
        let aside = self.path.with_file_name(format!(
            "{}.corrupt-{}",
            file_name,
            Utc::now().format("%Y%m%dT%H%M%S%.3f")
        ));
        std::fs::rename(&self.path, &aside)?;
        Ok(aside)
    }
}

impl Backend for JsonFileBackend {
    /// Load the store document
    ///
    /// Returns `None` if the file doesn't exist. If the file cannot be parsed
    /// it is renamed aside with a warning and `None` is returned.
    fn load(&mut self) -> Result<Option<StoreDocument>> {
        if !self.path.exists() {
            tracing::info!("No store file at {:?}", self.path);
            return Ok(None);
        }

        let contents = self.read_locked()?;
        match serde_json::from_str::<StoreDocument>(&contents) {
            Ok(doc) => {
                if doc.schema_version > SCHEMA_VERSION {
                    return Err(Error::State(format!(
                        "Store file {:?} has schema version {}, newer than supported {}",
                        self.path, doc.schema_version, SCHEMA_VERSION
                    )));
                }
                tracing::debug!(
                    "Loaded store from {:?} ({} exercises, {} programs, {} sessions, {} sets)",
                    self.path,
                    doc.data.exercises.len(),
                    doc.data.programs.len(),
                    doc.data.workout_sessions.len(),
                    doc.data.sets.len()
                );
                Ok(Some(doc))
            }
            Err(e) => {
                let aside = self.quarantine()?;
                tracing::warn!(
                    "Failed to parse store file {:?}: {}. Moved it to {:?} and starting empty.",
                    self.path,
                    e,
                    aside
                );
                Ok(None)
            }
        }
    }

    /// Atomically replace the store file
    fn save(&mut self, doc: &StoreDocument) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        // Temp file in the same directory so the rename stays on one filesystem
        let temp = NamedTempFile::new_in(&parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, doc)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved store to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::tests::ppl;
    use crate::store::Store;
    use crate::{ExerciseId, MuscleGroup};

    #[test]
    fn test_missing_file_loads_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut backend = JsonFileBackend::new(temp_dir.path().join("liftlog.json"));
        assert!(backend.load().unwrap().is_none());
    }

    #[test]
    fn test_store_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("liftlog.json");

        {
            let mut store = Store::open(JsonFileBackend::new(&path)).unwrap();
            store
                .add_custom_exercise("Nordic Curl", MuscleGroup::Legs)
                .unwrap();
            let program = store.create_program(ppl()).unwrap();
            store.activate(program.id).unwrap();
        }

        let store = Store::open(JsonFileBackend::new(&path)).unwrap();
        assert_eq!(store.list_exercises().len(), 21);
        assert_eq!(store.exercise(ExerciseId(21)).unwrap().name, "Nordic Curl");
        assert_eq!(store.active_program().unwrap().name, "PPL");
        assert_eq!(store.document().next_ids.program, 1);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("liftlog.json");
        Store::open(JsonFileBackend::new(&path)).unwrap();

        assert!(path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "liftlog.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only liftlog.json, found extras: {:?}",
            extras
        );
    }

    #[test]
    fn test_corrupt_file_is_set_aside() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("liftlog.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let store = Store::open(JsonFileBackend::new(&path)).unwrap();
        assert_eq!(store.list_exercises().len(), 20);

        let aside: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
            .collect();
        assert_eq!(aside.len(), 1);
        let preserved = std::fs::read_to_string(aside[0].path()).unwrap();
        assert_eq!(preserved, "{ invalid json }");
    }

    #[test]
    fn test_newer_schema_refused() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("liftlog.json");
        std::fs::write(&path, r#"{"schema_version": 99}"#).unwrap();

        let mut backend = JsonFileBackend::new(&path);
        assert!(matches!(backend.load(), Err(Error::State(_))));
        assert!(path.exists());
    }
}

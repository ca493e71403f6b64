//! Flat CSV export of every logged set.
//!
//! One row per set, joined with its session, program and exercise so the
//! file can be opened in a spreadsheet without the JSON export.

use crate::store::Store;
use crate::types::*;
use crate::Result;
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    set_id: u64,
    session_id: u64,
    session_date: String,
    session_complete: bool,
    program: String,
    workout_number: u32,
    exercise: String,
    muscle_group: String,
    weight: f64,
    reps: u32,
    logged_at: String,
}

impl CsvRow {
    fn new(data: &Dataset, set: &WorkoutSet) -> Self {
        let session = data.session(set.workout_session_id);
        let program = session.and_then(|s| data.program(s.program_id));
        let exercise = data.exercise(set.exercise_id);

        CsvRow {
            set_id: set.id.0,
            session_id: set.workout_session_id.0,
            session_date: session.map(|s| s.date.to_rfc3339()).unwrap_or_default(),
            session_complete: session.map(|s| s.is_complete).unwrap_or(false),
            program: program.map(|p| p.name.clone()).unwrap_or_default(),
            workout_number: session.map(|s| s.workout_number).unwrap_or(0),
            exercise: exercise
                .map(|e| e.name.clone())
                .unwrap_or_else(|| format!("#{}", set.exercise_id)),
            muscle_group: exercise
                .map(|e| e.muscle_group.key().to_string())
                .unwrap_or_default(),
            weight: set.weight,
            reps: set.reps,
            logged_at: set.timestamp.to_rfc3339(),
        }
    }
}

impl Store {
    /// Write all sets to a CSV file, replacing it, and return the row count
    ///
    /// Sets are ordered by session date, then logging order.
    pub fn export_sets_csv(&self, csv_path: &Path) -> Result<usize> {
        let data = self.data();

        let mut sets: Vec<&WorkoutSet> = data.sets.iter().collect();
        sets.sort_by_key(|s| {
            (
                data.session(s.workout_session_id).map(|session| session.date),
                s.timestamp,
            )
        });

        if let Some(parent) = csv_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(csv_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(file);

        for set in &sets {
            writer.serialize(CsvRow::new(data, set))?;
        }

        // Flush and sync to disk
        writer.flush()?;
        let file = writer
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        file.sync_all()?;

        tracing::info!("Wrote {} sets to {:?}", sets.len(), csv_path);
        Ok(sets.len())
    }
}

//! Caller-owned presentation state.
//!
//! Front ends keep an [`AppState`] snapshot and rebuild it from the store
//! after each change (typically from a store subscription). The program form
//! is modelled by [`ProgramBuilder`].

use crate::programs::{ProgramDraft, MAX_WORKOUT_NUMBER};
use crate::store::Store;
use crate::types::*;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Default number of target sets for a newly added exercise
pub const DEFAULT_TARGET_SETS: u32 = 3;

/// Top-level screens
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Workout,
    Programs,
    Exercises,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Workout, Tab::Programs, Tab::Exercises, Tab::Settings];

    pub fn key(&self) -> &'static str {
        match self {
            Tab::Workout => "workout",
            Tab::Programs => "programs",
            Tab::Exercises => "exercises",
            Tab::Settings => "settings",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An open exercise-history screen and where to go back to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryView {
    pub exercise_id: ExerciseId,
    pub return_tab: Tab,
}

/// Snapshot of what the screens render
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub current_tab: Tab,
    pub exercises: Vec<Exercise>,
    pub programs: Vec<Program>,
    pub active_program: Option<Program>,
    pub active_session: Option<WorkoutSession>,
    pub history_view: Option<HistoryView>,
}

impl AppState {
    /// Fresh state on the workout tab
    pub fn load(store: &Store) -> Self {
        let mut state = Self::default();
        state.refresh(store);
        state
    }

    /// Re-read every collection from the store, keeping navigation
    pub fn refresh(&mut self, store: &Store) {
        let data = store.data();
        self.exercises = data.exercises.clone();
        self.programs = data.programs.clone();
        self.active_program = data.active_program().cloned();
        self.active_session = data.active_session().cloned();

        // The exercise being viewed may have been deleted meanwhile
        if let Some(view) = self.history_view {
            if data.exercise(view.exercise_id).is_none() {
                self.exit_exercise_history();
            }
        }
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.history_view = None;
    }

    pub fn view_exercise_history(&mut self, exercise_id: ExerciseId, return_tab: Tab) -> Result<()> {
        if !self.exercises.iter().any(|e| e.id == exercise_id) {
            return Err(Error::not_found(format!("Exercise {} not found", exercise_id)));
        }
        self.history_view = Some(HistoryView {
            exercise_id,
            return_tab,
        });
        Ok(())
    }

    /// Close the history screen and return to the tab it was opened from
    pub fn exit_exercise_history(&mut self) {
        if let Some(view) = self.history_view.take() {
            self.current_tab = view.return_tab;
        }
    }
}

/// In-progress program form
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramBuilder {
    name: String,
    days: BTreeMap<u32, Vec<WorkoutExercise>>,
}

impl ProgramBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            days: BTreeMap::new(),
        }
    }

    /// Seed the form from an existing program for editing
    pub fn from_program(program: &Program) -> Self {
        let days = program
            .workouts
            .iter()
            .map(|w| (w.workout_number, w.exercises.clone()))
            .collect();
        Self {
            name: program.name.clone(),
            days,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Exercises currently on a day, in order
    pub fn exercises(&self, day: u32) -> &[WorkoutExercise] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add_exercise(&mut self, day: u32, exercise_id: ExerciseId, target_sets: u32) -> Result<()> {
        if !(1..=MAX_WORKOUT_NUMBER).contains(&day) {
            return Err(Error::validation(format!(
                "Workout number {} is out of range 1..={}",
                day, MAX_WORKOUT_NUMBER
            )));
        }
        if target_sets < 1 {
            return Err(Error::validation("Target sets must be at least 1"));
        }
        self.days.entry(day).or_default().push(WorkoutExercise {
            exercise_id,
            target_sets,
        });
        Ok(())
    }

    pub fn remove_exercise(&mut self, day: u32, index: usize) -> Option<WorkoutExercise> {
        let slots = self.days.get_mut(&day)?;
        if index >= slots.len() {
            return None;
        }
        Some(slots.remove(index))
    }

    /// Swap an exercise with the one above it; false at the top
    pub fn move_up(&mut self, day: u32, index: usize) -> bool {
        match self.days.get_mut(&day) {
            Some(slots) if index > 0 && index < slots.len() => {
                slots.swap(index - 1, index);
                true
            }
            _ => false,
        }
    }

    /// Swap an exercise with the one below it; false at the bottom
    pub fn move_down(&mut self, day: u32, index: usize) -> bool {
        match self.days.get_mut(&day) {
            Some(slots) if index + 1 < slots.len() => {
                slots.swap(index, index + 1);
                true
            }
            _ => false,
        }
    }

    /// Produce a draft; days with no exercises are dropped
    pub fn build(&self) -> ProgramDraft {
        let workouts = self
            .days
            .iter()
            .filter(|(_, slots)| !slots.is_empty())
            .map(|(&workout_number, slots)| WorkoutDef {
                workout_number,
                exercises: slots.clone(),
            })
            .collect();
        ProgramDraft::new(self.name.trim(), workouts)
    }
}

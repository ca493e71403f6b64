//! Program store: named programs made of numbered workout days.

use crate::events::StoreEvent;
use crate::store::Store;
use crate::types::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Highest workout-day number a program may define
pub const MAX_WORKOUT_NUMBER: u32 = 7;

/// A full program document as submitted by a form
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDraft {
    pub name: String,
    #[serde(default)]
    pub workouts: Vec<WorkoutDef>,
}

impl ProgramDraft {
    pub fn new(name: impl Into<String>, workouts: Vec<WorkoutDef>) -> Self {
        Self {
            name: name.into(),
            workouts,
        }
    }

    /// Check the draft against the dataset it will be stored in
    pub fn validate(&self, data: &Dataset) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Program name is required"));
        }

        let mut seen = HashSet::new();
        for workout in &self.workouts {
            let n = workout.workout_number;
            if !(1..=MAX_WORKOUT_NUMBER).contains(&n) {
                return Err(Error::validation(format!(
                    "Workout number {} is out of range 1..={}",
                    n, MAX_WORKOUT_NUMBER
                )));
            }
            if !seen.insert(n) {
                return Err(Error::validation(format!(
                    "Workout {} is defined more than once",
                    n
                )));
            }
            if workout.exercises.is_empty() {
                return Err(Error::validation(format!("Workout {} has no exercises", n)));
            }
            for slot in &workout.exercises {
                if slot.target_sets < 1 {
                    return Err(Error::validation(format!(
                        "Workout {}: target sets must be at least 1",
                        n
                    )));
                }
                if data.exercise(slot.exercise_id).is_none() {
                    return Err(Error::validation(format!(
                        "Workout {}: unknown exercise {}",
                        n, slot.exercise_id
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Store {
    pub fn list_programs(&self) -> &[Program] {
        &self.data().programs
    }

    pub fn program(&self, id: ProgramId) -> Option<&Program> {
        self.data().program(id)
    }

    /// The active program; `None` when no program is active
    pub fn active_program(&self) -> Option<&Program> {
        self.data().active_program()
    }

    pub fn create_program(&mut self, draft: ProgramDraft) -> Result<Program> {
        draft.validate(self.data())?;

        let program = self.transact(|doc, events| {
            let program = Program {
                id: doc.next_ids.next_program()?,
                name: draft.name.trim().to_string(),
                workouts: draft.workouts,
                is_active: false,
                current_workout: 1,
            };
            doc.data.programs.push(program.clone());
            events.push(StoreEvent::ProgramCreated {
                program_id: program.id,
            });
            Ok(program)
        })?;

        tracing::info!(
            "Created program {} '{}' with {} workouts",
            program.id,
            program.name,
            program.workouts.len()
        );
        Ok(program)
    }

    /// Replace a program's name and workouts
    ///
    /// Activation state is kept. The rotation pointer is kept unless it now
    /// exceeds the number of workouts, in which case it restarts at 1.
    pub fn update_program(&mut self, id: ProgramId, draft: ProgramDraft) -> Result<Program> {
        draft.validate(self.data())?;

        let program = self.transact(|doc, events| {
            let program = doc
                .data
                .program_mut(id)
                .ok_or_else(|| Error::not_found(format!("program {}", id)))?;

            program.name = draft.name.trim().to_string();
            program.workouts = draft.workouts;
            if program.current_workout as usize > program.workouts.len() {
                tracing::debug!(
                    "Program {} shrank to {} workouts, restarting rotation",
                    id,
                    program.workouts.len()
                );
                program.current_workout = 1;
            }

            let updated = program.clone();
            events.push(StoreEvent::ProgramUpdated { program_id: id });
            Ok(updated)
        })?;

        tracing::info!("Updated program {} '{}'", program.id, program.name);
        Ok(program)
    }

    /// Delete a program; its session history is kept and becomes orphaned
    pub fn delete_program(&mut self, id: ProgramId) -> Result<()> {
        let orphaned = self.transact(|doc, events| {
            if doc.data.program(id).is_none() {
                return Err(Error::not_found(format!("program {}", id)));
            }
            doc.data.programs.retain(|p| p.id != id);
            events.push(StoreEvent::ProgramDeleted { program_id: id });
            Ok(doc
                .data
                .workout_sessions
                .iter()
                .filter(|s| s.program_id == id)
                .count())
        })?;

        if orphaned > 0 {
            tracing::warn!(
                "Deleted program {}; {} sessions keep their history without a program",
                id,
                orphaned
            );
        } else {
            tracing::info!("Deleted program {}", id);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn day(number: u32, slots: &[(u64, u32)]) -> WorkoutDef {
        WorkoutDef {
            workout_number: number,
            exercises: slots
                .iter()
                .map(|&(exercise, sets)| WorkoutExercise {
                    exercise_id: ExerciseId(exercise),
                    target_sets: sets,
                })
                .collect(),
        }
    }

    /// Push/pull/legs with one exercise per day
    pub(crate) fn ppl() -> ProgramDraft {
        ProgramDraft::new(
            "PPL",
            vec![day(1, &[(6, 3)]), day(2, &[(10, 3)]), day(3, &[(1, 5)])],
        )
    }

    #[test]
    fn test_create_program() {
        let mut store = Store::in_memory().unwrap();
        let program = store.create_program(ppl()).unwrap();

        assert_eq!(program.id, ProgramId(1));
        assert!(!program.is_active);
        assert_eq!(program.current_workout, 1);
        assert_eq!(store.list_programs().len(), 1);
        assert_eq!(store.program(program.id).unwrap().workouts.len(), 3);
    }

    #[test]
    fn test_name_required() {
        let mut store = Store::in_memory().unwrap();
        let err = store
            .create_program(ProgramDraft::new("  ", vec![day(1, &[(1, 3)])]))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.list_programs().is_empty());
    }

    #[test]
    fn test_invalid_workout_numbers() {
        let mut store = Store::in_memory().unwrap();

        let zero = ProgramDraft::new("A", vec![day(0, &[(1, 3)])]);
        assert!(matches!(store.create_program(zero), Err(Error::Validation(_))));

        let eight = ProgramDraft::new("A", vec![day(8, &[(1, 3)])]);
        assert!(matches!(store.create_program(eight), Err(Error::Validation(_))));

        let dup = ProgramDraft::new("A", vec![day(2, &[(1, 3)]), day(2, &[(6, 3)])]);
        assert!(matches!(store.create_program(dup), Err(Error::Validation(_))));
    }

    #[test]
    fn test_invalid_slots() {
        let mut store = Store::in_memory().unwrap();

        let no_sets = ProgramDraft::new("A", vec![day(1, &[(1, 0)])]);
        assert!(matches!(store.create_program(no_sets), Err(Error::Validation(_))));

        let unknown = ProgramDraft::new("A", vec![day(1, &[(404, 3)])]);
        assert!(matches!(store.create_program(unknown), Err(Error::Validation(_))));

        let empty_day = ProgramDraft::new("A", vec![day(1, &[])]);
        assert!(matches!(store.create_program(empty_day), Err(Error::Validation(_))));
    }

    #[test]
    fn test_program_without_workouts_allowed() {
        let mut store = Store::in_memory().unwrap();
        let program = store.create_program(ProgramDraft::new("Empty", vec![])).unwrap();
        assert!(program.workouts.is_empty());
    }

    #[test]
    fn test_update_keeps_activation_and_rotation() {
        let mut store = Store::in_memory().unwrap();
        let program = store.create_program(ppl()).unwrap();
        store.activate(program.id).unwrap();
        store.advance(program.id).unwrap();

        let mut draft = ppl();
        draft.name = "PPL v2".into();
        let updated = store.update_program(program.id, draft).unwrap();

        assert_eq!(updated.name, "PPL v2");
        assert!(updated.is_active);
        assert_eq!(updated.current_workout, 2);
    }

    #[test]
    fn test_update_shrinking_resets_rotation() {
        let mut store = Store::in_memory().unwrap();
        let program = store.create_program(ppl()).unwrap();
        store.activate(program.id).unwrap();
        store.advance(program.id).unwrap();
        store.advance(program.id).unwrap();
        assert_eq!(store.program(program.id).unwrap().current_workout, 3);

        let shorter = ProgramDraft::new("PP", vec![day(1, &[(6, 3)]), day(2, &[(10, 3)])]);
        let updated = store.update_program(program.id, shorter).unwrap();
        assert_eq!(updated.current_workout, 1);
    }

    #[test]
    fn test_update_missing_program() {
        let mut store = Store::in_memory().unwrap();
        let err = store.update_program(ProgramId(9), ppl()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_delete_program_orphans_history() {
        let mut store = Store::in_memory().unwrap();
        let program = store.create_program(ppl()).unwrap();
        store.activate(program.id).unwrap();
        store.start(program.id).unwrap();
        let session = store.active_session().unwrap().clone();
        store.log_set(session.id, ExerciseId(6), 60.0, 8).unwrap();
        store.finish(session.id).unwrap();

        store.delete_program(program.id).unwrap();

        assert!(store.program(program.id).is_none());
        assert!(store.active_program().is_none());
        assert_eq!(store.data().workout_sessions.len(), 1);
        assert_eq!(store.data().sets.len(), 1);
    }

    #[test]
    fn test_active_program_none_when_inactive() {
        let mut store = Store::in_memory().unwrap();
        store.create_program(ppl()).unwrap();
        assert!(store.active_program().is_none());
    }
}

//! Exercise catalog: predefined exercises plus user-defined ones.
//!
//! The predefined library is built once and copied into a fresh store the
//! first time it is opened. Custom exercises are added through
//! [`Store::add_custom_exercise`].

use crate::events::StoreEvent;
use crate::store::Store;
use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Cached predefined library - built once and reused across all operations
static PREDEFINED: Lazy<Vec<Exercise>> = Lazy::new(build_predefined_exercises);

/// Get a reference to the cached predefined exercise library
pub fn predefined_exercises() -> &'static [Exercise] {
    &PREDEFINED
}

fn build_predefined_exercises() -> Vec<Exercise> {
    use MuscleGroup::*;

    let library: [(&str, MuscleGroup); 20] = [
        // Legs
        ("Backsquat", Legs),
        ("Front Squat", Legs),
        ("Romanian Deadlift", Legs),
        ("Leg Press", Legs),
        ("Leg Curl", Legs),
        // Chest
        ("Flat Bench Press", Chest),
        ("Incline Bench Press", Chest),
        ("Dumbbell Fly", Chest),
        // Back
        ("Deadlift", Back),
        ("Barbell Row", Back),
        ("Pull-up", Back),
        ("Lat Pulldown", Back),
        // Shoulders
        ("Overhead Press", Shoulders),
        ("Lateral Raise", Shoulders),
        ("Face Pull", Shoulders),
        // Arms
        ("Barbell Curl", Arms),
        ("Hammer Curl", Arms),
        ("Tricep Pushdown", Arms),
        ("Overhead Tricep Extension", Arms),
        ("Close-Grip Bench Press", Arms),
    ];

    library
        .iter()
        .zip(1u64..)
        .map(|(&(name, muscle_group), id)| Exercise {
            id: ExerciseId(id),
            name: name.into(),
            muscle_group,
            is_custom: false,
            notes: String::new(),
        })
        .collect()
}

/// Parse a muscle group from raw form input (key or display name)
pub fn parse_muscle_group(raw: &str) -> Result<MuscleGroup> {
    let needle = raw.trim();
    if needle.is_empty() {
        return Err(Error::validation("Muscle group is required"));
    }
    MuscleGroup::ALL
        .iter()
        .copied()
        .find(|g| g.key().eq_ignore_ascii_case(needle) || g.display_name().eq_ignore_ascii_case(needle))
        .ok_or_else(|| Error::validation(format!("Unknown muscle group '{}'", needle)))
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl Store {
    pub fn list_exercises(&self) -> &[Exercise] {
        &self.data().exercises
    }

    pub fn exercise(&self, id: ExerciseId) -> Option<&Exercise> {
        self.data().exercise(id)
    }

    /// Case-insensitive lookup by name
    pub fn find_exercise_by_name(&self, name: &str) -> Option<&Exercise> {
        self.data()
            .exercises
            .iter()
            .find(|e| same_name(&e.name, name))
    }

    /// Exercises grouped by muscle group, in catalog order within each group
    pub fn exercises_by_muscle_group(&self) -> BTreeMap<MuscleGroup, Vec<&Exercise>> {
        let mut grouped: BTreeMap<MuscleGroup, Vec<&Exercise>> = BTreeMap::new();
        for exercise in &self.data().exercises {
            grouped.entry(exercise.muscle_group).or_default().push(exercise);
        }
        grouped
    }

    /// Add a user-defined exercise
    ///
    /// Fails with a validation error if the name is empty or already used
    /// (case-insensitive).
    pub fn add_custom_exercise(&mut self, name: &str, muscle_group: MuscleGroup) -> Result<Exercise> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Exercise name is required"));
        }
        if self.find_exercise_by_name(name).is_some() {
            return Err(Error::validation(format!(
                "An exercise named '{}' already exists",
                name
            )));
        }

        let exercise = self.transact(|doc, events| {
            let exercise = Exercise {
                id: doc.next_ids.next_exercise()?,
                name: name.to_string(),
                muscle_group,
                is_custom: true,
                notes: String::new(),
            };
            doc.data.exercises.push(exercise.clone());
            events.push(StoreEvent::ExerciseAdded {
                exercise_id: exercise.id,
            });
            Ok(exercise)
        })?;

        tracing::info!("Added custom exercise {} '{}'", exercise.id, exercise.name);
        Ok(exercise)
    }

    pub fn update_exercise_notes(&mut self, id: ExerciseId, notes: &str) -> Result<()> {
        self.transact(|doc, events| {
            let exercise = doc
                .data
                .exercises
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| Error::not_found(format!("exercise {}", id)))?;
            exercise.notes = notes.to_string();
            events.push(StoreEvent::ExerciseUpdated { exercise_id: id });
            Ok(())
        })?;
        tracing::debug!("Updated notes for exercise {}", id);
        Ok(())
    }

    /// Delete an exercise that has never been logged
    pub fn delete_exercise(&mut self, id: ExerciseId) -> Result<()> {
        self.transact(|doc, events| {
            if doc.data.exercise(id).is_none() {
                return Err(Error::not_found(format!("exercise {}", id)));
            }

            let logged = doc.data.sets.iter().filter(|s| s.exercise_id == id).count();
            if logged > 0 {
                return Err(Error::constraint(format!(
                    "Exercise {} has workout history ({} sets) and cannot be deleted",
                    id, logged
                )));
            }

            let referencing: Vec<_> = doc
                .data
                .programs
                .iter()
                .filter(|p| {
                    p.workouts
                        .iter()
                        .any(|w| w.exercises.iter().any(|x| x.exercise_id == id))
                })
                .map(|p| p.name.clone())
                .collect();
            if !referencing.is_empty() {
                tracing::warn!(
                    "Deleting exercise {} still referenced by programs: {:?}",
                    id,
                    referencing
                );
            }

            doc.data.exercises.retain(|e| e.id != id);
            events.push(StoreEvent::ExerciseDeleted { exercise_id: id });
            Ok(())
        })?;
        tracing::info!("Deleted exercise {}", id);
        Ok(())
    }
}

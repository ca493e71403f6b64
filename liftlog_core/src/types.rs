//! Core domain types for the Liftlog system.
//!
//! This module defines the persisted records the engine operates on:
//! - Exercises and muscle groups
//! - Programs and their workout-day definitions
//! - Workout sessions and the sets logged in them
//!
//! Field names serialize in camelCase so documents exported by the web
//! version of the tracker import unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> crate::Result<Self> {
                s.trim().parse::<u64>().map($name).map_err(|_| {
                    crate::Error::Validation(format!("Invalid {} id: '{}'", $label, s))
                })
            }
        }
    };
}

record_id!(
    /// Identifier of an exercise record
    ExerciseId,
    "exercise"
);
record_id!(
    /// Identifier of a program record
    ProgramId,
    "program"
);
record_id!(
    /// Identifier of a workout session
    SessionId,
    "session"
);
record_id!(
    /// Identifier of a logged set
    SetId,
    "set"
);

// ============================================================================
// Exercise Types
// ============================================================================

/// Muscle group an exercise is filed under
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Legs,
    Chest,
    Back,
    Shoulders,
    Arms,
}

impl MuscleGroup {
    pub const ALL: [MuscleGroup; 5] = [
        MuscleGroup::Legs,
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Shoulders,
        MuscleGroup::Arms,
    ];

    /// Stored key, as used in serialized documents
    pub fn key(&self) -> &'static str {
        match self {
            MuscleGroup::Legs => "legs",
            MuscleGroup::Chest => "chest",
            MuscleGroup::Back => "back",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Arms => "arms",
        }
    }

    /// Human readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            MuscleGroup::Legs => "Legs",
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Arms => "Arms",
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An exercise definition (e.g., "Flat Bench Press")
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub muscle_group: MuscleGroup,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub notes: String,
}

// ============================================================================
// Program Types
// ============================================================================

/// One exercise slot within a workout day
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutExercise {
    pub exercise_id: ExerciseId,
    pub target_sets: u32,
}

/// A numbered workout day within a program
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDef {
    pub workout_number: u32,
    #[serde(default)]
    pub exercises: Vec<WorkoutExercise>,
}

/// A named program: an ordered collection of workout days with one
/// "current" pointer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    #[serde(default)]
    pub workouts: Vec<WorkoutDef>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default = "first_workout")]
    pub current_workout: u32,
}

fn first_workout() -> u32 {
    1
}

impl Program {
    /// Workout definition for a given day number
    pub fn workout(&self, workout_number: u32) -> Option<&WorkoutDef> {
        self.workouts
            .iter()
            .find(|w| w.workout_number == workout_number)
    }

    /// Workout definition the rotation currently points at
    pub fn current_workout_def(&self) -> Option<&WorkoutDef> {
        self.workout(self.current_workout)
    }
}

// ============================================================================
// Session and Set Types
// ============================================================================

/// One real-world occurrence of performing a workout day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: SessionId,
    pub program_id: ProgramId,
    pub workout_number: u32,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub is_complete: bool,
}

/// One recorded (weight, reps) performance of an exercise within a session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSet {
    pub id: SetId,
    pub workout_session_id: SessionId,
    pub exercise_id: ExerciseId,
    pub weight: f64,
    pub reps: u32,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Dataset
// ============================================================================

/// The four persisted entity collections
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub programs: Vec<Program>,
    #[serde(default)]
    pub workout_sessions: Vec<WorkoutSession>,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

impl Dataset {
    pub fn exercise(&self, id: ExerciseId) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn program(&self, id: ProgramId) -> Option<&Program> {
        self.programs.iter().find(|p| p.id == id)
    }

    pub fn session(&self, id: SessionId) -> Option<&WorkoutSession> {
        self.workout_sessions.iter().find(|s| s.id == id)
    }

    pub fn set(&self, id: SetId) -> Option<&WorkoutSet> {
        self.sets.iter().find(|s| s.id == id)
    }

    pub(crate) fn program_mut(&mut self, id: ProgramId) -> Option<&mut Program> {
        self.programs.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn session_mut(&mut self, id: SessionId) -> Option<&mut WorkoutSession> {
        self.workout_sessions.iter_mut().find(|s| s.id == id)
    }

    /// Sets belonging to a session, in logging order
    pub fn sets_for_session(&self, id: SessionId) -> Vec<&WorkoutSet> {
        self.sets
            .iter()
            .filter(|s| s.workout_session_id == id)
            .collect()
    }

    /// The incomplete session, if one exists
    pub fn active_session(&self) -> Option<&WorkoutSession> {
        self.workout_sessions.iter().find(|s| !s.is_complete)
    }

    /// The program with `is_active` set, if one exists
    pub fn active_program(&self) -> Option<&Program> {
        self.programs.iter().find(|p| p.is_active)
    }
}

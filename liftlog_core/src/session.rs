//! Session manager: lifecycle of an in-progress workout.
//!
//! ```text
//! NoProgram ─activate─▶ Previewing ─start─▶ Logging ─finish─▶ Completed
//!                                              └────cancel──▶ Cancelled
//! ```
//!
//! At most one incomplete session exists across the whole store.

use crate::events::StoreEvent;
use crate::history::LastWorkout;
use crate::scheduler::advance_in;
use crate::store::Store;
use crate::types::*;
use crate::{Error, Result};
use chrono::Utc;

// ============================================================================
// Set input validation
// ============================================================================

/// A validated (weight, reps) pair
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SetInput {
    pub weight: f64,
    pub reps: u32,
}

impl SetInput {
    pub fn new(weight: f64, reps: u32) -> Result<Self> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::validation(format!(
                "Weight must be a positive number, got {}",
                weight
            )));
        }
        if reps == 0 {
            return Err(Error::validation("Reps must be a positive whole number"));
        }
        Ok(Self { weight, reps })
    }

    /// Validate raw form text
    pub fn parse(raw_weight: &str, raw_reps: &str) -> Result<Self> {
        let weight: f64 = raw_weight
            .trim()
            .parse()
            .map_err(|_| Error::validation(format!("Invalid weight '{}'", raw_weight.trim())))?;
        let reps: i64 = raw_reps
            .trim()
            .parse()
            .map_err(|_| Error::validation(format!("Invalid reps '{}'", raw_reps.trim())))?;
        let reps = u32::try_from(reps)
            .map_err(|_| Error::validation(format!("Reps out of range: {}", reps)))?;
        Self::new(weight, reps)
    }
}

// ============================================================================
// Phase views
// ============================================================================

/// What the workout screen should show
#[derive(Clone, Debug, PartialEq)]
pub enum SessionPhase {
    /// No program is active
    NoProgram,
    /// A program is active and no session is in progress
    Previewing(WorkoutPreview),
    /// A session is in progress
    Logging(WorkoutSheet),
}

/// The next workout of the active program, before it is started
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutPreview {
    pub program: Program,
    pub workout_number: u32,
    /// `None` when the program has nothing configured for this day
    pub workout: Option<WorkoutDef>,
}

/// Everything needed to render a session being logged
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutSheet {
    pub session: WorkoutSession,
    /// `None` if the session's program was deleted
    pub program: Option<Program>,
    pub entries: Vec<SheetEntry>,
    /// Sets logged for exercises that are not part of the workout day
    pub extras: Vec<SheetEntry>,
    pub last_workout: Option<LastWorkout>,
}

/// One exercise row on the logging sheet
#[derive(Clone, Debug, PartialEq)]
pub struct SheetEntry {
    pub exercise_id: ExerciseId,
    /// `None` if the exercise was deleted from the catalog
    pub exercise: Option<Exercise>,
    pub target_sets: Option<u32>,
    /// Sets logged in this session, logging order
    pub logged: Vec<WorkoutSet>,
    /// Sets from the last completed run of the same workout day
    pub last_time: Vec<WorkoutSet>,
}

/// Result of trying to start a session
#[derive(Clone, Debug, PartialEq)]
pub enum StartOutcome {
    Started(WorkoutSession),
    /// The program has nothing configured for its current day; nothing was written
    NoWorkoutDefined { workout_number: u32 },
}

/// Result of finishing a session
#[derive(Clone, Debug, PartialEq)]
pub struct FinishOutcome {
    pub session: WorkoutSession,
    /// New rotation pointer, `None` if the program was gone or had no workouts
    pub next_workout: Option<u32>,
}

// ============================================================================
// Operations
// ============================================================================

impl Store {
    /// The incomplete session, if any
    pub fn active_session(&self) -> Option<&WorkoutSession> {
        self.data().active_session()
    }

    pub fn session(&self, id: SessionId) -> Option<&WorkoutSession> {
        self.data().session(id)
    }

    /// Sets of a session, logging order
    pub fn sets_for_session(&self, id: SessionId) -> Vec<&WorkoutSet> {
        self.data().sets_for_session(id)
    }

    /// Start the current workout day of a program
    pub fn start(&mut self, program_id: ProgramId) -> Result<StartOutcome> {
        if let Some(active) = self.active_session() {
            return Err(Error::constraint(format!(
                "Session {} is still in progress; finish or cancel it first",
                active.id
            )));
        }

        let program = self
            .program(program_id)
            .ok_or_else(|| Error::not_found(format!("program {}", program_id)))?;
        let workout_number = program.current_workout;
        if program.current_workout_def().is_none() {
            tracing::info!(
                "Program {} has no workout {} configured, staying in preview",
                program_id,
                workout_number
            );
            return Ok(StartOutcome::NoWorkoutDefined { workout_number });
        }

        let session = self.transact(|doc, events| {
            let session = WorkoutSession {
                id: doc.next_ids.next_session()?,
                program_id,
                workout_number,
                date: Utc::now(),
                is_complete: false,
            };
            doc.data.workout_sessions.push(session.clone());
            events.push(StoreEvent::SessionStarted {
                session_id: session.id,
                program_id,
                workout_number,
            });
            Ok(session)
        })?;

        tracing::info!(
            "Started session {} (program {}, workout {})",
            session.id,
            program_id,
            workout_number
        );
        Ok(StartOutcome::Started(session))
    }

    /// Record one set in an in-progress session
    pub fn log_set(
        &mut self,
        session_id: SessionId,
        exercise_id: ExerciseId,
        weight: f64,
        reps: u32,
    ) -> Result<WorkoutSet> {
        let input = SetInput::new(weight, reps)?;

        let set = self.transact(|doc, events| {
            let session = doc
                .data
                .session(session_id)
                .ok_or_else(|| Error::not_found(format!("session {}", session_id)))?;
            if session.is_complete {
                return Err(Error::constraint(format!(
                    "Session {} is already complete",
                    session_id
                )));
            }
            if doc.data.exercise(exercise_id).is_none() {
                return Err(Error::not_found(format!("exercise {}", exercise_id)));
            }

            let set = WorkoutSet {
                id: doc.next_ids.next_set()?,
                workout_session_id: session_id,
                exercise_id,
                weight: input.weight,
                reps: input.reps,
                timestamp: Utc::now(),
            };
            doc.data.sets.push(set.clone());
            events.push(StoreEvent::SetLogged {
                set_id: set.id,
                session_id,
            });
            Ok(set)
        })?;

        tracing::debug!(
            "Logged set {}: exercise {} {} x {}",
            set.id,
            exercise_id,
            set.weight,
            set.reps
        );
        Ok(set)
    }

    /// Correct a logged set in place
    ///
    /// The set keeps its id, its position among the session's sets, and its
    /// original timestamp.
    pub fn edit_set(&mut self, set_id: SetId, weight: f64, reps: u32) -> Result<WorkoutSet> {
        let input = SetInput::new(weight, reps)?;

        let set = self.transact(|doc, events| {
            let set = doc
                .data
                .sets
                .iter_mut()
                .find(|s| s.id == set_id)
                .ok_or_else(|| Error::not_found(format!("set {}", set_id)))?;
            set.weight = input.weight;
            set.reps = input.reps;
            let edited = set.clone();
            events.push(StoreEvent::SetEdited { set_id });
            Ok(edited)
        })?;

        tracing::debug!("Edited set {}: {} x {}", set_id, set.weight, set.reps);
        Ok(set)
    }

    pub fn delete_set(&mut self, set_id: SetId) -> Result<()> {
        self.transact(|doc, events| {
            let before = doc.data.sets.len();
            doc.data.sets.retain(|s| s.id != set_id);
            if doc.data.sets.len() == before {
                return Err(Error::not_found(format!("set {}", set_id)));
            }
            events.push(StoreEvent::SetDeleted { set_id });
            Ok(())
        })?;
        tracing::debug!("Deleted set {}", set_id);
        Ok(())
    }

    /// Complete a session and rotate its program, as one write
    pub fn finish(&mut self, session_id: SessionId) -> Result<FinishOutcome> {
        let outcome = self.transact(|doc, events| {
            let session = doc
                .data
                .session_mut(session_id)
                .ok_or_else(|| Error::not_found(format!("session {}", session_id)))?;
            if session.is_complete {
                return Err(Error::constraint(format!(
                    "Session {} is already complete",
                    session_id
                )));
            }
            session.is_complete = true;
            let session = session.clone();
            events.push(StoreEvent::SessionFinished { session_id });

            let next_workout = if doc.data.program(session.program_id).is_some() {
                advance_in(&mut doc.data, session.program_id)?
            } else {
                tracing::warn!(
                    "Session {} belongs to deleted program {}, not rotating",
                    session_id,
                    session.program_id
                );
                None
            };
            if let Some(current_workout) = next_workout {
                events.push(StoreEvent::WorkoutAdvanced {
                    program_id: session.program_id,
                    current_workout,
                });
            }

            Ok(FinishOutcome {
                session,
                next_workout,
            })
        })?;

        tracing::info!(
            "Finished session {}; next workout: {:?}",
            session_id,
            outcome.next_workout
        );
        Ok(outcome)
    }

    /// Discard an in-progress session together with all of its sets
    pub fn cancel(&mut self, session_id: SessionId) -> Result<usize> {
        let removed = self.transact(|doc, events| {
            let session = doc
                .data
                .session(session_id)
                .ok_or_else(|| Error::not_found(format!("session {}", session_id)))?;
            if session.is_complete {
                return Err(Error::constraint(format!(
                    "Session {} is complete and cannot be cancelled",
                    session_id
                )));
            }

            let before = doc.data.sets.len();
            doc.data.sets.retain(|s| s.workout_session_id != session_id);
            let removed = before - doc.data.sets.len();
            doc.data.workout_sessions.retain(|s| s.id != session_id);

            events.push(StoreEvent::SessionCancelled {
                session_id,
                sets_removed: removed,
            });
            Ok(removed)
        })?;

        tracing::info!("Cancelled session {} ({} sets removed)", session_id, removed);
        Ok(removed)
    }

    /// Current state of the workout screen
    pub fn phase(&self) -> SessionPhase {
        if let Some(session) = self.active_session() {
            return SessionPhase::Logging(self.workout_sheet(session));
        }

        match self.active_program() {
            None => SessionPhase::NoProgram,
            Some(program) => SessionPhase::Previewing(WorkoutPreview {
                program: program.clone(),
                workout_number: program.current_workout,
                workout: program.current_workout_def().cloned(),
            }),
        }
    }

    fn workout_sheet(&self, session: &WorkoutSession) -> WorkoutSheet {
        let data = self.data();
        let program = data.program(session.program_id).cloned();
        let last_workout = self.last_completed_workout(session.program_id, session.workout_number);
        let logged = data.sets_for_session(session.id);

        let entry = |exercise_id: ExerciseId, target_sets: Option<u32>| SheetEntry {
            exercise_id,
            exercise: data.exercise(exercise_id).cloned(),
            target_sets,
            logged: logged
                .iter()
                .filter(|s| s.exercise_id == exercise_id)
                .map(|s| (*s).clone())
                .collect(),
            last_time: last_workout
                .as_ref()
                .map(|lw| {
                    lw.sets
                        .iter()
                        .filter(|s| s.exercise_id == exercise_id)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
        };

        let slots: Vec<WorkoutExercise> = program
            .as_ref()
            .and_then(|p| p.workout(session.workout_number))
            .map(|w| w.exercises.clone())
            .unwrap_or_default();

        let entries: Vec<SheetEntry> = slots
            .iter()
            .map(|slot| entry(slot.exercise_id, Some(slot.target_sets)))
            .collect();

        let mut extra_ids: Vec<ExerciseId> = Vec::new();
        for set in &logged {
            let planned = slots.iter().any(|slot| slot.exercise_id == set.exercise_id);
            if !planned && !extra_ids.contains(&set.exercise_id) {
                extra_ids.push(set.exercise_id);
            }
        }
        let extras = extra_ids.into_iter().map(|id| entry(id, None)).collect();

        WorkoutSheet {
            session: session.clone(),
            program,
            entries,
            extras,
            last_workout,
        }
    }
}

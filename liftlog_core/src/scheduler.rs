//! Workout scheduler: program activation and workout-day rotation.
//!
//! Rotation is a fixed-size round-robin over the number of defined workout
//! days. Day numbers and calendar dates play no part in it.

use crate::events::StoreEvent;
use crate::store::Store;
use crate::types::*;
use crate::{Error, Result};

/// Next rotation slot after `current` for a program with `total` workouts
///
/// Returns `None` when the program has no workouts.
pub fn next_workout_number(current: u32, total: usize) -> Option<u32> {
    if total == 0 {
        return None;
    }
    if current as usize >= total {
        Some(1)
    } else {
        Some(current + 1)
    }
}

/// Deactivate every program, then activate `id` at workout 1
pub(crate) fn activate_in(data: &mut Dataset, id: ProgramId) -> Result<()> {
    if data.program(id).is_none() {
        return Err(Error::not_found(format!("program {}", id)));
    }
    for program in data.programs.iter_mut() {
        if program.id == id {
            program.is_active = true;
            program.current_workout = 1;
        } else {
            program.is_active = false;
        }
    }
    Ok(())
}

/// Rotate a program's pointer; `Ok(None)` when it has no workouts
pub(crate) fn advance_in(data: &mut Dataset, id: ProgramId) -> Result<Option<u32>> {
    let program = data
        .program_mut(id)
        .ok_or_else(|| Error::not_found(format!("program {}", id)))?;

    match next_workout_number(program.current_workout, program.workouts.len()) {
        Some(next) => {
            program.current_workout = next;
            Ok(Some(next))
        }
        None => Ok(None),
    }
}

impl Store {
    /// Make `id` the only active program, starting at workout 1
    pub fn activate(&mut self, id: ProgramId) -> Result<()> {
        self.transact(|doc, events| {
            activate_in(&mut doc.data, id)?;
            events.push(StoreEvent::ProgramActivated { program_id: id });
            Ok(())
        })?;
        tracing::info!("Activated program {}", id);
        Ok(())
    }

    /// Move a program's rotation pointer to the next workout day
    ///
    /// Returns the new pointer, or `None` if the program has no workouts
    /// (in which case nothing changes).
    pub fn advance(&mut self, id: ProgramId) -> Result<Option<u32>> {
        let next = self.transact(|doc, events| {
            let next = advance_in(&mut doc.data, id)?;
            if let Some(current_workout) = next {
                events.push(StoreEvent::WorkoutAdvanced {
                    program_id: id,
                    current_workout,
                });
            }
            Ok(next)
        })?;

        match next {
            Some(n) => tracing::info!("Program {} advanced to workout {}", id, n),
            None => tracing::debug!("Program {} has no workouts, nothing to advance", id),
        }
        Ok(next)
    }
}

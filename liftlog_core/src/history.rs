//! History aggregation over logged sets.
//!
//! Provides the per-exercise history view, the "last time" lookup used while
//! logging, and the weight-tier summary both of them render.

use crate::store::Store;
use crate::types::*;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// Sets of one exercise performed in one session
#[derive(Clone, Debug, PartialEq)]
pub struct SessionHistory {
    pub session_id: SessionId,
    pub program_id: ProgramId,
    /// `None` once the program has been deleted
    pub program_name: Option<String>,
    pub workout_number: u32,
    pub date: DateTime<Utc>,
    pub is_complete: bool,
    pub sets: Vec<WorkoutSet>,
}

impl SessionHistory {
    pub fn performance(&self) -> PerformanceSummary {
        format_performance(&self.sets)
    }
}

/// The most recent completed run of a workout day
#[derive(Clone, Debug, PartialEq)]
pub struct LastWorkout {
    pub session: WorkoutSession,
    pub sets: Vec<WorkoutSet>,
}

impl LastWorkout {
    /// Sets of one exercise from that run, in logging order
    pub fn sets_for(&self, exercise_id: ExerciseId) -> Vec<&WorkoutSet> {
        self.sets
            .iter()
            .filter(|s| s.exercise_id == exercise_id)
            .collect()
    }
}

/// Reps performed at one weight, in logging order
#[derive(Clone, Debug, PartialEq)]
pub struct WeightGroup {
    pub weight: f64,
    pub reps: Vec<u32>,
}

/// Sets summarised by weight tier, heaviest first
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerformanceSummary {
    pub groups: Vec<WeightGroup>,
}

impl PerformanceSummary {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn set_count(&self) -> usize {
        self.groups.iter().map(|g| g.reps.len()).sum()
    }

    /// Render as "70kg × 4 reps and 60kg × 8, 6 reps" with the given unit
    pub fn render(&self, unit: &str) -> String {
        self.groups
            .iter()
            .map(|g| {
                let reps: Vec<String> = g.reps.iter().map(|r| r.to_string()).collect();
                format!("{}{} × {} reps", format_weight(g.weight), unit, reps.join(", "))
            })
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render("kg"))
    }
}

/// Format a weight without a trailing ".0" for whole numbers
pub fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{:.0}", weight)
    } else {
        weight.to_string()
    }
}

/// Group sets by weight, heaviest group first, reps in logging order
pub fn format_performance<'a, I>(sets: I) -> PerformanceSummary
where
    I: IntoIterator<Item = &'a WorkoutSet>,
{
    let mut groups: Vec<WeightGroup> = Vec::new();
    for set in sets {
        match groups.iter_mut().find(|g| g.weight == set.weight) {
            Some(group) => group.reps.push(set.reps),
            None => groups.push(WeightGroup {
                weight: set.weight,
                reps: vec![set.reps],
            }),
        }
    }
    groups.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    PerformanceSummary { groups }
}

impl Store {
    /// Every session in which an exercise was logged, newest first
    pub fn history_for(&self, exercise_id: ExerciseId) -> Vec<SessionHistory> {
        let data = self.data();
        let mut by_session: HashMap<SessionId, Vec<WorkoutSet>> = HashMap::new();
        let mut order: Vec<SessionId> = Vec::new();

        for set in data.sets.iter().filter(|s| s.exercise_id == exercise_id) {
            let bucket = by_session.entry(set.workout_session_id).or_insert_with(|| {
                order.push(set.workout_session_id);
                Vec::new()
            });
            bucket.push(set.clone());
        }

        let mut history: Vec<SessionHistory> = order
            .into_iter()
            .filter_map(|session_id| {
                let sets = by_session.remove(&session_id)?;
                let Some(session) = data.session(session_id) else {
                    tracing::warn!(
                        "Skipping {} sets that reference missing session {}",
                        sets.len(),
                        session_id
                    );
                    return None;
                };
                Some(SessionHistory {
                    session_id,
                    program_id: session.program_id,
                    program_name: data.program(session.program_id).map(|p| p.name.clone()),
                    workout_number: session.workout_number,
                    date: session.date,
                    is_complete: session.is_complete,
                    sets,
                })
            })
            .collect();

        // Stable: sessions sharing a date keep first-logged order
        history.sort_by(|a, b| b.date.cmp(&a.date));

        tracing::debug!(
            "Found {} sessions of history for exercise {}",
            history.len(),
            exercise_id
        );
        history
    }

    /// Most recent completed session of a program's workout day, with its sets
    pub fn last_completed_workout(
        &self,
        program_id: ProgramId,
        workout_number: u32,
    ) -> Option<LastWorkout> {
        let data = self.data();
        let session = data
            .workout_sessions
            .iter()
            .filter(|s| {
                s.is_complete && s.program_id == program_id && s.workout_number == workout_number
            })
            .max_by_key(|s| s.date)?;

        Some(LastWorkout {
            session: session.clone(),
            sets: data
                .sets_for_session(session.id)
                .into_iter()
                .cloned()
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::tests::ppl;
    use crate::session::StartOutcome;
    use chrono::Duration;

    fn set(id: u64, weight: f64, reps: u32) -> WorkoutSet {
        WorkoutSet {
            id: SetId(id),
            workout_session_id: SessionId(1),
            exercise_id: ExerciseId(6),
            weight,
            reps,
            timestamp: Utc::now(),
        }
    }

    fn run_workout(store: &mut Store, program_id: ProgramId, sets: &[(u64, f64, u32)]) -> SessionId {
        let StartOutcome::Started(session) = store.start(program_id).unwrap() else {
            panic!("expected start");
        };
        for &(exercise, weight, reps) in sets {
            store
                .log_set(session.id, ExerciseId(exercise), weight, reps)
                .unwrap();
        }
        store.finish(session.id).unwrap();
        session.id
    }

    /// Shift a session's date so ordering does not depend on clock resolution
    fn backdate(store: &mut Store, session_id: SessionId, days: i64) {
        store
            .transact(|doc, _| {
                let session = doc.data.session_mut(session_id).unwrap();
                session.date = session.date - Duration::days(days);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_format_performance_orders_heaviest_first() {
        let sets = vec![set(1, 60.0, 8), set(2, 60.0, 6), set(3, 70.0, 4)];
        let summary = format_performance(&sets);

        assert_eq!(summary.groups.len(), 2);
        assert_eq!(summary.groups[0].weight, 70.0);
        assert_eq!(summary.groups[0].reps, vec![4]);
        assert_eq!(summary.groups[1].weight, 60.0);
        assert_eq!(summary.groups[1].reps, vec![8, 6]);
        assert_eq!(summary.set_count(), 3);
        assert_eq!(summary.to_string(), "70kg × 4 reps and 60kg × 8, 6 reps");
    }

    #[test]
    fn test_format_performance_single_group_and_units() {
        let sets = vec![set(1, 62.5, 5), set(2, 62.5, 5)];
        let summary = format_performance(&sets);
        assert_eq!(summary.render("lb"), "62.5lb × 5, 5 reps");
    }

    #[test]
    fn test_format_performance_empty() {
        let summary = format_performance(&[]);
        assert!(summary.is_empty());
        assert_eq!(summary.to_string(), "");
    }

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(100.0), "100");
        assert_eq!(format_weight(102.5), "102.5");
    }

    #[test]
    fn test_history_groups_by_session_newest_first() {
        let mut store = Store::in_memory().unwrap();
        let program = store.create_program(ppl()).unwrap();
        store.activate(program.id).unwrap();

        let older = run_workout(&mut store, program.id, &[(6, 60.0, 8), (6, 60.0, 7)]);
        run_workout(&mut store, program.id, &[(10, 50.0, 10)]);
        run_workout(&mut store, program.id, &[(1, 100.0, 5)]);
        let newer = run_workout(&mut store, program.id, &[(6, 62.5, 8)]);
        backdate(&mut store, older, 7);

        let history = store.history_for(ExerciseId(6));
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].session_id, newer);
        assert_eq!(history[1].session_id, older);
        assert_eq!(history[1].sets.len(), 2);
        assert_eq!(history[0].program_name.as_deref(), Some("PPL"));
        assert_eq!(history[0].workout_number, 1);
        assert_eq!(history[1].performance().to_string(), "60kg × 8, 7 reps");
    }

    #[test]
    fn test_history_excludes_cancelled_sessions() {
        let mut store = Store::in_memory().unwrap();
        let program = store.create_program(ppl()).unwrap();
        store.activate(program.id).unwrap();

        let StartOutcome::Started(session) = store.start(program.id).unwrap() else {
            panic!("expected start");
        };
        store.log_set(session.id, ExerciseId(6), 60.0, 8).unwrap();
        assert_eq!(store.history_for(ExerciseId(6)).len(), 1);

        store.cancel(session.id).unwrap();
        assert!(store.history_for(ExerciseId(6)).is_empty());
    }

    #[test]
    fn test_history_of_deleted_program_has_no_name() {
        let mut store = Store::in_memory().unwrap();
        let program = store.create_program(ppl()).unwrap();
        store.activate(program.id).unwrap();
        run_workout(&mut store, program.id, &[(6, 60.0, 8)]);
        store.delete_program(program.id).unwrap();

        let history = store.history_for(ExerciseId(6));
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].program_name, None);
    }

    #[test]
    fn test_last_completed_workout() {
        let mut store = Store::in_memory().unwrap();
        let program = store.create_program(ppl()).unwrap();
        store.activate(program.id).unwrap();

        assert!(store.last_completed_workout(program.id, 1).is_none());

        let first = run_workout(&mut store, program.id, &[(6, 60.0, 8)]);
        run_workout(&mut store, program.id, &[(10, 50.0, 10)]);
        run_workout(&mut store, program.id, &[(1, 100.0, 5)]);
        let second = run_workout(&mut store, program.id, &[(6, 65.0, 6), (6, 60.0, 8)]);
        backdate(&mut store, first, 7);

        let last = store.last_completed_workout(program.id, 1).unwrap();
        assert_eq!(last.session.id, second);
        assert_eq!(last.sets.len(), 2);
        assert_eq!(last.sets_for(ExerciseId(6)).len(), 2);
        assert!(last.sets_for(ExerciseId(10)).is_empty());

        assert!(store.last_completed_workout(program.id, 4).is_none());
        assert!(store.last_completed_workout(ProgramId(99), 1).is_none());
    }

    #[test]
    fn test_last_completed_ignores_in_progress() {
        let mut store = Store::in_memory().unwrap();
        let program = store.create_program(ppl()).unwrap();
        store.activate(program.id).unwrap();

        let StartOutcome::Started(session) = store.start(program.id).unwrap() else {
            panic!("expected start");
        };
        store.log_set(session.id, ExerciseId(6), 60.0, 8).unwrap();
        assert!(store.last_completed_workout(program.id, 1).is_none());
    }
}

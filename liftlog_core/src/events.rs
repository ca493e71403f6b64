//! State-change notifications.
//!
//! Every committed store mutation produces one or more [`StoreEvent`]s which
//! are dispatched to subscribed listeners after the write has succeeded.
//! Listener invocation order is unspecified.

use crate::{ExerciseId, ProgramId, SessionId, SetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A committed change to the store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    CatalogSeeded { count: usize },
    ExerciseAdded { exercise_id: ExerciseId },
    ExerciseUpdated { exercise_id: ExerciseId },
    ExerciseDeleted { exercise_id: ExerciseId },
    ProgramCreated { program_id: ProgramId },
    ProgramUpdated { program_id: ProgramId },
    ProgramDeleted { program_id: ProgramId },
    ProgramActivated { program_id: ProgramId },
    WorkoutAdvanced { program_id: ProgramId, current_workout: u32 },
    SessionStarted { session_id: SessionId, program_id: ProgramId, workout_number: u32 },
    SessionFinished { session_id: SessionId },
    SessionCancelled { session_id: SessionId, sets_removed: usize },
    SetLogged { set_id: SetId, session_id: SessionId },
    SetEdited { set_id: SetId },
    SetDeleted { set_id: SetId },
    DataImported {
        exercises: usize,
        programs: usize,
        workout_sessions: usize,
        sets: usize,
    },
}

/// Handle returned by [`Subscribers::subscribe`], used to unsubscribe
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Registry of event listeners
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    listeners: BTreeMap<SubscriptionId, Listener>,
}

impl Subscribers {
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.insert(id, Box::new(listener));
        id
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn dispatch(&mut self, events: &[StoreEvent]) {
        for event in events {
            tracing::trace!(?event, "Dispatching store event");
            for listener in self.listeners.values_mut() {
                listener(event);
            }
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_reaches_all_listeners() {
        let mut subs = Subscribers::default();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let a = Rc::clone(&seen);
        subs.subscribe(move |e| a.borrow_mut().push(("a", e.clone())));
        let b = Rc::clone(&seen);
        subs.subscribe(move |e| b.borrow_mut().push(("b", e.clone())));

        subs.dispatch(&[StoreEvent::SetDeleted { set_id: SetId(4) }]);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().any(|(who, _)| *who == "a"));
        assert!(seen.iter().any(|(who, _)| *who == "b"));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut subs = Subscribers::default();
        let count = Rc::new(RefCell::new(0));

        let c = Rc::clone(&count);
        let id = subs.subscribe(move |_| *c.borrow_mut() += 1);

        subs.dispatch(&[StoreEvent::SetEdited { set_id: SetId(1) }]);
        assert!(subs.unsubscribe(id));
        assert!(!subs.unsubscribe(id));
        subs.dispatch(&[StoreEvent::SetEdited { set_id: SetId(1) }]);

        assert_eq!(*count.borrow(), 1);
        assert!(subs.is_empty());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = StoreEvent::WorkoutAdvanced {
            program_id: ProgramId(2),
            current_workout: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"workout_advanced\""));
        assert!(json.contains("\"current_workout\":3"));
    }
}

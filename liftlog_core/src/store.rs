//! The persisted store and its transactional write path.
//!
//! A [`Store`] owns the in-memory [`StoreDocument`] and a [`Backend`] that
//! persists it. Every mutation goes through [`Store::transact`]: the closure
//! edits a clone of the document, the clone is written as one save, and only
//! then does it replace the in-memory copy. A failed closure or a failed save
//! leaves both copies untouched.

use crate::events::{StoreEvent, SubscriptionId, Subscribers};
use crate::{Dataset, Error, ExerciseId, ProgramId, Result, SessionId, SetId};
use serde::{Deserialize, Serialize};

/// Current on-disk schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Largest id handed out or accepted on import (2^53 - 1, exact in JSON numbers)
pub const MAX_RECORD_ID: u64 = (1 << 53) - 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Per-collection id counters; ids are never reused after deletion
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    #[serde(default)]
    pub exercise: u64,
    #[serde(default)]
    pub program: u64,
    #[serde(default)]
    pub session: u64,
    #[serde(default)]
    pub set: u64,
}

impl IdCounters {
    /// Counters positioned after the highest id present in a dataset
    pub fn from_dataset(data: &Dataset) -> Self {
        let mut counters = Self::default();
        counters.reconcile(data);
        counters
    }

    /// Raise every counter to at least the highest id present
    pub fn reconcile(&mut self, data: &Dataset) {
        let max_exercise = data.exercises.iter().map(|e| e.id.0).max().unwrap_or(0);
        let max_program = data.programs.iter().map(|p| p.id.0).max().unwrap_or(0);
        let max_session = data
            .workout_sessions
            .iter()
            .map(|s| s.id.0)
            .max()
            .unwrap_or(0);
        let max_set = data.sets.iter().map(|s| s.id.0).max().unwrap_or(0);

        self.exercise = self.exercise.max(max_exercise);
        self.program = self.program.max(max_program);
        self.session = self.session.max(max_session);
        self.set = self.set.max(max_set);
    }

    pub fn next_exercise(&mut self) -> Result<ExerciseId> {
        bump(&mut self.exercise, "exercise").map(ExerciseId)
    }

    pub fn next_program(&mut self) -> Result<ProgramId> {
        bump(&mut self.program, "program").map(ProgramId)
    }

    pub fn next_session(&mut self) -> Result<SessionId> {
        bump(&mut self.session, "session").map(SessionId)
    }

    pub fn next_set(&mut self) -> Result<SetId> {
        bump(&mut self.set, "set").map(SetId)
    }
}

fn bump(counter: &mut u64, label: &str) -> Result<u64> {
    let current = *counter;
    let next = current
        .checked_add(1)
        .filter(|&next| next <= MAX_RECORD_ID)
        .ok_or_else(|| Error::State(format!("No {} ids left after {}", label, current)))?;
    *counter = next;
    Ok(next)
}

/// Everything that is persisted
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub next_ids: IdCounters,
    #[serde(default)]
    pub data: Dataset,
}

impl StoreDocument {
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            next_ids: IdCounters::default(),
            data: Dataset::default(),
        }
    }
}

/// Persistence seam for the store document
pub trait Backend {
    /// Load the stored document, `None` if nothing has been stored yet
    fn load(&mut self) -> Result<Option<StoreDocument>>;

    /// Persist the full document as one write
    fn save(&mut self, doc: &StoreDocument) -> Result<()>;
}

/// In-process backend, for tests and embedding
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    doc: Option<StoreDocument>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with a document
    pub fn with_document(doc: StoreDocument) -> Self {
        Self { doc: Some(doc) }
    }

    pub fn document(&self) -> Option<&StoreDocument> {
        self.doc.as_ref()
    }
}

impl Backend for MemoryBackend {
    fn load(&mut self) -> Result<Option<StoreDocument>> {
        Ok(self.doc.clone())
    }

    fn save(&mut self, doc: &StoreDocument) -> Result<()> {
        self.doc = Some(doc.clone());
        Ok(())
    }
}

/// Options applied when opening a store
#[derive(Clone, Debug)]
pub struct OpenOptions {
    /// Seed the predefined exercise catalog when no exercises exist
    pub seed_catalog: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self { seed_catalog: true }
    }
}

/// The workout store: persisted dataset plus change notifications
pub struct Store {
    doc: StoreDocument,
    backend: Box<dyn Backend>,
    subscribers: Subscribers,
}

impl Store {
    /// Open a store with default options
    pub fn open(backend: impl Backend + 'static) -> Result<Self> {
        Self::open_with(backend, OpenOptions::default())
    }

    /// Open a store, seeding the predefined catalog if requested
    pub fn open_with(backend: impl Backend + 'static, options: OpenOptions) -> Result<Self> {
        let mut backend: Box<dyn Backend> = Box::new(backend);
        let mut doc = match backend.load()? {
            Some(doc) => doc,
            None => {
                tracing::info!("No stored data found, starting with an empty store");
                StoreDocument::new()
            }
        };
        doc.next_ids.reconcile(&doc.data);

        let mut store = Self {
            doc,
            backend,
            subscribers: Subscribers::default(),
        };

        if options.seed_catalog && store.doc.data.exercises.is_empty() {
            store.seed_catalog()?;
        }

        Ok(store)
    }

    /// In-memory store with the predefined catalog, for tests and previews
    pub fn in_memory() -> Result<Self> {
        Self::open(MemoryBackend::new())
    }

    /// Current dataset (read side for all views)
    pub fn data(&self) -> &Dataset {
        &self.doc.data
    }

    pub fn document(&self) -> &StoreDocument {
        &self.doc
    }

    /// Register a listener for committed changes
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Apply a mutation as a single write
    ///
    /// The closure receives a draft copy of the document and a buffer for the
    /// events it produces. Nothing is visible, persisted, or dispatched unless
    /// both the closure and the save succeed.
    pub(crate) fn transact<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut StoreDocument, &mut Vec<StoreEvent>) -> Result<T>,
    {
        let mut draft = self.doc.clone();
        let mut events = Vec::new();
        let value = f(&mut draft, &mut events)?;

        if draft == self.doc {
            tracing::debug!("Transaction made no changes, skipping save");
            return Ok(value);
        }

        self.backend.save(&draft)?;
        self.doc = draft;
        self.subscribers.dispatch(&events);
        Ok(value)
    }

    fn seed_catalog(&mut self) -> Result<()> {
        let count = self.transact(|doc, events| {
            let seeded = crate::catalog::predefined_exercises().to_vec();
            let count = seeded.len();
            doc.data.exercises.extend(seeded);
            doc.next_ids.reconcile(&doc.data);
            events.push(StoreEvent::CatalogSeeded { count });
            Ok(count)
        })?;
        tracing::info!("Seeded {} predefined exercises", count);
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("doc", &self.doc)
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

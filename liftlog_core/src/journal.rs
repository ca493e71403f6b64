//! Append-only journal of committed store events.
//!
//! Events are appended to a JSONL (JSON Lines) file with file locking so a
//! reader never sees a half-written line.

use crate::events::StoreEvent;
use crate::Result;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One journal line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: StoreEvent,
}

/// Event sink trait for persisting store events
pub trait EventSink {
    fn append(&mut self, event: &StoreEvent) -> Result<()>;
}

/// JSONL-based event sink with file locking
#[derive(Clone, Debug)]
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl EventSink for JsonlJournal {
    fn append(&mut self, event: &StoreEvent) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let entry = JournalEntry {
            at: Utc::now(),
            event: event.clone(),
        };
        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(&entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;
        Ok(())
    }
}

/// Read all entries from a journal file, skipping lines that don't parse
pub fn read_journal(path: &Path) -> Result<Vec<JournalEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<JournalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse journal line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} journal entries", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::tests::ppl;
    use crate::store::Store;
    use crate::{ProgramId, SetId};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_append_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("journal.jsonl");

        let mut journal = JsonlJournal::new(&path);
        journal
            .append(&StoreEvent::ProgramActivated {
                program_id: ProgramId(3),
            })
            .unwrap();
        journal
            .append(&StoreEvent::SetDeleted { set_id: SetId(9) })
            .unwrap();

        let entries = read_journal(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].event,
            StoreEvent::ProgramActivated {
                program_id: ProgramId(3)
            }
        );
    }

    #[test]
    fn test_read_missing_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let entries = read_journal(&temp_dir.path().join("nope.jsonl")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_corrupt_lines_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("journal.jsonl");

        let mut journal = JsonlJournal::new(&path);
        journal
            .append(&StoreEvent::SetEdited { set_id: SetId(1) })
            .unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{ not json").unwrap();
        }
        journal
            .append(&StoreEvent::SetEdited { set_id: SetId(2) })
            .unwrap();

        assert_eq!(read_journal(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_store_events_reach_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("journal.jsonl");

        let mut store = Store::in_memory().unwrap();
        let journal = Rc::new(RefCell::new(JsonlJournal::new(&path)));
        let sink = Rc::clone(&journal);
        store.subscribe(move |event| {
            sink.borrow_mut().append(event).unwrap();
        });

        let program = store.create_program(ppl()).unwrap();
        store.activate(program.id).unwrap();

        let events: Vec<_> = read_journal(&path)
            .unwrap()
            .into_iter()
            .map(|e| e.event)
            .collect();
        assert_eq!(
            events,
            vec![
                StoreEvent::ProgramCreated {
                    program_id: program.id
                },
                StoreEvent::ProgramActivated {
                    program_id: program.id
                },
            ]
        );
    }
}

//! In-memory journal with JSON Lines import and export.

use crate::{Error, Event, EventKind, Result, ScopeId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Append-only lifecycle journal.
///
/// Cloning a `Journal` yields another handle to the same log, so a scope can
/// own one handle while the caller keeps another for inspection.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    events: Arc<Mutex<Vec<Event>>>,
}

/// Summary of one scope's lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeSummary {
    pub id: ScopeId,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub acquired: usize,
    pub released: usize,
    pub failures: usize,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a journal previously written with [`Journal::save`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        let file = File::open(path)?;
        Self::read_jsonl(BufReader::new(file))
    }

    /// Append an event.
    pub fn append(&self, event: Event) {
        self.events.lock().push(event);
    }

    /// Append a new event of `kind` for `scope_id`.
    pub fn record(&self, scope_id: ScopeId, kind: EventKind) {
        self.append(Event::new(scope_id, kind));
    }

    /// Snapshot of every event, in append order.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Events for one scope, optionally filtered by [`EventKind::name`].
    pub fn load_scope(&self, scope_id: ScopeId, kind_filter: Option<&str>) -> Vec<Event> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.scope_id == scope_id)
            .filter(|e| kind_filter.is_none_or(|k| e.kind.name() == k))
            .cloned()
            .collect()
    }

    /// Summaries of every scope in the journal, most recently opened first.
    pub fn list_scopes(&self) -> Vec<ScopeSummary> {
        let events = self.events.lock();
        let mut index: HashMap<ScopeId, usize> = HashMap::new();
        let mut summaries: Vec<ScopeSummary> = Vec::new();

        for event in events.iter() {
            let slot = *index.entry(event.scope_id).or_insert_with(|| {
                summaries.push(ScopeSummary {
                    id: event.scope_id,
                    opened_at: event.timestamp,
                    closed_at: None,
                    acquired: 0,
                    released: 0,
                    failures: 0,
                });
                summaries.len() - 1
            });
            let summary = &mut summaries[slot];

            match &event.kind {
                EventKind::Acquired { .. } => summary.acquired += 1,
                EventKind::Released { .. } => summary.released += 1,
                EventKind::ScopeClosed => summary.closed_at = Some(event.timestamp),
                _ => {}
            }
            if event.kind.is_failure() {
                summary.failures += 1;
            }
        }

        summaries.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));
        summaries
    }

    /// Write every event as one JSON object per line.
    pub fn write_jsonl<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        for (i, event) in self.events.lock().iter().enumerate() {
            serde_json::to_writer(&mut writer, event)
                .map_err(|source| Error::Serialization { line: i + 1, source })?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a journal from JSON Lines. Blank lines are skipped.
    pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Self> {
        let mut events = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(&line)
                .map_err(|source| Error::Serialization { line: i + 1, source })?;
            events.push(event);
        }
        Ok(Self {
            events: Arc::new(Mutex::new(events)),
        })
    }

    /// Append this journal's events to the file at `path`, creating it if needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        self.write_jsonl(file)
    }
}

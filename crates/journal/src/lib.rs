//! Lifecycle journal for resource scopes.
//!
//! Every scope can report what happened to the resources it held: what was
//! acquired, whether the body succeeded, what was released and which release
//! failures were suppressed in favour of an earlier failure. The journal keeps
//! those records so they can be inspected after the scope has already
//! returned its error.
//!
//! # Core Concepts
//!
//! ## Journal
//!
//! The [`Journal`] is an append-only, in-memory log. Clones share the same
//! underlying events, which lets a scope own one handle while the caller keeps
//! another. Journals can be saved to and loaded from JSON Lines files.
//!
//! ## Event
//!
//! An [`Event`] ties an [`EventKind`] to the [`ScopeId`] it happened in and a
//! timestamp.
//!
//! # Example
//!
//! ```
//! use journal::{Event, EventKind, Journal, ScopeId};
//!
//! let journal = Journal::new();
//! let scope = ScopeId::new();
//!
//! journal.record(scope, EventKind::ScopeOpened);
//! journal.append(Event::acquired(scope, "config.toml"));
//! journal.append(Event::released(scope, "config.toml"));
//! journal.record(scope, EventKind::ScopeClosed);
//!
//! let summary = &journal.list_scopes()[0];
//! assert_eq!(summary.acquired, summary.released);
//! ```

mod error;
mod event;
mod store;

pub use error::{Error, Result};
pub use event::{Event, EventKind, ScopeId};
pub use store::{Journal, ScopeSummary};

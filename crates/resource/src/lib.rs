//! Scoped resource acquisition with guaranteed release.
//!
//! A [`Resource`] is anything that holds an external asset and has to give it
//! back. This crate makes sure that happens exactly once per acquired
//! resource, on every way out of a scope: normal return, early return through
//! `?`, a failed body, or a panic.
//!
//! # Overview
//!
//! - [`Resource`] — the capability: a name and a fallible `release`.
//! - [`Acquire`] — how a resource is obtained. Any
//!   `FnOnce() -> Result<R, AcquireError>` qualifies.
//! - [`Guard`] — RAII wrapper for one resource.
//! - [`Scope`] and [`with_scope`] — several resources, acquired in order and
//!   released in reverse order.
//! - [`Deferred`] — turn a closure into a resource (`defer`).
//! - [`FileHandle`] — a file that flushes and syncs on release.
//!
//! # Failures
//!
//! A scope reports one primary failure as a [`ScopeError`]:
//!
//! 1. An [`AcquireError`] aborts the scope before the body runs; resources
//!    acquired so far are released first.
//! 2. A body failure always wins; release failures are kept as suppressed.
//! 3. With no other failure, the first [`ReleaseError`] is reported and later
//!    ones are suppressed.
//!
//! Every lifecycle step can also be recorded in a [`journal::Journal`].
//!
//! # Example
//!
//! ```
//! use resource::{defer, with_scope, AcquireError, ScopeError};
//! use std::cell::RefCell;
//!
//! let order = RefCell::new(Vec::new());
//! let open = |name: &'static str| {
//!     let order = &order;
//!     move || Ok::<_, AcquireError>(defer(name, move || {
//!         order.borrow_mut().push(name);
//!         Ok(())
//!     }))
//! };
//!
//! let result: Result<(), ScopeError<std::io::Error>> =
//!     with_scope([open("a"), open("b"), open("c")], |_| Ok(()));
//!
//! assert!(result.is_ok());
//! assert_eq!(*order.borrow(), ["c", "b", "a"]);
//! ```

mod defer;
mod error;
mod file;
mod guard;
mod resource;
mod scope;

#[cfg(test)]
mod testing;

pub use defer::{Deferred, defer};
pub use error::{AcquireError, ReleaseError, ScopeError};
pub use file::FileHandle;
pub use guard::Guard;
pub use resource::{Acquire, Resource, boxed};
pub use scope::{Scope, with_scope, with_scope_journaled};

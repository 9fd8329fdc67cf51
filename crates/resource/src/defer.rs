//! Closure-backed resources.

use crate::{ReleaseError, Resource};
use std::fmt;

/// A resource whose release runs a closure.
///
/// The closure runs at most once; later releases are no-ops. On its own a
/// `Deferred` does nothing when dropped: put it in a [`Guard`](crate::Guard)
/// or a [`Scope`](crate::Scope) to get release on scope exit.
pub struct Deferred<F>
where
    F: FnOnce() -> Result<(), ReleaseError>,
{
    name: String,
    action: Option<F>,
}

/// Wrap `action` as a resource named `name`.
pub fn defer<F>(name: impl Into<String>, action: F) -> Deferred<F>
where
    F: FnOnce() -> Result<(), ReleaseError>,
{
    Deferred {
        name: name.into(),
        action: Some(action),
    }
}

impl<F> Deferred<F>
where
    F: FnOnce() -> Result<(), ReleaseError>,
{
    /// Whether the closure has already run.
    pub fn is_spent(&self) -> bool {
        self.action.is_none()
    }
}

impl<F> Resource for Deferred<F>
where
    F: FnOnce() -> Result<(), ReleaseError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        match self.action.take() {
            Some(action) => action(),
            None => Ok(()),
        }
    }
}

impl<F> fmt::Debug for Deferred<F>
where
    F: FnOnce() -> Result<(), ReleaseError>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("name", &self.name)
            .field("spent", &self.is_spent())
            .finish()
    }
}

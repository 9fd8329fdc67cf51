//! Scopes holding several resources with LIFO release.

use crate::{Acquire, AcquireError, ReleaseError, Resource, ScopeError};
use journal::{EventKind, Journal, ScopeId};
use std::fmt::Display;
use tracing::{debug, error, warn};

/// An ordered set of resources released in reverse order of acquisition.
///
/// Resources are released by [`Scope::close`], [`Scope::finish`] or
/// [`Scope::abort`], whichever runs first. A scope that is dropped without
/// being closed (early return, `?`, panic) releases everything it still
/// holds and logs release failures.
///
/// Use `Scope<Box<dyn Resource>>` together with [`boxed`](crate::boxed) to
/// hold resources of different types.
pub struct Scope<R: Resource = Box<dyn Resource>> {
    id: ScopeId,
    held: Vec<R>,
    journal: Option<Journal>,
    closed: bool,
}

impl<R: Resource> Scope<R> {
    pub fn new() -> Self {
        Self {
            id: ScopeId::new(),
            held: Vec::new(),
            journal: None,
            closed: false,
        }
    }

    /// Record this scope's lifecycle in `journal`.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        journal.record(self.id, EventKind::ScopeOpened);
        self.journal = Some(journal);
        self
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Held resources in acquisition order.
    pub fn resources(&self) -> &[R] {
        &self.held
    }

    pub fn resources_mut(&mut self) -> &mut [R] {
        &mut self.held
    }

    /// Acquire a resource and hold it until the scope ends.
    ///
    /// On failure nothing is held for `spec`; resources acquired earlier stay
    /// held. Pass the error to [`Scope::abort`] to release them and report
    /// their release failures, or just drop the scope.
    pub fn acquire<A>(&mut self, spec: A) -> Result<&mut R, AcquireError>
    where
        A: Acquire<Resource = R>,
    {
        match spec.acquire() {
            Ok(resource) => Ok(self.push(resource)),
            Err(e) => {
                debug!(scope = %self.id, error = %e, "acquisition failed");
                self.record(EventKind::AcquireFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Hold an already acquired resource.
    pub fn push(&mut self, resource: R) -> &mut R {
        debug!(scope = %self.id, resource = resource.name(), "acquired");
        self.record(EventKind::Acquired {
            resource: resource.name().to_string(),
        });
        let slot = self.held.len();
        self.held.push(resource);
        &mut self.held[slot]
    }

    /// Acquire every spec in order, run `body`, then release in reverse order.
    ///
    /// If an acquisition fails the body is skipped and the resources acquired
    /// so far are released before the error is returned.
    pub fn run<I, T, E, F>(mut self, specs: I, body: F) -> Result<T, ScopeError<E>>
    where
        I: IntoIterator,
        I::Item: Acquire<Resource = R>,
        F: FnOnce(&mut [R]) -> Result<T, E>,
        E: Display,
    {
        for spec in specs {
            let acquired = self.acquire(spec).map(|_| ());
            if let Err(e) = acquired {
                return Err(self.abort(e));
            }
        }
        let outcome = body(self.held.as_mut_slice());
        self.finish(outcome)
    }

    /// Release everything after a failed acquisition.
    ///
    /// The acquisition error stays primary; release failures are suppressed.
    pub fn abort<E>(mut self, error: AcquireError) -> ScopeError<E> {
        let suppressed = self.release_all(true);
        ScopeError::Acquire {
            source: error,
            suppressed,
        }
    }

    /// Release everything and combine the body's outcome with release failures.
    ///
    /// A body failure is always the reported failure. Otherwise the first
    /// release failure is reported and later ones are suppressed.
    pub fn finish<T, E: Display>(mut self, outcome: Result<T, E>) -> Result<T, ScopeError<E>> {
        match outcome {
            Ok(value) => {
                self.record(EventKind::BodyCompleted);
                let failures = self.release_all(false);
                primary_release_failure(failures).map(|()| value)
            }
            Err(e) => {
                debug!(scope = %self.id, error = %e, "body failed");
                self.record(EventKind::BodyFailed {
                    error: e.to_string(),
                });
                let suppressed = self.release_all(true);
                Err(ScopeError::Body {
                    source: e,
                    suppressed,
                })
            }
        }
    }

    /// Release everything held and report the first release failure.
    pub fn close(mut self) -> Result<(), ScopeError> {
        let failures = self.release_all(false);
        primary_release_failure(failures)
    }

    fn release_all(&mut self, mut in_flight: bool) -> Vec<ReleaseError> {
        let mut failures = Vec::new();
        while let Some(mut resource) = self.held.pop() {
            let name = resource.name().to_string();
            match resource.release() {
                Ok(()) => {
                    debug!(scope = %self.id, resource = %name, "released");
                    self.record(EventKind::Released { resource: name });
                }
                Err(e) => {
                    if in_flight {
                        warn!(scope = %self.id, resource = %name, error = %e, "release failed; suppressed");
                    } else {
                        warn!(scope = %self.id, resource = %name, error = %e, "release failed");
                    }
                    self.record(EventKind::ReleaseFailed {
                        resource: name,
                        error: e.to_string(),
                        suppressed: in_flight,
                    });
                    failures.push(e);
                    in_flight = true;
                }
            }
        }
        if !self.closed {
            self.closed = true;
            self.record(EventKind::ScopeClosed);
        }
        failures
    }

    fn record(&self, kind: EventKind) {
        if let Some(journal) = &self.journal {
            journal.record(self.id, kind);
        }
    }
}

fn primary_release_failure<E>(mut failures: Vec<ReleaseError>) -> Result<(), ScopeError<E>> {
    if failures.is_empty() {
        return Ok(());
    }
    let source = failures.remove(0);
    Err(ScopeError::Release {
        source,
        suppressed: failures,
    })
}

impl<R: Resource> Default for Scope<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> Drop for Scope<R> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        for failure in self.release_all(std::thread::panicking()) {
            error!(scope = %self.id, error = %failure, "release failed while dropping scope");
        }
    }
}

/// Acquire `specs` in order, run `body` with them, and release in reverse order.
///
/// ```
/// use resource::{FileHandle, with_scope};
/// use std::io::Read;
///
/// let result = with_scope([|| FileHandle::open("Cargo.toml")], |files: &mut [FileHandle]| {
///     let mut contents = String::new();
///     files[0].read_to_string(&mut contents)?;
///     Ok::<_, std::io::Error>(contents.len())
/// });
/// assert!(result.is_ok());
/// ```
pub fn with_scope<I, T, E, F>(specs: I, body: F) -> Result<T, ScopeError<E>>
where
    I: IntoIterator,
    I::Item: Acquire,
    F: FnOnce(&mut [<I::Item as Acquire>::Resource]) -> Result<T, E>,
    E: Display,
{
    Scope::<<I::Item as Acquire>::Resource>::new().run(specs, body)
}

/// [`with_scope`], recording the scope's lifecycle in `journal`.
pub fn with_scope_journaled<I, T, E, F>(
    journal: &Journal,
    specs: I,
    body: F,
) -> Result<T, ScopeError<E>>
where
    I: IntoIterator,
    I::Item: Acquire,
    F: FnOnce(&mut [<I::Item as Acquire>::Resource]) -> Result<T, E>,
    E: Display,
{
    Scope::<<I::Item as Acquire>::Resource>::new()
        .with_journal(journal.clone())
        .run(specs, body)
}

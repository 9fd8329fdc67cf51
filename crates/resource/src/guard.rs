//! RAII guard for a single resource.

use crate::{Acquire, AcquireError, ReleaseError, Resource};
use std::ops::{Deref, DerefMut};
use tracing::{debug, error};

/// Releases the wrapped resource when dropped.
///
/// Use [`Guard::close`] to release explicitly and observe the result. A guard
/// that is dropped while still armed releases the resource itself and logs
/// any failure, since `Drop` has nowhere to return it.
#[derive(Debug)]
pub struct Guard<R: Resource> {
    resource: R,
    armed: bool,
}

impl<R: Resource> Guard<R> {
    /// Take ownership of an already acquired resource.
    pub fn new(resource: R) -> Self {
        debug!(resource = resource.name(), "guarding resource");
        Self {
            resource,
            armed: true,
        }
    }

    /// Acquire a resource and guard it.
    pub fn acquire<A: Acquire<Resource = R>>(spec: A) -> Result<Self, AcquireError> {
        spec.acquire().map(Self::new)
    }

    /// Release now and report the outcome.
    pub fn close(mut self) -> Result<(), ReleaseError> {
        self.armed = false;
        self.resource.release()
    }

    /// Keep the resource alive past the guard; it will not be released on drop.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl<R: Resource> Deref for Guard<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.resource
    }
}

impl<R: Resource> DerefMut for Guard<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.resource
    }
}

impl<R: Resource> Drop for Guard<R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        match self.resource.release() {
            Ok(()) => debug!(resource = self.resource.name(), "released on drop"),
            Err(e) => error!(resource = self.resource.name(), error = %e, "release failed on drop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Probe, ReleaseLog, probe};

    #[test]
    fn test_drop_releases_once() {
        let log = ReleaseLog::default();
        {
            let _guard = Guard::new(Probe::new("a", &log));
        }
        assert_eq!(log.entries(), vec!["a"]);
    }

    #[test]
    fn test_close_reports_failure_and_skips_drop() {
        let log = ReleaseLog::default();
        let guard = Guard::new(Probe::failing("a", &log));

        let err = guard.close().unwrap_err();

        assert_eq!(err.resource(), "a");
        assert_eq!(log.entries(), vec!["a"]);
    }

    #[test]
    fn test_disarm_keeps_resource() {
        let log = ReleaseLog::default();
        {
            let mut guard = Guard::new(Probe::new("a", &log));
            guard.disarm();
            assert!(!guard.is_armed());
        }
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_release_on_early_return() {
        fn work(log: &ReleaseLog) -> Result<(), AcquireError> {
            let guard = Guard::acquire(probe("early", log))?;
            if guard.name() == "early" {
                return Err(AcquireError::failed("next", "not needed"));
            }
            Ok(())
        }

        let log = ReleaseLog::default();
        assert!(work(&log).is_err());
        assert_eq!(log.entries(), vec!["early"]);
    }

    #[test]
    fn test_release_on_panic() {
        let log = ReleaseLog::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = Guard::new(Probe::new("a", &log));
            panic!("body panicked");
        }));
        assert!(result.is_err());
        assert_eq!(log.entries(), vec!["a"]);
    }
}

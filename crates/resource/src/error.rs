//! Resource lifecycle error types.

use std::convert::Infallible;
use std::io;
use thiserror::Error;

/// A resource could not be obtained.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AcquireError {
    /// The target of the acquisition does not exist.
    #[error("{target} not found")]
    NotFound { target: String },

    /// The underlying I/O operation failed.
    #[error("failed to acquire {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Acquisition was refused for a reason other than I/O.
    #[error("failed to acquire {target}: {reason}")]
    Failed { target: String, reason: String },
}

impl AcquireError {
    /// Classify an I/O error raised while acquiring `target`.
    pub fn from_io(target: impl Into<String>, source: io::Error) -> Self {
        let target = target.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { target }
        } else {
            Self::Io { target, source }
        }
    }

    pub fn failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Name of the resource that could not be acquired.
    pub fn target(&self) -> &str {
        match self {
            Self::NotFound { target } | Self::Io { target, .. } | Self::Failed { target, .. } => {
                target
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Releasing a resource failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReleaseError {
    /// The underlying I/O operation failed, e.g. flushing buffered writes.
    #[error("failed to release {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: io::Error,
    },

    /// The resource reported a failure of its own.
    #[error("failed to release {resource}: {reason}")]
    Failed { resource: String, reason: String },
}

impl ReleaseError {
    pub fn io(resource: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            resource: resource.into(),
            source,
        }
    }

    pub fn failed(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Name of the resource whose release failed.
    pub fn resource(&self) -> &str {
        match self {
            Self::Io { resource, .. } | Self::Failed { resource, .. } => resource,
        }
    }
}

/// Failure reported by a scope.
///
/// Exactly one failure is primary. Release failures that happened while the
/// primary failure was already in flight are kept in `suppressed`, in the
/// order the releases ran.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScopeError<E = Infallible> {
    /// An acquisition failed, so the body never ran.
    #[error("scope aborted: {source}")]
    Acquire {
        #[source]
        source: AcquireError,
        suppressed: Vec<ReleaseError>,
    },

    /// The body failed. Its error always wins over release failures.
    #[error("scope body failed: {source}")]
    Body {
        #[source]
        source: E,
        suppressed: Vec<ReleaseError>,
    },

    /// The body succeeded but releasing a resource failed.
    #[error("{source}")]
    Release {
        #[source]
        source: ReleaseError,
        suppressed: Vec<ReleaseError>,
    },
}

impl<E> ScopeError<E> {
    /// Release failures recorded alongside the primary failure.
    pub fn suppressed(&self) -> &[ReleaseError] {
        match self {
            Self::Acquire { suppressed, .. }
            | Self::Body { suppressed, .. }
            | Self::Release { suppressed, .. } => suppressed,
        }
    }

    pub fn is_acquire(&self) -> bool {
        matches!(self, Self::Acquire { .. })
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Self::Body { .. })
    }

    pub fn is_release(&self) -> bool {
        matches!(self, Self::Release { .. })
    }

    /// The body's own error, if the body is what failed.
    pub fn into_body(self) -> Option<E> {
        match self {
            Self::Body { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Convert the body error type, leaving lifecycle failures untouched.
    pub fn map_body<F>(self, f: impl FnOnce(E) -> F) -> ScopeError<F> {
        match self {
            Self::Acquire { source, suppressed } => ScopeError::Acquire { source, suppressed },
            Self::Body { source, suppressed } => ScopeError::Body {
                source: f(source),
                suppressed,
            },
            Self::Release { source, suppressed } => ScopeError::Release { source, suppressed },
        }
    }
}

impl ScopeError<Infallible> {
    /// Widen a body-less scope failure to any body error type.
    pub fn widen<E>(self) -> ScopeError<E> {
        self.map_body(|never| match never {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classifies_not_found() {
        let err = AcquireError::from_io("a.txt", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_not_found());
        assert_eq!(err.target(), "a.txt");

        let err = AcquireError::from_io("b.txt", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, AcquireError::Io { .. }));
    }

    #[test]
    fn test_map_body_keeps_suppressed() {
        let err: ScopeError<&str> = ScopeError::Body {
            source: "boom",
            suppressed: vec![ReleaseError::failed("a", "stuck")],
        };
        let mapped = err.map_body(|s| s.len());
        assert_eq!(mapped.suppressed().len(), 1);
        assert_eq!(mapped.into_body(), Some(4));
    }

    #[test]
    fn test_display() {
        let err: ScopeError = ScopeError::Release {
            source: ReleaseError::failed("db", "busy"),
            suppressed: vec![],
        };
        assert_eq!(err.to_string(), "failed to release db: busy");
    }
}

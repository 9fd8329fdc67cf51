//! Event types for the lifecycle journal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub Uuid);

impl ScopeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened inside a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// The scope was entered.
    ScopeOpened,
    /// A resource was acquired and is now held by the scope.
    Acquired { resource: String },
    /// An acquisition failed; the body will not run.
    AcquireFailed { error: String },
    /// The body returned successfully.
    BodyCompleted,
    /// The body returned a failure.
    BodyFailed { error: String },
    /// A resource was released.
    Released { resource: String },
    /// A release failed.
    ///
    /// `suppressed` is set when another failure was already reported for
    /// the scope, so this one was recorded instead of returned.
    ReleaseFailed {
        resource: String,
        error: String,
        suppressed: bool,
    },
    /// Every held resource has been released.
    ScopeClosed,
}

impl EventKind {
    /// Short, stable name used for filtering.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ScopeOpened => "scope_opened",
            EventKind::Acquired { .. } => "acquired",
            EventKind::AcquireFailed { .. } => "acquire_failed",
            EventKind::BodyCompleted => "body_completed",
            EventKind::BodyFailed { .. } => "body_failed",
            EventKind::Released { .. } => "released",
            EventKind::ReleaseFailed { .. } => "release_failed",
            EventKind::ScopeClosed => "scope_closed",
        }
    }

    /// Whether this event records a failure of any kind.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EventKind::AcquireFailed { .. }
                | EventKind::BodyFailed { .. }
                | EventKind::ReleaseFailed { .. }
        )
    }
}

/// An entry in the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub scope_id: ScopeId,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

impl Event {
    pub fn new(scope_id: ScopeId, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope_id,
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn acquired(scope_id: ScopeId, resource: impl Into<String>) -> Self {
        Self::new(
            scope_id,
            EventKind::Acquired {
                resource: resource.into(),
            },
        )
    }

    pub fn released(scope_id: ScopeId, resource: impl Into<String>) -> Self {
        Self::new(
            scope_id,
            EventKind::Released {
                resource: resource.into(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_with_tag() {
        let kind = EventKind::ReleaseFailed {
            resource: "db".into(),
            error: "broken pipe".into(),
            suppressed: true,
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["kind"], "release_failed");
        assert_eq!(json["suppressed"], true);
    }

    #[test]
    fn test_failure_kinds() {
        assert!(EventKind::BodyFailed { error: "x".into() }.is_failure());
        assert!(!EventKind::ScopeClosed.is_failure());
        assert!(!EventKind::Released { resource: "a".into() }.is_failure());
    }
}

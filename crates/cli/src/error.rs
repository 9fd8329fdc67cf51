//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

/// CLI errors.
///
/// Demo outcomes are never errors; these cover the CLI itself.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A journal command was run without a journal file.
    #[error("no journal configured. Pass --journal FILE or set demo.journal in scoped.toml")]
    JournalNotConfigured,

    /// No scope was found matching the given prefix.
    #[error("no scope found matching '{prefix}'")]
    ScopeNotFound { prefix: String },

    /// Multiple scopes match the given prefix.
    ///
    /// The user should provide a longer prefix to disambiguate.
    #[error("multiple scopes match '{prefix}': {matches:?}")]
    AmbiguousScope {
        prefix: String,
        matches: Vec<String>,
    },

    /// Configuration is invalid or unreadable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the journal layer.
    #[error(transparent)]
    Journal(#[from] journal::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

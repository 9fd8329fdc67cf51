use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error at line {line}: {source}")]
    Serialization {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

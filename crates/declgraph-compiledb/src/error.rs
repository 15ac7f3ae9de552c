use declgraph_core::DeclGraphError;
use thiserror::Error;

/// Loader failures reported to the caller. The caller decides whether to
/// retry, skip, or abort the run; nothing here is fatal.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("no compilation database found at {path}: {source}")]
    NotFound {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Arena(#[from] DeclGraphError),
}

pub type Result<T> = std::result::Result<T, DbError>;

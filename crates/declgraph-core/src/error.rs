use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeclGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("address space reservation of {requested} bytes failed: {source}")]
    Reservation {
        requested: usize,
        source: std::io::Error,
    },

    #[error("invalid arena options: {0}")]
    InvalidOptions(String),
}

pub type Result<T> = std::result::Result<T, DeclGraphError>;

use thiserror::Error;

/// Errors raised by the LMDB database layer
#[derive(Error, Debug)]
pub enum DBError {
    #[error("Database is closed")]
    DbClosed,

    #[error("Path error: {0}")]
    PathError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Key error: {0}")]
    KeyError(String),

    #[error("Value error: {0}")]
    ValueError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Environment error: {0}")]
    EnvError(#[from] heed::Error),
}

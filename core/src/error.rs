use std::path::PathBuf;
use std::sync::PoisonError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("Invalid distance type: {0}")]
    InvalidDistanceType(String),

    #[error("Collection not found: {0}")]
    NotFound(String),

    #[error("Collection already exists: {0}")]
    AlreadyExists(String),
}

/// Log failures keep only the message so engine errors stay comparable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalError {
    #[error("Write error: {0}")]
    WriteError(String),

    #[error("Read error: {0}")]
    ReadError(String),
}

impl From<std::io::Error> for WalError {
    fn from(err: std::io::Error) -> Self {
        WalError::WriteError(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for WalError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        WalError::WriteError(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Database is locked by another process: {}", .0.display())]
    Locked(PathBuf),

    #[error("Database handle was invalidated: {}", .0.display())]
    Invalidated(PathBuf),

    #[error("Database handle for {} used from a thread that did not open it", .0.display())]
    WrongThread(PathBuf),

    #[error("Poison error: {0}")]
    PoisonError(String),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error("Database error from wal: {0}")]
    Wal(#[from] WalError),
}

impl<T> From<PoisonError<T>> for DatabaseError {
    fn from(err: PoisonError<T>) -> Self {
        DatabaseError::PoisonError(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("Invalid test identity {0:?}: nothing usable as a directory name")]
    InvalidIdentity(String),

    #[error("Sandbox io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Mismatch reported by the sandbox assertion helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionFailure {
    #[error("Expected a panic but the operation returned normally")]
    NoPanic,

    #[error("Expected a panic containing {expected:?}, got {actual:?}")]
    WrongPanic { expected: String, actual: String },

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),

    #[error("Expected an error but the operation succeeded with {0}")]
    UnexpectedSuccess(String),

    #[error("Expected error {expected}, got {actual}")]
    WrongError { expected: String, actual: String },

    #[error("Expected no value, got {0}")]
    NotNil(String),
}

/// Every failure collected while running and finalizing one test.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("test {identity} failed: {}", .failures.join("; "))]
pub struct TestFailure {
    pub identity: String,
    pub failures: Vec<String>,
}

//! Error types
//!
//! Defines the error taxonomy shared by the storage layer, the collision
//! resolver and the entry lifecycle.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::access::{AccessMode, OpenMode};

/// Storage provider errors
#[derive(Debug)]
pub enum StorageError {
    NotFound(PathBuf),
    AlreadyExists(PathBuf),
    PermissionDenied(PathBuf),
    NotADirectory(PathBuf),
    NotAFile(PathBuf),
    InvalidPath(String),
    Unsupported(String),
    IoError(io::Error),
}

impl StorageError {
    /// Map an I/O error raised while touching `path` onto a storage error.
    pub fn from_io(error: io::Error, path: impl Into<PathBuf>) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(path.into()),
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.into()),
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(path.into()),
            _ => StorageError::IoError(error),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(p) => write!(f, "Path not found: {}", p.display()),
            StorageError::AlreadyExists(p) => write!(f, "Path already exists: {}", p.display()),
            StorageError::PermissionDenied(p) => write!(f, "Permission denied: {}", p.display()),
            StorageError::NotADirectory(p) => write!(f, "Not a directory: {}", p.display()),
            StorageError::NotAFile(p) => write!(f, "Not a file: {}", p.display()),
            StorageError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            StorageError::Unsupported(op) => write!(f, "Unsupported operation: {}", op),
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

/// Collision outcomes that are reported back to the caller as ordinary failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionError {
    /// The destination is occupied and the policy was `FailIfExists`.
    Occupied(PathBuf),
    /// Unique-name generation ran out of attempts.
    Exhausted { path: PathBuf, max_attempts: usize },
}

impl fmt::Display for CollisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionError::Occupied(p) => write!(f, "Destination exists: {}", p.display()),
            CollisionError::Exhausted { path, max_attempts } => write!(
                f,
                "No free name for {} after {} attempts",
                path.display(),
                max_attempts
            ),
        }
    }
}

impl std::error::Error for CollisionError {}

/// Entry operation errors
#[derive(Debug)]
pub enum EntryError {
    /// Empty or whitespace-only name/path; nothing was touched.
    Validation(String),
    /// The access/open pair is not allowed; no stream was requested.
    InvalidModeCombination { access: AccessMode, open: OpenMode },
    Collision(CollisionError),
    /// Destination exists under `ThrowIfExists`.
    CollisionFatal(PathBuf),
    /// Operation not permitted in the handle's current state.
    InvalidState(String),
    Storage(StorageError),
    /// The cancellation token fired before the work was scheduled.
    Cancelled,
    /// A scheduled blocking task panicked or was aborted.
    TaskFailed(String),
}

impl EntryError {
    /// Whether this error should abort the caller instead of being branched on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EntryError::CollisionFatal(_) | EntryError::Storage(_) | EntryError::TaskFailed(_)
        )
    }

    /// Whether this is an ordinary collision failure.
    pub fn is_collision(&self) -> bool {
        matches!(self, EntryError::Collision(_))
    }
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryError::Validation(msg) => write!(f, "Validation error: {}", msg),
            EntryError::InvalidModeCombination { access, open } => write!(
                f,
                "Invalid mode combination: access {:?} with open mode {:?}",
                access, open
            ),
            EntryError::Collision(e) => write!(f, "Collision: {}", e),
            EntryError::CollisionFatal(p) => {
                write!(f, "Destination exists (strict): {}", p.display())
            }
            EntryError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            EntryError::Storage(e) => write!(f, "Storage error: {}", e),
            EntryError::Cancelled => write!(f, "Operation cancelled before scheduling"),
            EntryError::TaskFailed(msg) => write!(f, "Blocking task failed: {}", msg),
        }
    }
}

impl std::error::Error for EntryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EntryError::Collision(e) => Some(e),
            EntryError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for EntryError {
    fn from(error: StorageError) -> Self {
        EntryError::Storage(error)
    }
}

impl From<CollisionError> for EntryError {
    fn from(error: CollisionError) -> Self {
        EntryError::Collision(error)
    }
}

impl From<io::Error> for EntryError {
    fn from(error: io::Error) -> Self {
        EntryError::Storage(StorageError::IoError(error))
    }
}

/// Result alias used across the entry API
pub type EntryResult<T> = Result<T, EntryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(EntryError::CollisionFatal(PathBuf::from("a")).is_fatal());
        assert!(EntryError::Storage(StorageError::NotFound(PathBuf::from("a"))).is_fatal());
        assert!(!EntryError::Validation("empty".into()).is_fatal());
        assert!(!EntryError::InvalidState("open".into()).is_fatal());
        assert!(!EntryError::Collision(CollisionError::Occupied(PathBuf::from("a"))).is_fatal());
        assert!(!EntryError::Cancelled.is_fatal());
    }

    #[test]
    fn test_io_kind_mapping() {
        let err = StorageError::from_io(io::Error::from(io::ErrorKind::NotFound), "x.txt");
        assert!(matches!(err, StorageError::NotFound(p) if p == PathBuf::from("x.txt")));

        let err = StorageError::from_io(io::Error::from(io::ErrorKind::AlreadyExists), "x.txt");
        assert!(matches!(err, StorageError::AlreadyExists(_)));

        let err = StorageError::from_io(io::Error::other("disk full"), "x.txt");
        assert!(matches!(err, StorageError::IoError(_)));
    }

    #[test]
    fn test_display_messages() {
        let err = EntryError::Collision(CollisionError::Exhausted {
            path: PathBuf::from("a.txt"),
            max_attempts: 10,
        });
        assert_eq!(
            err.to_string(),
            "Collision: No free name for a.txt after 10 attempts"
        );
    }
}

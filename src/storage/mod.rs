//! Storage providers
//!
//! The host-facing collaborator behind every entry handle. Entries only ever
//! ask a provider for existence checks, create/delete/move/copy, listings,
//! timestamps and byte streams.

pub mod filesystem;
pub mod memory;

use std::fmt;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::access::{AccessMode, OpenMode};
use crate::error::StorageError;

pub use filesystem::NativeStorage;
pub use memory::MemoryStorage;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// What, if anything, occupies a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistenceResult {
    None,
    FileExists,
    FolderExists,
    FileAndFolderExists,
}

impl ExistenceResult {
    pub fn from_flags(is_file: bool, is_dir: bool) -> Self {
        match (is_file, is_dir) {
            (false, false) => ExistenceResult::None,
            (true, false) => ExistenceResult::FileExists,
            (false, true) => ExistenceResult::FolderExists,
            (true, true) => ExistenceResult::FileAndFolderExists,
        }
    }

    pub fn is_none(self) -> bool {
        self == ExistenceResult::None
    }

    pub fn has_file(self) -> bool {
        matches!(
            self,
            ExistenceResult::FileExists | ExistenceResult::FileAndFolderExists
        )
    }

    pub fn has_folder(self) -> bool {
        matches!(
            self,
            ExistenceResult::FolderExists | ExistenceResult::FileAndFolderExists
        )
    }
}

/// Which timestamp of an entry to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKind {
    Created,
    Accessed,
    Modified,
}

/// Byte stream handed out by a provider.
pub trait EntryStream: Read + Write + Seek + Send + fmt::Debug {}

impl<T: Read + Write + Seek + Send + fmt::Debug> EntryStream for T {}

/// Platform I/O behind entry handles.
///
/// `delete_directory` removes the directory together with its contents.
/// `move_entry` relocates files and directories alike. The native provider
/// falls back to copy-then-delete for files moved across devices; directories
/// cannot cross devices and fail with the underlying I/O error.
pub trait StorageProvider: Send + Sync + fmt::Debug {
    fn exists(&self, path: &Path) -> ExistenceResult;

    fn create_file(&self, path: &Path) -> StorageResult<()>;
    fn create_directory(&self, path: &Path) -> StorageResult<()>;
    fn delete_file(&self, path: &Path) -> StorageResult<()>;
    fn delete_directory(&self, path: &Path) -> StorageResult<()>;

    fn move_entry(&self, src: &Path, dst: &Path) -> StorageResult<()>;
    fn copy_file(&self, src: &Path, dst: &Path, overwrite: bool) -> StorageResult<()>;

    fn open_stream(
        &self,
        path: &Path,
        open: OpenMode,
        access: AccessMode,
    ) -> StorageResult<Box<dyn EntryStream>>;

    fn list_files(&self, path: &Path) -> StorageResult<Vec<PathBuf>>;
    fn list_directories(&self, path: &Path) -> StorageResult<Vec<PathBuf>>;

    fn timestamp(&self, path: &Path, kind: TimestampKind) -> StorageResult<SystemTime>;
}

/// Provider shared between handles
pub type SharedStorage = Arc<dyn StorageProvider>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existence_flags() {
        assert_eq!(ExistenceResult::from_flags(false, false), ExistenceResult::None);
        assert_eq!(
            ExistenceResult::from_flags(true, true),
            ExistenceResult::FileAndFolderExists
        );
        assert!(ExistenceResult::FileAndFolderExists.has_file());
        assert!(ExistenceResult::FileAndFolderExists.has_folder());
        assert!(!ExistenceResult::FolderExists.has_file());
        assert!(ExistenceResult::None.is_none());
    }
}

//! Volume
//!
//! Root of a storage tree. Hands out file and directory handles and creates
//! entries under a collision policy.

use log::info;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::bridge;
use crate::collision::CollisionPolicy;
use crate::entry::directory::{DirectoryEntry, create_directory_at};
use crate::entry::file::{FileEntry, create_file_at};
use crate::entry::EntryContext;
use crate::error::EntryResult;
use crate::naming::UniqueNaming;
use crate::storage::{ExistenceResult, SharedStorage};
use crate::utils::validation::{validate_path, validate_target};

/// Entry point for working with one storage provider.
///
/// # Example
/// ```
/// use std::path::Path;
/// use std::sync::Arc;
/// use rax_fs::collision::CollisionPolicy;
/// use rax_fs::entry::Volume;
/// use rax_fs::naming::UniqueNaming;
/// use rax_fs::storage::MemoryStorage;
///
/// let volume = Volume::new(Arc::new(MemoryStorage::new()), UniqueNaming::default());
/// volume.create_file(Path::new("/a.txt"), CollisionPolicy::FailIfExists).unwrap();
/// let copy = volume
///     .create_file(Path::new("/a.txt"), CollisionPolicy::GenerateUniqueName)
///     .unwrap();
/// assert_eq!(copy.path(), Path::new("/a-0.txt"));
/// ```
#[derive(Debug, Clone)]
pub struct Volume {
    ctx: EntryContext,
}

impl Volume {
    pub fn new(storage: SharedStorage, naming: UniqueNaming) -> Self {
        info!(
            "Volume ready (naming={:?}, max_attempts={})",
            naming.strategy, naming.max_attempts
        );
        Self {
            ctx: EntryContext::new(storage, naming),
        }
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.ctx.storage
    }

    pub fn naming(&self) -> &UniqueNaming {
        &self.ctx.naming
    }

    /// Handle to a file; no I/O.
    pub fn file(&self, path: &Path) -> EntryResult<FileEntry> {
        let path = validate_target(path)?;
        Ok(FileEntry::at(self.ctx.clone(), path.to_path_buf()))
    }

    /// Handle to a directory; no I/O.
    pub fn directory(&self, path: &Path) -> EntryResult<DirectoryEntry> {
        let path = validate_path(path)?;
        Ok(DirectoryEntry::at(self.ctx.clone(), path.to_path_buf()))
    }

    pub fn exists(&self, path: &Path) -> ExistenceResult {
        self.ctx.storage.exists(path)
    }

    pub fn create_file(&self, path: &Path, policy: CollisionPolicy) -> EntryResult<FileEntry> {
        create_file_at(&self.ctx, path, policy)
    }

    pub fn create_directory(&self, path: &Path, policy: CollisionPolicy) -> EntryResult<DirectoryEntry> {
        create_directory_at(&self.ctx, path, policy)
    }

    pub async fn create_file_async(
        &self,
        path: PathBuf,
        policy: CollisionPolicy,
        cancel: &CancellationToken,
    ) -> EntryResult<FileEntry> {
        let ctx = self.ctx.clone();
        bridge::run_blocking(cancel, move || create_file_at(&ctx, &path, policy)).await
    }

    pub async fn create_directory_async(
        &self,
        path: PathBuf,
        policy: CollisionPolicy,
        cancel: &CancellationToken,
    ) -> EntryResult<DirectoryEntry> {
        let ctx = self.ctx.clone();
        bridge::run_blocking(cancel, move || create_directory_at(&ctx, &path, policy)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntryError;
    use crate::naming::NamingStrategy;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn volume(storage: &MemoryStorage) -> Volume {
        Volume::new(Arc::new(storage.clone()), UniqueNaming::default())
    }

    #[test]
    fn test_handles_do_no_io() {
        let storage = MemoryStorage::new();
        let volume = volume(&storage);
        let file = volume.file(Path::new("/x/y.txt")).unwrap();
        assert!(!file.exists());
        assert!(volume.directory(Path::new("/x")).is_ok());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_file_handle_needs_a_name() {
        let storage = MemoryStorage::new();
        let volume = volume(&storage);
        assert!(matches!(volume.file(Path::new("/")), Err(EntryError::Validation(_))));
        assert!(volume.directory(Path::new("/")).is_ok());
        assert!(matches!(
            volume.create_directory(Path::new("/"), CollisionPolicy::GenerateUniqueName),
            Err(EntryError::Validation(_))
        ));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_exhaustion_surfaces_as_collision() {
        let storage = MemoryStorage::with_files(
            ["/a.txt", "/a-0.txt", "/a-1.txt"].map(|p| (p, Vec::new())),
        );
        let volume = Volume::new(
            Arc::new(storage.clone()),
            UniqueNaming::new(NamingStrategy::Integer, 2),
        );
        let err = volume
            .create_file(Path::new("/a.txt"), CollisionPolicy::GenerateUniqueName)
            .unwrap_err();
        assert!(err.is_collision());
        assert_eq!(storage.len(), 3);
    }

    #[tokio::test]
    async fn test_async_create() {
        let storage = MemoryStorage::new();
        let volume = volume(&storage);
        let cancel = CancellationToken::new();

        let dir = volume
            .create_directory_async(PathBuf::from("/d"), CollisionPolicy::FailIfExists, &cancel)
            .await
            .unwrap();
        assert!(dir.exists());

        let file = volume
            .create_file_async(PathBuf::from("/d/a.txt"), CollisionPolicy::FailIfExists, &cancel)
            .await
            .unwrap();
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_async_create_cancelled_before_start() {
        let storage = MemoryStorage::new();
        let volume = volume(&storage);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = volume
            .create_file_async(PathBuf::from("/a.txt"), CollisionPolicy::FailIfExists, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, EntryError::Cancelled));
        assert!(storage.is_empty());
    }
}

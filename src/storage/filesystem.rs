//! Native file system provider
//!
//! Forwards storage calls to `std::fs`.

use log::{debug, error, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

use crate::access::{AccessMode, OpenMode};
use crate::error::StorageError;
use crate::storage::{EntryStream, ExistenceResult, StorageProvider, StorageResult, TimestampKind};

/// Attempts made for deletes that fail with `PermissionDenied`.
const DELETE_RETRIES: u64 = 3;

/// Host file system provider.
#[derive(Debug, Clone, Default)]
pub struct NativeStorage;

impl NativeStorage {
    pub fn new() -> Self {
        Self
    }
}

/// Run a delete, retrying transient permission failures with a short backoff.
fn delete_with_retries<F>(path: &Path, mut delete: F) -> StorageResult<()>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    for attempt in 1..=DELETE_RETRIES {
        match delete(path) {
            Ok(()) => return Ok(()),
            Err(e) if attempt < DELETE_RETRIES && e.kind() == ErrorKind::PermissionDenied => {
                warn!(
                    "Delete of {} denied (attempt {}/{}), retrying",
                    path.display(),
                    attempt,
                    DELETE_RETRIES
                );
                thread::sleep(Duration::from_millis(100 * attempt));
            }
            Err(e) => {
                error!("Failed to delete {}: {}", path.display(), e);
                return Err(StorageError::from_io(e, path));
            }
        }
    }
    Err(StorageError::PermissionDenied(path.to_path_buf()))
}

/// Bring a file into existence for a read-only open of a creating mode.
/// Move a file by copying it and removing the source. A source that cannot
/// be removed leaves the destination cleaned up.
fn copy_then_remove(src: &Path, dst: &Path) -> StorageResult<()> {
    fs::copy(src, dst).map_err(|e| StorageError::from_io(e, src))?;
    if let Err(e) = fs::remove_file(src) {
        error!("Failed to remove {} after copying it: {}", src.display(), e);
        if let Err(cleanup) = fs::remove_file(dst) {
            warn!("Failed to remove partial move target {}: {}", dst.display(), cleanup);
        }
        return Err(StorageError::from_io(e, src));
    }
    Ok(())
}

fn prepare_read_only(path: &Path, open: OpenMode) -> io::Result<()> {
    match open {
        OpenMode::Create => File::create(path).map(drop),
        OpenMode::CreateNew => OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(drop),
        OpenMode::OpenOrCreate => match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e),
        },
        _ => Ok(()),
    }
}

fn list_children<F>(path: &Path, keep: F) -> StorageResult<Vec<PathBuf>>
where
    F: Fn(&fs::FileType) -> bool,
{
    let entries = fs::read_dir(path).map_err(|e| StorageError::from_io(e, path))?;
    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::from_io(e, path))?;
        let file_type = entry.file_type().map_err(|e| StorageError::from_io(e, entry.path()))?;
        if keep(&file_type) {
            children.push(entry.path());
        }
    }
    children.sort();
    Ok(children)
}

impl StorageProvider for NativeStorage {
    fn exists(&self, path: &Path) -> ExistenceResult {
        match fs::metadata(path) {
            Ok(meta) => ExistenceResult::from_flags(meta.is_file(), meta.is_dir()),
            Err(_) => ExistenceResult::None,
        }
    }

    fn create_file(&self, path: &Path) -> StorageResult<()> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(drop)
            .map_err(|e| StorageError::from_io(e, path))
    }

    fn create_directory(&self, path: &Path) -> StorageResult<()> {
        fs::create_dir_all(path).map_err(|e| StorageError::from_io(e, path))
    }

    fn delete_file(&self, path: &Path) -> StorageResult<()> {
        delete_with_retries(path, |p| fs::remove_file(p))
    }

    fn delete_directory(&self, path: &Path) -> StorageResult<()> {
        delete_with_retries(path, |p| fs::remove_dir_all(p))
    }

    fn move_entry(&self, src: &Path, dst: &Path) -> StorageResult<()> {
        match fs::rename(src, dst) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::CrossesDevices && src.is_file() => {
                debug!("Rename crosses devices, copying {} -> {}", src.display(), dst.display());
                copy_then_remove(src, dst)
            }
            Err(e) => Err(StorageError::from_io(e, src)),
        }
    }

    fn copy_file(&self, src: &Path, dst: &Path, overwrite: bool) -> StorageResult<()> {
        if !overwrite && dst.exists() {
            return Err(StorageError::AlreadyExists(dst.to_path_buf()));
        }
        let bytes = fs::copy(src, dst).map_err(|e| StorageError::from_io(e, src))?;
        debug!("Copied {} -> {} ({} bytes)", src.display(), dst.display(), bytes);
        Ok(())
    }

    fn open_stream(
        &self,
        path: &Path,
        open: OpenMode,
        access: AccessMode,
    ) -> StorageResult<Box<dyn EntryStream>> {
        if access == AccessMode::None || open == OpenMode::None {
            return Err(StorageError::Unsupported(format!(
                "open {:?} with access {:?}",
                open, access
            )));
        }

        let mut options = OpenOptions::new();
        options.read(access.can_read()).write(access.can_write());

        if access.can_write() {
            match open {
                OpenMode::Create => {
                    options.create(true).truncate(true);
                }
                OpenMode::CreateNew => {
                    options.create_new(true);
                }
                OpenMode::OpenOrCreate => {
                    options.create(true);
                }
                OpenMode::Append => {
                    options.append(true).create(true);
                }
                OpenMode::Truncate => {
                    options.truncate(true);
                }
                OpenMode::Open | OpenMode::None => {}
            }
        } else {
            prepare_read_only(path, open).map_err(|e| StorageError::from_io(e, path))?;
        }

        let file = options.open(path).map_err(|e| StorageError::from_io(e, path))?;
        Ok(Box::new(file))
    }

    fn list_files(&self, path: &Path) -> StorageResult<Vec<PathBuf>> {
        list_children(path, |t| t.is_file())
    }

    fn list_directories(&self, path: &Path) -> StorageResult<Vec<PathBuf>> {
        list_children(path, |t| t.is_dir())
    }

    fn timestamp(&self, path: &Path, kind: TimestampKind) -> StorageResult<SystemTime> {
        let meta = fs::metadata(path).map_err(|e| StorageError::from_io(e, path))?;
        let time = match kind {
            TimestampKind::Created => meta.created(),
            TimestampKind::Accessed => meta.accessed(),
            TimestampKind::Modified => meta.modified(),
        };
        time.map_err(|e| StorageError::from_io(e, path))
    }
}

//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use rax_fs::access::{AccessMode, OpenMode};
use rax_fs::naming::UniqueNaming;
use rax_fs::storage::{
    EntryStream, ExistenceResult, MemoryStorage, StorageProvider, StorageResult, TimestampKind,
};
use rax_fs::Volume;

/// One provider call seen by [`RecordingStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Exists(PathBuf),
    CreateFile(PathBuf),
    CreateDirectory(PathBuf),
    DeleteFile(PathBuf),
    DeleteDirectory(PathBuf),
    Move(PathBuf, PathBuf),
    Copy(PathBuf, PathBuf),
    OpenStream(PathBuf),
    List(PathBuf),
    Timestamp(PathBuf),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::CreateFile(_)
                | Call::CreateDirectory(_)
                | Call::DeleteFile(_)
                | Call::DeleteDirectory(_)
                | Call::Move(..)
                | Call::Copy(..)
        )
    }
}

/// Memory-backed provider that records every call it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingStorage {
    pub inner: MemoryStorage,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingStorage {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        Self {
            inner: MemoryStorage::with_files(files.iter().map(|(p, d)| (*p, d.as_bytes().to_vec()))),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn opened_streams(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::OpenStream(_)))
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn text(&self, path: &str) -> String {
        String::from_utf8(self.inner.read_bytes(Path::new(path)).unwrap()).unwrap()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl StorageProvider for RecordingStorage {
    fn exists(&self, path: &Path) -> ExistenceResult {
        self.record(Call::Exists(path.to_path_buf()));
        self.inner.exists(path)
    }

    fn create_file(&self, path: &Path) -> StorageResult<()> {
        self.record(Call::CreateFile(path.to_path_buf()));
        self.inner.create_file(path)
    }

    fn create_directory(&self, path: &Path) -> StorageResult<()> {
        self.record(Call::CreateDirectory(path.to_path_buf()));
        self.inner.create_directory(path)
    }

    fn delete_file(&self, path: &Path) -> StorageResult<()> {
        self.record(Call::DeleteFile(path.to_path_buf()));
        self.inner.delete_file(path)
    }

    fn delete_directory(&self, path: &Path) -> StorageResult<()> {
        self.record(Call::DeleteDirectory(path.to_path_buf()));
        self.inner.delete_directory(path)
    }

    fn move_entry(&self, src: &Path, dst: &Path) -> StorageResult<()> {
        self.record(Call::Move(src.to_path_buf(), dst.to_path_buf()));
        self.inner.move_entry(src, dst)
    }

    fn copy_file(&self, src: &Path, dst: &Path, overwrite: bool) -> StorageResult<()> {
        self.record(Call::Copy(src.to_path_buf(), dst.to_path_buf()));
        self.inner.copy_file(src, dst, overwrite)
    }

    fn open_stream(
        &self,
        path: &Path,
        open: OpenMode,
        access: AccessMode,
    ) -> StorageResult<Box<dyn EntryStream>> {
        self.record(Call::OpenStream(path.to_path_buf()));
        self.inner.open_stream(path, open, access)
    }

    fn list_files(&self, path: &Path) -> StorageResult<Vec<PathBuf>> {
        self.record(Call::List(path.to_path_buf()));
        self.inner.list_files(path)
    }

    fn list_directories(&self, path: &Path) -> StorageResult<Vec<PathBuf>> {
        self.record(Call::List(path.to_path_buf()));
        self.inner.list_directories(path)
    }

    fn timestamp(&self, path: &Path, kind: TimestampKind) -> StorageResult<SystemTime> {
        self.record(Call::Timestamp(path.to_path_buf()));
        self.inner.timestamp(path, kind)
    }
}

/// Volume over a recording provider with default naming.
pub fn recording_volume(files: &[(&str, &str)]) -> (RecordingStorage, Volume) {
    let storage = RecordingStorage::with_files(files);
    let volume = Volume::new(Arc::new(storage.clone()), UniqueNaming::default());
    (storage, volume)
}

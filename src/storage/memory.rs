//! In-memory storage provider
//!
//! Keeps a flat map from normalized path to node. Both `""` and `"/"` act as
//! an always-present root so relative and absolute paths work alike.

use log::error;
use std::collections::BTreeMap;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use crate::access::{AccessMode, OpenMode};
use crate::error::StorageError;
use crate::storage::{EntryStream, ExistenceResult, StorageProvider, StorageResult, TimestampKind};

#[derive(Debug, Clone, Copy)]
struct Times {
    created: SystemTime,
    accessed: SystemTime,
    modified: SystemTime,
}

impl Times {
    fn now() -> Self {
        let now = SystemTime::now();
        Self {
            created: now,
            accessed: now,
            modified: now,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, times: Times },
    Directory { times: Times },
}

impl Node {
    fn empty_file() -> Self {
        Node::File {
            data: Vec::new(),
            times: Times::now(),
        }
    }

    fn directory() -> Self {
        Node::Directory {
            times: Times::now(),
        }
    }

    fn times(&self) -> &Times {
        match self {
            Node::File { times, .. } | Node::Directory { times } => times,
        }
    }
}

type NodeMap = BTreeMap<String, Node>;

/// An in-memory storage provider.
///
/// Clones share the same tree, which makes it suitable for tests that need
/// to inspect what an entry handle did.
///
/// # Example
/// ```
/// use rax_fs::storage::{MemoryStorage, StorageProvider, ExistenceResult};
/// use std::path::Path;
///
/// let storage = MemoryStorage::with_files([("/docs/a.txt", b"hello".to_vec())]);
/// assert_eq!(storage.exists(Path::new("/docs")), ExistenceResult::FolderExists);
/// assert_eq!(storage.read_bytes(Path::new("/docs/a.txt")).unwrap(), b"hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    nodes: Arc<RwLock<NodeMap>>,
}

fn normalize(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() && raw.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_root(key: &str) -> bool {
    key.is_empty() || key == "/"
}

fn parent_key(key: &str) -> String {
    match key.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => key[..idx].to_string(),
        None => String::new(),
    }
}

fn is_descendant(key: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return key.starts_with('/') && key != "/";
    }
    if ancestor.is_empty() {
        return !key.starts_with('/') && !key.is_empty();
    }
    key.len() > ancestor.len() && key.starts_with(ancestor) && key[ancestor.len()..].starts_with('/')
}

fn poisoned() -> StorageError {
    StorageError::IoError(io::Error::other("storage lock poisoned"))
}

fn is_directory(nodes: &NodeMap, key: &str) -> bool {
    is_root(key) || matches!(nodes.get(key), Some(Node::Directory { .. }))
}

fn ensure_parent(nodes: &NodeMap, key: &str) -> StorageResult<()> {
    let parent = parent_key(key);
    if is_directory(nodes, &parent) {
        Ok(())
    } else if nodes.contains_key(&parent) {
        Err(StorageError::NotADirectory(PathBuf::from(parent)))
    } else {
        Err(StorageError::NotFound(PathBuf::from(parent)))
    }
}

impl MemoryStorage {
    /// Create a new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-populated with files; missing parents are created.
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let storage = Self::new();
        if let Ok(mut nodes) = storage.nodes.write() {
            for (path, data) in files {
                let key = normalize(Path::new(path.as_ref()));
                let mut parent = parent_key(&key);
                while !is_root(&parent) {
                    nodes.entry(parent.clone()).or_insert_with(Node::directory);
                    parent = parent_key(&parent);
                }
                nodes.insert(
                    key,
                    Node::File {
                        data,
                        times: Times::now(),
                    },
                );
            }
        }
        storage
    }

    /// Current contents of a file.
    pub fn read_bytes(&self, path: &Path) -> StorageResult<Vec<u8>> {
        let key = normalize(path);
        match self.read()?.get(&key) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Directory { .. }) => Err(StorageError::NotAFile(path.to_path_buf())),
            None => Err(StorageError::NotFound(path.to_path_buf())),
        }
    }

    /// Number of stored nodes, directories included.
    pub fn len(&self) -> usize {
        self.nodes.read().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, NodeMap>> {
        self.nodes.read().map_err(|_| poisoned())
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, NodeMap>> {
        self.nodes.write().map_err(|_| poisoned())
    }

    fn children(&self, path: &Path, want_dirs: bool) -> StorageResult<Vec<PathBuf>> {
        let key = normalize(path);
        let nodes = self.read()?;
        if !is_directory(&nodes, &key) {
            return Err(if nodes.contains_key(&key) {
                StorageError::NotADirectory(path.to_path_buf())
            } else {
                StorageError::NotFound(path.to_path_buf())
            });
        }
        Ok(nodes
            .iter()
            .filter(|(k, _)| !is_root(k) && parent_key(k) == key)
            .filter(|(_, node)| matches!(node, Node::Directory { .. }) == want_dirs)
            .map(|(k, _)| PathBuf::from(k))
            .collect())
    }
}

impl StorageProvider for MemoryStorage {
    fn exists(&self, path: &Path) -> ExistenceResult {
        let key = normalize(path);
        if is_root(&key) {
            return ExistenceResult::FolderExists;
        }
        match self.nodes.read() {
            Ok(nodes) => match nodes.get(&key) {
                Some(Node::File { .. }) => ExistenceResult::FileExists,
                Some(Node::Directory { .. }) => ExistenceResult::FolderExists,
                None => ExistenceResult::None,
            },
            Err(_) => {
                error!("Memory storage lock poisoned while checking {}", path.display());
                ExistenceResult::FolderExists
            }
        }
    }

    fn create_file(&self, path: &Path) -> StorageResult<()> {
        let key = normalize(path);
        let mut nodes = self.write()?;
        if is_root(&key) || nodes.contains_key(&key) {
            return Err(StorageError::AlreadyExists(path.to_path_buf()));
        }
        ensure_parent(&nodes, &key)?;
        nodes.insert(key, Node::empty_file());
        Ok(())
    }

    fn create_directory(&self, path: &Path) -> StorageResult<()> {
        let key = normalize(path);
        let mut nodes = self.write()?;
        let mut pending = Vec::new();
        let mut cursor = key;
        while !is_root(&cursor) {
            match nodes.get(&cursor) {
                Some(Node::Directory { .. }) => break,
                Some(Node::File { .. }) => {
                    return Err(StorageError::NotADirectory(PathBuf::from(cursor)));
                }
                None => {
                    let parent = parent_key(&cursor);
                    pending.push(cursor);
                    cursor = parent;
                }
            }
        }
        for dir in pending {
            nodes.insert(dir, Node::directory());
        }
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> StorageResult<()> {
        let key = normalize(path);
        let mut nodes = self.write()?;
        match nodes.get(&key) {
            Some(Node::File { .. }) => {
                nodes.remove(&key);
                Ok(())
            }
            Some(Node::Directory { .. }) => Err(StorageError::NotAFile(path.to_path_buf())),
            None => Err(StorageError::NotFound(path.to_path_buf())),
        }
    }

    fn delete_directory(&self, path: &Path) -> StorageResult<()> {
        let key = normalize(path);
        if is_root(&key) {
            return Err(StorageError::InvalidPath("cannot delete the root".into()));
        }
        let mut nodes = self.write()?;
        match nodes.get(&key) {
            Some(Node::Directory { .. }) => {
                nodes.retain(|k, _| k != &key && !is_descendant(k, &key));
                Ok(())
            }
            Some(Node::File { .. }) => Err(StorageError::NotADirectory(path.to_path_buf())),
            None => Err(StorageError::NotFound(path.to_path_buf())),
        }
    }

    fn move_entry(&self, src: &Path, dst: &Path) -> StorageResult<()> {
        let src_key = normalize(src);
        let dst_key = normalize(dst);
        let mut nodes = self.write()?;
        if !nodes.contains_key(&src_key) {
            return Err(StorageError::NotFound(src.to_path_buf()));
        }
        if is_root(&dst_key) || nodes.contains_key(&dst_key) {
            return Err(StorageError::AlreadyExists(dst.to_path_buf()));
        }
        if is_descendant(&dst_key, &src_key) {
            return Err(StorageError::InvalidPath(format!(
                "cannot move {} into itself",
                src.display()
            )));
        }
        ensure_parent(&nodes, &dst_key)?;

        let moved: Vec<String> = nodes
            .keys()
            .filter(|k| **k == src_key || is_descendant(k, &src_key))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let new = format!("{}{}", dst_key, &old[src_key.len()..]);
                nodes.insert(new, node);
            }
        }
        Ok(())
    }

    fn copy_file(&self, src: &Path, dst: &Path, overwrite: bool) -> StorageResult<()> {
        let src_key = normalize(src);
        let dst_key = normalize(dst);
        let mut nodes = self.write()?;
        let data = match nodes.get(&src_key) {
            Some(Node::File { data, .. }) => data.clone(),
            Some(Node::Directory { .. }) => return Err(StorageError::NotAFile(src.to_path_buf())),
            None => return Err(StorageError::NotFound(src.to_path_buf())),
        };
        match nodes.get(&dst_key) {
            Some(Node::Directory { .. }) => {
                return Err(StorageError::NotAFile(dst.to_path_buf()));
            }
            Some(Node::File { .. }) if !overwrite => {
                return Err(StorageError::AlreadyExists(dst.to_path_buf()));
            }
            _ => {}
        }
        ensure_parent(&nodes, &dst_key)?;
        nodes.insert(
            dst_key,
            Node::File {
                data,
                times: Times::now(),
            },
        );
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

        let key = normalize(path);
        let mut nodes = self.write()?;
        let existing = match nodes.get(&key) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            Some(Node::Directory { .. }) => return Err(StorageError::NotAFile(path.to_path_buf())),
            None => None,
        };

        let data = match (open, existing) {
            (OpenMode::CreateNew, Some(_)) => {
                return Err(StorageError::AlreadyExists(path.to_path_buf()));
            }
            (OpenMode::Open | OpenMode::Truncate, None) => {
                return Err(StorageError::NotFound(path.to_path_buf()));
            }
            (OpenMode::Create | OpenMode::Truncate, Some(_)) => {
                nodes.insert(key.clone(), Node::empty_file());
                Vec::new()
            }
            (_, Some(data)) => data,
            (_, None) => {
                ensure_parent(&nodes, &key)?;
                nodes.insert(key.clone(), Node::empty_file());
                Vec::new()
            }
        };

        let append = open == OpenMode::Append;
        let mut cursor = Cursor::new(data);
        if append {
            cursor.set_position(cursor.get_ref().len() as u64);
        }
        Ok(Box::new(MemoryStream {
            nodes: Arc::clone(&self.nodes),
            key,
            cursor,
            readable: access.can_read(),
            writable: access.can_write(),
            append,
            dirty: false,
        }))
    }

    fn list_files(&self, path: &Path) -> StorageResult<Vec<PathBuf>> {
        self.children(path, false)
    }

    fn list_directories(&self, path: &Path) -> StorageResult<Vec<PathBuf>> {
        self.children(path, true)
    }

    fn timestamp(&self, path: &Path, kind: TimestampKind) -> StorageResult<SystemTime> {
        let key = normalize(path);
        let nodes = self.read()?;
        let node = nodes
            .get(&key)
            .ok_or_else(|| StorageError::NotFound(path.to_path_buf()))?;
        let times = node.times();
        Ok(match kind {
            TimestampKind::Created => times.created,
            TimestampKind::Accessed => times.accessed,
            TimestampKind::Modified => times.modified,
        })
    }
}

/// Stream over a buffered copy of a memory file; writes land on flush or drop.
#[derive(Debug)]
struct MemoryStream {
    nodes: Arc<RwLock<NodeMap>>,
    key: String,
    cursor: Cursor<Vec<u8>>,
    readable: bool,
    writable: bool,
    append: bool,
    dirty: bool,
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.readable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "stream not opened for reading",
            ));
        }
        self.cursor.read(buf)
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "stream not opened for writing",
            ));
        }
        if self.append {
            self.cursor.seek(SeekFrom::End(0))?;
        }
        let written = self.cursor.write(buf)?;
        self.dirty = true;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let mut nodes = self
            .nodes
            .write()
            .map_err(|_| io::Error::other("storage lock poisoned"))?;
        let created = match nodes.get(&self.key) {
            Some(node) => node.times().created,
            None => SystemTime::now(),
        };
        let now = SystemTime::now();
        nodes.insert(
            self.key.clone(),
            Node::File {
                data: self.cursor.get_ref().clone(),
                times: Times {
                    created,
                    accessed: now,
                    modified: now,
                },
            },
        );
        self.dirty = false;
        Ok(())
    }
}

impl Seek for MemoryStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl Drop for MemoryStream {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

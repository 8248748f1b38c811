//! Entry state
//!
//! The open/closed state machine behind a file handle.

use log::debug;
use std::io::Write;
use std::path::Path;

use crate::access::{self, AccessMode, OpenMode};
use crate::error::{EntryError, EntryResult};
use crate::storage::{EntryStream, StorageProvider};

/// Whether a handle currently holds a stream, and how it was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Closed,
    Open { access: AccessMode, open: OpenMode },
}

impl EntryState {
    pub fn is_open(self) -> bool {
        matches!(self, EntryState::Open { .. })
    }

    pub fn access_mode(self) -> Option<AccessMode> {
        match self {
            EntryState::Open { access, .. } => Some(access),
            EntryState::Closed => None,
        }
    }

    pub fn open_mode(self) -> Option<OpenMode> {
        match self {
            EntryState::Open { open, .. } => Some(open),
            EntryState::Closed => None,
        }
    }
}

/// Stream ownership plus the state it implies.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: EntryState,
    stream: Option<Box<dyn EntryStream>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            state: EntryState::Closed,
            stream: None,
        }
    }
}

impl Lifecycle {
    pub(crate) fn state(&self) -> EntryState {
        self.state
    }

    /// Validates the pair, closes any previous stream, then acquires a new one.
    pub(crate) fn open(
        &mut self,
        storage: &dyn StorageProvider,
        path: &Path,
        access: AccessMode,
        open: OpenMode,
    ) -> EntryResult<()> {
        access::validate(access, open)?;
        self.close()?;
        let stream = storage.open_stream(path, open, access)?;
        self.stream = Some(stream);
        self.state = EntryState::Open { access, open };
        debug!("Opened {} ({:?}, {:?})", path.display(), access, open);
        Ok(())
    }

    /// Flushes and releases the stream. A no-op when already closed.
    pub(crate) fn close(&mut self) -> EntryResult<()> {
        self.state = EntryState::Closed;
        if let Some(mut stream) = self.stream.take() {
            stream.flush()?;
        }
        Ok(())
    }

    pub(crate) fn ensure_closed(&self, operation: &str) -> EntryResult<()> {
        if self.state.is_open() {
            return Err(EntryError::InvalidState(format!(
                "cannot {} while the entry is open",
                operation
            )));
        }
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> EntryResult<()> {
        if let Some(stream) = self.stream.as_mut() {
            stream.flush()?;
        }
        Ok(())
    }

    pub(crate) fn reader(&mut self) -> EntryResult<&mut Box<dyn EntryStream>> {
        match self.state {
            EntryState::Open { access, .. } if access.can_read() => self.stream_mut(),
            EntryState::Open { access, .. } => Err(EntryError::InvalidState(format!(
                "cannot read from a stream opened with {:?} access",
                access
            ))),
            EntryState::Closed => Err(EntryError::InvalidState("entry is not open".into())),
        }
    }

    pub(crate) fn writer(&mut self) -> EntryResult<&mut Box<dyn EntryStream>> {
        match self.state {
            EntryState::Open { access, .. } if access.can_write() => self.stream_mut(),
            EntryState::Open { access, .. } => Err(EntryError::InvalidState(format!(
                "cannot write to a stream opened with {:?} access",
                access
            ))),
            EntryState::Closed => Err(EntryError::InvalidState("entry is not open".into())),
        }
    }

    pub(crate) fn stream_mut(&mut self) -> EntryResult<&mut Box<dyn EntryStream>> {
        self.stream
            .as_mut()
            .ok_or_else(|| EntryError::InvalidState("entry is not open".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_starts_closed() {
        let lifecycle = Lifecycle::default();
        assert_eq!(lifecycle.state(), EntryState::Closed);
        assert!(lifecycle.ensure_closed("rename").is_ok());
    }

    #[test]
    fn test_illegal_pair_keeps_state() {
        let storage = MemoryStorage::new();
        let mut lifecycle = Lifecycle::default();
        let err = lifecycle
            .open(&storage, Path::new("/a.txt"), AccessMode::Read, OpenMode::Truncate)
            .unwrap_err();
        assert!(matches!(err, EntryError::InvalidModeCombination { .. }));
        assert_eq!(lifecycle.state(), EntryState::Closed);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let storage = MemoryStorage::new();
        let mut lifecycle = Lifecycle::default();
        lifecycle
            .open(&storage, Path::new("/a.txt"), AccessMode::Write, OpenMode::Create)
            .unwrap();
        assert!(lifecycle.state().is_open());
        lifecycle.close().unwrap();
        lifecycle.close().unwrap();
        assert_eq!(lifecycle.state(), EntryState::Closed);
    }

    #[test]
    fn test_reopen_replaces_mode() {
        let storage = MemoryStorage::new();
        let mut lifecycle = Lifecycle::default();
        let path = Path::new("/a.txt");
        lifecycle
            .open(&storage, path, AccessMode::Write, OpenMode::Create)
            .unwrap();
        lifecycle
            .open(&storage, path, AccessMode::Read, OpenMode::Open)
            .unwrap();
        assert_eq!(
            lifecycle.state(),
            EntryState::Open {
                access: AccessMode::Read,
                open: OpenMode::Open
            }
        );
        assert!(lifecycle.writer().is_err());
        assert!(lifecycle.reader().is_ok());
        assert!(lifecycle.ensure_closed("delete").is_err());
    }
}

//! Module `access`
//!
//! Access and open modes for entry streams, and the table deciding which
//! pairs may be used together. The table is consulted before any stream is
//! requested from storage.

use serde::Deserialize;

use crate::error::EntryError;

/// Read/write capability requested for a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    None,
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    pub const ALL: [AccessMode; 4] = [
        AccessMode::None,
        AccessMode::Read,
        AccessMode::Write,
        AccessMode::ReadWrite,
    ];

    pub fn can_read(self) -> bool {
        matches!(self, AccessMode::Read | AccessMode::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, AccessMode::Write | AccessMode::ReadWrite)
    }
}

/// Create/open/truncate/append behavior when acquiring a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    None,
    /// Create the file, truncating it if it already exists.
    Create,
    /// Create the file, failing if it already exists.
    CreateNew,
    /// Open an existing file.
    Open,
    OpenOrCreate,
    /// Open or create, positioning every write at the end.
    Append,
    /// Open an existing file and discard its contents.
    Truncate,
}

impl OpenMode {
    pub const ALL: [OpenMode; 7] = [
        OpenMode::None,
        OpenMode::Create,
        OpenMode::CreateNew,
        OpenMode::Open,
        OpenMode::OpenOrCreate,
        OpenMode::Append,
        OpenMode::Truncate,
    ];

    /// Whether the mode may bring a missing file into existence.
    pub fn creates(self) -> bool {
        matches!(
            self,
            OpenMode::Create | OpenMode::CreateNew | OpenMode::OpenOrCreate | OpenMode::Append
        )
    }

    /// Whether the mode mutates the file by itself, independent of later writes.
    pub fn implies_write(self) -> bool {
        matches!(self, OpenMode::Append | OpenMode::Truncate)
    }
}

/// Returns whether `access` may be combined with `open`.
pub fn is_legal(access: AccessMode, open: OpenMode) -> bool {
    match (access, open) {
        (AccessMode::None, _) | (_, OpenMode::None) => false,
        (AccessMode::Read, mode) => !mode.implies_write(),
        (AccessMode::Write | AccessMode::ReadWrite, _) => true,
    }
}

/// Fails with `InvalidModeCombination` when the pair is illegal.
pub fn validate(access: AccessMode, open: OpenMode) -> Result<(), EntryError> {
    if is_legal(access, open) {
        Ok(())
    } else {
        Err(EntryError::InvalidModeCombination { access, open })
    }
}

//! File handles
//!
//! A [`FileEntry`] is built from a path without touching storage. Stream I/O
//! goes through its [`Lifecycle`]; rename, move, extension change and delete
//! are refused while a stream is open.

use chrono::{DateTime, Local, Utc};
use log::{debug, info};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::access::{AccessMode, OpenMode};
use crate::bridge;
use crate::collision::{CollisionPolicy, EntryKind, PathParts};
use crate::entry::destination::{Destination, expect_kind, resolve_destination};
use crate::entry::results::Outcome;
use crate::entry::state::{EntryState, Lifecycle};
use crate::entry::EntryContext;
use crate::error::{EntryError, EntryResult, StorageError};
use crate::storage::{ExistenceResult, TimestampKind};
use crate::utils::validation::{validate_name, validate_path, validate_target};

/// Handle to a file addressed by path.
#[derive(Debug)]
pub struct FileEntry {
    ctx: EntryContext,
    path: PathBuf,
    lifecycle: Lifecycle,
}

/// Create a file at `path` under `policy`.
pub(crate) fn create_file_at(
    ctx: &EntryContext,
    path: &Path,
    policy: CollisionPolicy,
) -> EntryResult<FileEntry> {
    validate_target(path)?;
    match resolve_destination(ctx, path, EntryKind::File, policy)? {
        Destination::Occupied(existing, existence) => FileEntry::existing(ctx, existing, existence),
        Destination::Vacant(target) => {
            ctx.storage.create_file(&target)?;
            info!("Created file {}", target.display());
            Ok(FileEntry::at(ctx.clone(), target))
        }
    }
}

impl FileEntry {
    pub(crate) fn at(ctx: EntryContext, path: PathBuf) -> Self {
        Self {
            ctx,
            path,
            lifecycle: Lifecycle::default(),
        }
    }

    pub(crate) fn existing(
        ctx: &EntryContext,
        path: PathBuf,
        existence: ExistenceResult,
    ) -> EntryResult<Self> {
        expect_kind(&path, existence, EntryKind::File)?;
        debug!("Opening existing file {}", path.display());
        Ok(Self::at(ctx.clone(), path))
    }

    // --------------------
    // Path accessors
    // --------------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name including extension.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without extension.
    pub fn base_name(&self) -> String {
        self.parts().base
    }

    /// Extension without the leading dot; empty when absent.
    pub fn extension(&self) -> String {
        self.parts().extension
    }

    pub fn directory(&self) -> PathBuf {
        self.parts().directory
    }

    pub fn parts(&self) -> PathParts {
        PathParts::split(&self.path, EntryKind::File)
    }

    pub fn exists(&self) -> bool {
        self.ctx.storage.exists(&self.path).has_file()
    }

    // --------------------
    // Lifecycle
    // --------------------

    pub fn state(&self) -> EntryState {
        self.lifecycle.state()
    }

    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    pub fn access_mode(&self) -> Option<AccessMode> {
        self.state().access_mode()
    }

    pub fn open_mode(&self) -> Option<OpenMode> {
        self.state().open_mode()
    }

    /// Acquire a stream. Illegal pairs fail before storage is asked for one;
    /// an already open stream is closed first.
    pub fn open(&mut self, access: AccessMode, open: OpenMode) -> EntryResult<()> {
        self.lifecycle
            .open(self.ctx.storage.as_ref(), &self.path, access, open)
    }

    pub fn close(&mut self) -> EntryResult<()> {
        self.lifecycle.close()
    }

    // --------------------
    // Stream I/O
    // --------------------

    pub fn read(&mut self, buf: &mut [u8]) -> EntryResult<usize> {
        Ok(self.lifecycle.reader()?.read(buf)?)
    }

    pub fn read_to_end(&mut self, buf: &mut Vec<u8>) -> EntryResult<usize> {
        Ok(self.lifecycle.reader()?.read_to_end(buf)?)
    }

    pub fn read_to_string(&mut self, buf: &mut String) -> EntryResult<usize> {
        Ok(self.lifecycle.reader()?.read_to_string(buf)?)
    }

    pub fn write(&mut self, data: &[u8]) -> EntryResult<usize> {
        Ok(self.lifecycle.writer()?.write(data)?)
    }

    pub fn write_all(&mut self, data: &[u8]) -> EntryResult<()> {
        Ok(self.lifecycle.writer()?.write_all(data)?)
    }

    pub fn flush(&mut self) -> EntryResult<()> {
        self.lifecycle.flush()
    }

    pub fn seek(&mut self, pos: SeekFrom) -> EntryResult<u64> {
        Ok(self.lifecycle.stream_mut()?.seek(pos)?)
    }

    /// Open for reading, read everything, close.
    pub fn read_all_bytes(&mut self) -> EntryResult<Vec<u8>> {
        self.open(AccessMode::Read, OpenMode::Open)?;
        let mut buf = Vec::new();
        let read = self.read_to_end(&mut buf);
        self.close()?;
        read?;
        Ok(buf)
    }

    pub fn read_all_text(&mut self) -> EntryResult<String> {
        let bytes = self.read_all_bytes()?;
        String::from_utf8(bytes)
            .map_err(|e| StorageError::IoError(io::Error::new(io::ErrorKind::InvalidData, e)).into())
    }

    /// Replace the file contents with `data`, creating the file if needed.
    pub fn write_all_bytes(&mut self, data: &[u8]) -> EntryResult<()> {
        self.write_with(OpenMode::Create, data)
    }

    pub fn write_all_text(&mut self, text: &str) -> EntryResult<()> {
        self.write_all_bytes(text.as_bytes())
    }

    pub fn append_text(&mut self, text: &str) -> EntryResult<()> {
        self.write_with(OpenMode::Append, text.as_bytes())
    }

    fn write_with(&mut self, open: OpenMode, data: &[u8]) -> EntryResult<()> {
        self.open(AccessMode::Write, open)?;
        let written = self.write_all(data);
        self.close()?;
        written
    }

    // --------------------
    // Structural operations
    // --------------------

    /// Rename within the current directory.
    pub fn rename(&mut self, new_name: &str, policy: CollisionPolicy) -> EntryResult<Outcome<FileEntry>> {
        self.lifecycle.ensure_closed("rename")?;
        let new_name = validate_name(new_name)?;
        let target = self.directory().join(new_name);
        self.relocate(target, policy)
    }

    /// Swap the extension, keeping the base name. An empty `extension` strips it.
    pub fn change_extension(
        &mut self,
        extension: &str,
        policy: CollisionPolicy,
    ) -> EntryResult<Outcome<FileEntry>> {
        self.lifecycle.ensure_closed("change extension")?;
        let extension = extension.trim().trim_start_matches('.');
        let base = self.base_name();
        if base.trim().is_empty() {
            return Err(EntryError::Validation(format!(
                "no base name in {}",
                self.path.display()
            )));
        }
        let name = if extension.is_empty() {
            base
        } else {
            format!("{}.{}", base, extension)
        };
        let target = self.directory().join(validate_name(&name)?);
        self.relocate(target, policy)
    }

    /// Move into `directory`, keeping the file name.
    pub fn move_to(&mut self, directory: &Path, policy: CollisionPolicy) -> EntryResult<Outcome<FileEntry>> {
        self.lifecycle.ensure_closed("move")?;
        let directory = validate_path(directory)?;
        let target = directory.join(self.name());
        self.relocate(target, policy)
    }

    fn relocate(&mut self, target: PathBuf, policy: CollisionPolicy) -> EntryResult<Outcome<FileEntry>> {
        if target == self.path {
            return Ok(Outcome::Done);
        }
        if self.path.starts_with(&target) {
            return Err(EntryError::Validation(format!(
                "cannot move {} onto its own ancestor {}",
                self.path.display(),
                target.display()
            )));
        }
        match resolve_destination(&self.ctx, &target, EntryKind::File, policy)? {
            Destination::Occupied(existing, existence) => Ok(Outcome::Existing(FileEntry::existing(
                &self.ctx, existing, existence,
            )?)),
            Destination::Vacant(destination) => {
                self.ctx.storage.move_entry(&self.path, &destination)?;
                info!(
                    "Moved file {} -> {}",
                    self.path.display(),
                    destination.display()
                );
                self.path = destination;
                Ok(Outcome::Done)
            }
        }
    }

    /// Copy into `directory`, keeping the file name. Returns a handle to the copy,
    /// or to the occupant under `OpenIfExists`. An open stream is flushed first.
    pub fn copy_to(&mut self, directory: &Path, policy: CollisionPolicy) -> EntryResult<FileEntry> {
        let directory = validate_path(directory)?;
        self.lifecycle.flush()?;
        copy_file_into(&self.ctx, &self.path, directory, policy)
    }

    /// [`copy_to`](Self::copy_to) as a bridged blocking call.
    pub async fn copy_to_async(
        &mut self,
        directory: PathBuf,
        policy: CollisionPolicy,
        cancel: &CancellationToken,
    ) -> EntryResult<FileEntry> {
        validate_path(&directory)?;
        if cancel.is_cancelled() {
            return Err(EntryError::Cancelled);
        }
        self.lifecycle.flush()?;
        let ctx = self.ctx.clone();
        let source = self.path.clone();
        bridge::run_blocking(cancel, move || {
            copy_file_into(&ctx, &source, &directory, policy)
        })
        .await
    }

    pub fn delete(&mut self) -> EntryResult<()> {
        self.lifecycle.ensure_closed("delete")?;
        self.ctx.storage.delete_file(&self.path)?;
        info!("Deleted file {}", self.path.display());
        Ok(())
    }

    // --------------------
    // Timestamps
    // --------------------

    pub fn timestamp(&self, kind: TimestampKind) -> EntryResult<DateTime<Utc>> {
        Ok(self.ctx.storage.timestamp(&self.path, kind)?.into())
    }

    pub fn timestamp_local(&self, kind: TimestampKind) -> EntryResult<DateTime<Local>> {
        Ok(self.ctx.storage.timestamp(&self.path, kind)?.into())
    }

    pub fn created(&self) -> EntryResult<DateTime<Utc>> {
        self.timestamp(TimestampKind::Created)
    }

    pub fn accessed(&self) -> EntryResult<DateTime<Utc>> {
        self.timestamp(TimestampKind::Accessed)
    }

    pub fn modified(&self) -> EntryResult<DateTime<Utc>> {
        self.timestamp(TimestampKind::Modified)
    }
}

impl Drop for FileEntry {
    fn drop(&mut self) {
        if let Err(e) = self.lifecycle.close() {
            debug!("Closing {} on drop failed: {}", self.path.display(), e);
        }
    }
}

pub(crate) fn copy_file_into(
    ctx: &EntryContext,
    source: &Path,
    directory: &Path,
    policy: CollisionPolicy,
) -> EntryResult<FileEntry> {
    let name = source
        .file_name()
        .ok_or_else(|| EntryError::Validation(format!("no file name in {}", source.display())))?;
    let target = directory.join(name);
    if target != source && source.starts_with(&target) {
        return Err(EntryError::Validation(format!(
            "cannot copy {} onto its own ancestor {}",
            source.display(),
            target.display()
        )));
    }
    if target == source
        && matches!(
            policy,
            CollisionPolicy::ReplaceExisting | CollisionPolicy::GenerateUniqueNameForExisting
        )
    {
        return Err(EntryError::Validation(format!(
            "cannot copy {} onto itself with {}",
            source.display(),
            policy
        )));
    }

    match resolve_destination(ctx, &target, EntryKind::File, policy)? {
        Destination::Occupied(existing, existence) => FileEntry::existing(ctx, existing, existence),
        Destination::Vacant(destination) => {
            ctx.storage.copy_file(
                source,
                &destination,
                policy == CollisionPolicy::ReplaceExisting,
            )?;
            info!(
                "Copied file {} -> {}",
                source.display(),
                destination.display()
            );
            Ok(FileEntry::at(ctx.clone(), destination))
        }
    }
}

//! Directory handles
//!
//! Directories never hold a stream, so they are always in the closed state
//! and structural operations go straight to destination resolution.

use chrono::{DateTime, Local, Utc};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::bridge;
use crate::collision::{CollisionPolicy, EntryKind};
use crate::entry::destination::{Destination, expect_kind, resolve_destination};
use crate::entry::file::{FileEntry, copy_file_into, create_file_at};
use crate::entry::results::{CopyReport, Outcome};
use crate::entry::state::EntryState;
use crate::entry::EntryContext;
use crate::error::{EntryError, EntryResult, StorageError};
use crate::storage::{ExistenceResult, TimestampKind};
use crate::utils::validation::{validate_name, validate_path, validate_target};

/// Handle to a directory addressed by path.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    ctx: EntryContext,
    path: PathBuf,
}

/// Create a directory at `path` under `policy`.
pub(crate) fn create_directory_at(
    ctx: &EntryContext,
    path: &Path,
    policy: CollisionPolicy,
) -> EntryResult<DirectoryEntry> {
    validate_target(path)?;
    match resolve_destination(ctx, path, EntryKind::Directory, policy)? {
        Destination::Occupied(existing, existence) => {
            DirectoryEntry::existing(ctx, existing, existence)
        }
        Destination::Vacant(target) => {
            ctx.storage.create_directory(&target)?;
            info!("Created directory {}", target.display());
            Ok(DirectoryEntry::at(ctx.clone(), target))
        }
    }
}

impl DirectoryEntry {
    pub(crate) fn at(ctx: EntryContext, path: PathBuf) -> Self {
        Self { ctx, path }
    }

    pub(crate) fn existing(
        ctx: &EntryContext,
        path: PathBuf,
        existence: ExistenceResult,
    ) -> EntryResult<Self> {
        expect_kind(&path, existence, EntryKind::Directory)?;
        debug!("Opening existing directory {}", path.display());
        Ok(Self::at(ctx.clone(), path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn parent(&self) -> PathBuf {
        self.path.parent().map(Path::to_path_buf).unwrap_or_default()
    }

    pub fn exists(&self) -> bool {
        self.ctx.storage.exists(&self.path).has_folder()
    }

    /// Always [`EntryState::Closed`].
    pub fn state(&self) -> EntryState {
        EntryState::Closed
    }

    // --------------------
    // Children
    // --------------------

    pub fn files(&self) -> EntryResult<Vec<FileEntry>> {
        Ok(self
            .ctx
            .storage
            .list_files(&self.path)?
            .into_iter()
            .map(|p| FileEntry::at(self.ctx.clone(), p))
            .collect())
    }

    pub fn directories(&self) -> EntryResult<Vec<DirectoryEntry>> {
        Ok(self
            .ctx
            .storage
            .list_directories(&self.path)?
            .into_iter()
            .map(|p| DirectoryEntry::at(self.ctx.clone(), p))
            .collect())
    }

    /// Handle to a child file; no I/O.
    pub fn file(&self, name: &str) -> EntryResult<FileEntry> {
        let name = validate_name(name)?;
        Ok(FileEntry::at(self.ctx.clone(), self.path.join(name)))
    }

    /// Handle to a child directory; no I/O.
    pub fn subdirectory(&self, name: &str) -> EntryResult<DirectoryEntry> {
        let name = validate_name(name)?;
        Ok(DirectoryEntry::at(self.ctx.clone(), self.path.join(name)))
    }

    pub fn create_file(&self, name: &str, policy: CollisionPolicy) -> EntryResult<FileEntry> {
        let name = validate_name(name)?;
        create_file_at(&self.ctx, &self.path.join(name), policy)
    }

    pub fn create_subdirectory(&self, name: &str, policy: CollisionPolicy) -> EntryResult<DirectoryEntry> {
        let name = validate_name(name)?;
        create_directory_at(&self.ctx, &self.path.join(name), policy)
    }

    // --------------------
    // Structural operations
    // --------------------

    pub fn rename(&mut self, new_name: &str, policy: CollisionPolicy) -> EntryResult<Outcome<DirectoryEntry>> {
        let new_name = validate_name(new_name)?;
        let target = self.parent().join(new_name);
        self.relocate(target, policy)
    }

    /// Move under `parent`, keeping the directory name.
    pub fn move_to(&mut self, parent: &Path, policy: CollisionPolicy) -> EntryResult<Outcome<DirectoryEntry>> {
        let parent = validate_path(parent)?;
        let target = parent.join(self.name());
        self.relocate(target, policy)
    }

    fn relocate(&mut self, target: PathBuf, policy: CollisionPolicy) -> EntryResult<Outcome<DirectoryEntry>> {
        if target == self.path {
            return Ok(Outcome::Done);
        }
        if target.starts_with(&self.path) {
            return Err(EntryError::Validation(format!(
                "cannot move {} into itself",
                self.path.display()
            )));
        }
        if self.path.starts_with(&target) {
            return Err(EntryError::Validation(format!(
                "cannot move {} onto its own ancestor {}",
                self.path.display(),
                target.display()
            )));
        }
        match resolve_destination(&self.ctx, &target, EntryKind::Directory, policy)? {
            Destination::Occupied(existing, existence) => Ok(Outcome::Existing(
                DirectoryEntry::existing(&self.ctx, existing, existence)?,
            )),
            Destination::Vacant(destination) => {
                self.ctx.storage.move_entry(&self.path, &destination)?;
                info!(
                    "Moved directory {} -> {}",
                    self.path.display(),
                    destination.display()
                );
                self.path = destination;
                Ok(Outcome::Done)
            }
        }
    }

    /// Recursively copy under `parent`, keeping the directory name.
    ///
    /// `dir_policy` applies to this directory and every nested one,
    /// `file_policy` to every file. Per-entry failures are collected in the
    /// report and the remaining siblings are still copied; only a
    /// [`EntryError::CollisionFatal`] aborts the walk.
    pub fn copy_to(
        &self,
        parent: &Path,
        dir_policy: CollisionPolicy,
        file_policy: CollisionPolicy,
    ) -> EntryResult<CopyReport> {
        let parent = validate_path(parent)?;
        let target = parent.join(self.name());
        if target != self.path && target.starts_with(&self.path) {
            return Err(EntryError::Validation(format!(
                "cannot copy {} into itself",
                self.path.display()
            )));
        }
        // Onto itself, only policies that leave the occupant alone are allowed.
        let onto_self = target == self.path
            && matches!(
                dir_policy,
                CollisionPolicy::GenerateUniqueName
                    | CollisionPolicy::FailIfExists
                    | CollisionPolicy::ThrowIfExists
            );
        if self.path.starts_with(&target) && !onto_self {
            return Err(EntryError::Validation(format!(
                "cannot copy {} onto {} with {}",
                self.path.display(),
                target.display(),
                dir_policy
            )));
        }
        if !self.exists() {
            return Err(StorageError::NotFound(self.path.clone()).into());
        }

        let (destination, created) =
            match resolve_destination(&self.ctx, &target, EntryKind::Directory, dir_policy)? {
                Destination::Occupied(existing, existence) => {
                    expect_kind(&existing, existence, EntryKind::Directory)?;
                    debug!("Merging into existing directory {}", existing.display());
                    (existing, false)
                }
                Destination::Vacant(destination) => {
                    if destination.starts_with(&self.path) {
                        return Err(EntryError::Validation(format!(
                            "cannot copy {} into itself",
                            self.path.display()
                        )));
                    }
                    self.ctx.storage.create_directory(&destination)?;
                    (destination, true)
                }
            };

        let mut report = CopyReport::new(destination.clone());
        if created {
            report.directories_created += 1;
        }
        self.copy_children(&destination, dir_policy, file_policy, &mut report)?;

        if report.is_success() {
            info!("{}", report);
        } else {
            warn!("{}", report);
        }
        Ok(report)
    }

    fn copy_children(
        &self,
        destination: &Path,
        dir_policy: CollisionPolicy,
        file_policy: CollisionPolicy,
        report: &mut CopyReport,
    ) -> EntryResult<()> {
        for file in self.ctx.storage.list_files(&self.path)? {
            match copy_file_into(&self.ctx, &file, destination, file_policy) {
                Ok(_) => report.files_copied += 1,
                Err(e @ EntryError::CollisionFatal(_)) => return Err(e),
                Err(e) => {
                    warn!("Failed to copy {}: {}", file.display(), e);
                    report.add_failure(file, e);
                }
            }
        }

        for dir in self.ctx.storage.list_directories(&self.path)? {
            let child = DirectoryEntry::at(self.ctx.clone(), dir.clone());
            match child.copy_to(destination, dir_policy, file_policy) {
                Ok(child_report) => report.absorb(child_report),
                Err(e @ EntryError::CollisionFatal(_)) => return Err(e),
                Err(e) => {
                    warn!("Failed to copy {}: {}", dir.display(), e);
                    report.add_failure(dir, e);
                }
            }
        }
        Ok(())
    }

    /// [`copy_to`](Self::copy_to) as a bridged blocking call.
    pub async fn copy_to_async(
        &self,
        parent: PathBuf,
        dir_policy: CollisionPolicy,
        file_policy: CollisionPolicy,
        cancel: &CancellationToken,
    ) -> EntryResult<CopyReport> {
        let this = self.clone();
        bridge::run_blocking(cancel, move || this.copy_to(&parent, dir_policy, file_policy)).await
    }

    /// Delete the directory and everything below it.
    pub fn delete(&self) -> EntryResult<()> {
        self.ctx.storage.delete_directory(&self.path)?;
        info!("Deleted directory {}", self.path.display());
        Ok(())
    }

    pub async fn delete_async(&self, cancel: &CancellationToken) -> EntryResult<()> {
        let this = self.clone();
        bridge::run_blocking(cancel, move || this.delete()).await
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

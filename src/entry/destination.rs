//! Destination resolution
//!
//! Applies a collision policy to the destination of a structural operation
//! before any storage mutation happens.

use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use crate::collision::{self, CollisionPolicy, EntryKind};
use crate::entry::EntryContext;
use crate::error::{CollisionError, EntryError, EntryResult, StorageError};
use crate::storage::ExistenceResult;

/// Where a structural operation should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Destination {
    /// Free path; the operation may proceed there.
    Vacant(PathBuf),
    /// `OpenIfExists` hit an occupant; no mutation should happen.
    Occupied(PathBuf, ExistenceResult),
}

/// Resolve `target` under `policy`.
///
/// `ReplaceExisting` deletes the occupant and `GenerateUniqueNameForExisting`
/// moves it aside; every other policy leaves storage untouched.
pub(crate) fn resolve_destination(
    ctx: &EntryContext,
    target: &Path,
    kind: EntryKind,
    policy: CollisionPolicy,
) -> EntryResult<Destination> {
    let storage = ctx.storage.as_ref();
    let existence = storage.exists(target);
    if existence.is_none() {
        return Ok(Destination::Vacant(target.to_path_buf()));
    }

    debug!(
        "Destination {} occupied ({:?}), applying {}",
        target.display(),
        existence,
        policy
    );

    match policy {
        CollisionPolicy::FailIfExists => {
            warn!("Destination exists: {}", target.display());
            Err(CollisionError::Occupied(target.to_path_buf()).into())
        }
        CollisionPolicy::ThrowIfExists => {
            error!("Destination exists (strict): {}", target.display());
            Err(EntryError::CollisionFatal(target.to_path_buf()))
        }
        CollisionPolicy::OpenIfExists => Ok(Destination::Occupied(target.to_path_buf(), existence)),
        CollisionPolicy::ReplaceExisting => {
            remove_occupant(ctx, target, existence)?;
            Ok(Destination::Vacant(target.to_path_buf()))
        }
        CollisionPolicy::GenerateUniqueName => {
            let candidate = collision::resolve(target, kind, &ctx.naming, |p| storage.exists(p))?;
            Ok(Destination::Vacant(candidate))
        }
        CollisionPolicy::GenerateUniqueNameForExisting => {
            let occupant_kind = if existence.has_folder() && !existence.has_file() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            let aside = collision::resolve(target, occupant_kind, &ctx.naming, |p| {
                storage.exists(p)
            })?;
            storage.move_entry(target, &aside)?;
            info!(
                "Moved existing {} aside to {}",
                target.display(),
                aside.display()
            );
            Ok(Destination::Vacant(target.to_path_buf()))
        }
    }
}

fn remove_occupant(ctx: &EntryContext, target: &Path, existence: ExistenceResult) -> EntryResult<()> {
    if existence.has_file() {
        ctx.storage.delete_file(target)?;
    }
    if existence.has_folder() {
        ctx.storage.delete_directory(target)?;
    }
    info!("Replaced existing {}", target.display());
    Ok(())
}

/// Check that an `OpenIfExists` occupant has the kind the caller asked for.
pub(crate) fn expect_kind(path: &Path, existence: ExistenceResult, kind: EntryKind) -> EntryResult<()> {
    match kind {
        EntryKind::File if !existence.has_file() => {
            Err(StorageError::NotAFile(path.to_path_buf()).into())
        }
        EntryKind::Directory if !existence.has_folder() => {
            Err(StorageError::NotADirectory(path.to_path_buf()).into())
        }
        _ => Ok(()),
    }
}

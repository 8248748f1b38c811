//! Unique-name resolution
//!
//! Turns an occupied path into a free sibling named `{base}-{suffix}{.ext}`.

use log::debug;
use std::path::{Path, PathBuf};

use crate::error::CollisionError;
use crate::naming::UniqueNaming;
use crate::storage::ExistenceResult;

/// Whether a path is handled as a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A path split into its parent directory, base name and extension.
///
/// Directories never carry an extension: `archive.d` stays whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts {
    pub directory: PathBuf,
    pub base: String,
    /// Extension without the leading dot; empty when absent.
    pub extension: String,
}

impl PathParts {
    pub fn split(path: &Path, kind: EntryKind) -> Self {
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        match kind {
            EntryKind::Directory => Self {
                directory,
                base: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                extension: String::new(),
            },
            EntryKind::File => Self {
                directory,
                base: path
                    .file_stem()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                extension: path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            },
        }
    }

    /// File name with `suffix` appended to the base name.
    pub fn file_name_with_suffix(&self, suffix: &str) -> String {
        if self.extension.is_empty() {
            format!("{}-{}", self.base, suffix)
        } else {
            format!("{}-{}.{}", self.base, suffix, self.extension)
        }
    }

    pub fn with_suffix(&self, suffix: &str) -> PathBuf {
        self.directory.join(self.file_name_with_suffix(suffix))
    }
}

/// Returns `path` when free, otherwise the first free suffixed candidate.
///
/// `exists` is consulted once for `path` and once per attempt; a
/// [`CollisionError::Exhausted`] is returned after `naming.max_attempts`
/// occupied candidates.
pub fn resolve<F>(
    path: &Path,
    kind: EntryKind,
    naming: &UniqueNaming,
    mut exists: F,
) -> Result<PathBuf, CollisionError>
where
    F: FnMut(&Path) -> ExistenceResult,
{
    if exists(path).is_none() {
        return Ok(path.to_path_buf());
    }

    let parts = PathParts::split(path, kind);
    for attempt in 0..naming.max_attempts {
        let candidate = parts.with_suffix(&naming.suffix(attempt));
        if exists(&candidate).is_none() {
            debug!(
                "Resolved {} to {} after {} attempt(s)",
                path.display(),
                candidate.display(),
                attempt + 1
            );
            return Ok(candidate);
        }
    }

    Err(CollisionError::Exhausted {
        path: path.to_path_buf(),
        max_attempts: naming.max_attempts,
    })
}

//! Entry result types
//!
//! Defines result structures returned by structural operations.

use std::fmt;
use std::path::PathBuf;

use crate::error::EntryError;

/// Result of a rename or move.
#[derive(Debug)]
pub enum Outcome<E> {
    /// The entry now lives at its new location.
    Done,
    /// `OpenIfExists` found an occupant; the entry was not touched.
    Existing(E),
}

impl<E> Outcome<E> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done)
    }

    pub fn existing(self) -> Option<E> {
        match self {
            Outcome::Done => None,
            Outcome::Existing(entry) => Some(entry),
        }
    }
}

/// One entry that could not be copied.
#[derive(Debug)]
pub struct CopyFailure {
    /// Source path of the failed entry.
    pub path: PathBuf,
    pub error: EntryError,
}

/// Aggregate result of a recursive directory copy.
#[derive(Debug)]
pub struct CopyReport {
    /// Destination directory of the copy.
    pub destination: PathBuf,
    pub files_copied: u64,
    pub directories_created: u64,
    pub failures: Vec<CopyFailure>,
}

impl CopyReport {
    pub fn new(destination: PathBuf) -> Self {
        Self {
            destination,
            files_copied: 0,
            directories_created: 0,
            failures: Vec::new(),
        }
    }

    /// True when every entry was copied.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn add_failure(&mut self, path: PathBuf, error: EntryError) {
        self.failures.push(CopyFailure { path, error });
    }

    /// Merge the counters and failures of a nested copy.
    pub fn absorb(&mut self, child: CopyReport) {
        self.files_copied += child.files_copied;
        self.directories_created += child.directories_created;
        self.failures.extend(child.failures);
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} {} files={} directories={} failures={}",
            self.destination.display(),
            self.files_copied,
            self.directories_created,
            self.failure_count()
        )
    }
}

impl fmt::Display for CopyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

//! Error handlers
//!
//! Logs errors by severity and maps them onto process exit codes.

use crate::error::types::{CollisionError, EntryError};
use log::{error, warn};

/// Log an entry error at a level matching its severity
pub fn handle_error(err: &EntryError) {
    if err.is_fatal() {
        error!("rax-fs error: {}", err);
    } else {
        warn!("rax-fs failure: {}", err);
    }
}

/// Exit code for a directory copy that finished with per-entry failures
pub const PARTIAL_COPY_EXIT_CODE: i32 = 11;

/// Convert an error to a CLI exit code
pub fn exit_code(err: &EntryError) -> i32 {
    match err {
        EntryError::Validation(_) => 2,
        EntryError::InvalidModeCombination { .. } => 3,
        EntryError::Collision(CollisionError::Occupied(_)) => 4,
        EntryError::Collision(CollisionError::Exhausted { .. }) => 5,
        EntryError::CollisionFatal(_) => 6,
        EntryError::InvalidState(_) => 7,
        EntryError::Storage(_) => 8,
        EntryError::Cancelled => 9,
        EntryError::TaskFailed(_) => 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes_are_distinct_per_collision_kind() {
        let occupied = EntryError::Collision(CollisionError::Occupied(PathBuf::from("a")));
        let fatal = EntryError::CollisionFatal(PathBuf::from("a"));
        assert_ne!(exit_code(&occupied), exit_code(&fatal));
        assert_eq!(exit_code(&EntryError::Validation(String::new())), 2);
    }
}

//! Input validation utilities
//!
//! Name and path checks performed before any storage call.

use std::path::Path;

use crate::error::EntryError;

/// Validate that input is not empty and doesn't contain dangerous characters
pub fn is_valid_input(input: &str) -> bool {
    !input.trim().is_empty() && !input.contains('\0')
}

/// Validate a single entry name (no separators allowed)
pub fn validate_name(name: &str) -> Result<&str, EntryError> {
    if !is_valid_input(name) {
        return Err(EntryError::Validation(format!("Invalid name: {:?}", name)));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(EntryError::Validation(format!(
            "Name must not contain path separators: {}",
            name
        )));
    }
    if name == "." || name == ".." {
        return Err(EntryError::Validation(format!("Reserved name: {}", name)));
    }
    Ok(name)
}

/// Validate a full path used as an operation target
pub fn validate_path(path: &Path) -> Result<&Path, EntryError> {
    let text = path.to_string_lossy();
    if !is_valid_input(&text) {
        return Err(EntryError::Validation(format!("Invalid path: {:?}", text)));
    }
    Ok(path)
}

/// Validate a path that names the entry itself, so it must end in a name
pub fn validate_target(path: &Path) -> Result<&Path, EntryError> {
    validate_path(path)?;
    match path.file_name() {
        Some(_) => Ok(path),
        None => Err(EntryError::Validation(format!(
            "Path does not name an entry: {}",
            path.display()
        ))),
    }
}

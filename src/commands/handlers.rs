//! Command handlers for the rax-fs CLI.
//!
//! Each handler runs one command against a [`Volume`] and renders a
//! one-line message. Failures are logged and mapped to an exit code.

use chrono::{DateTime, Local};
use log::info;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::collision::CollisionPolicy;
use crate::commands::parser::{Command, CommandResult, Invocation, USAGE};
use crate::config::CollisionDefaults;
use crate::entry::{Outcome, Volume};
use crate::error::handlers::{PARTIAL_COPY_EXIT_CODE, exit_code, handle_error};
use crate::error::{EntryError, EntryResult, StorageError};
use crate::storage::TimestampKind;

/// Policies in effect for one invocation.
#[derive(Debug, Clone, Copy)]
struct Policies {
    file: CollisionPolicy,
    directory: CollisionPolicy,
}

impl Policies {
    fn new(defaults: &CollisionDefaults, overridden: Option<CollisionPolicy>) -> Self {
        match overridden {
            Some(policy) => Self {
                file: policy,
                directory: policy,
            },
            None => Self {
                file: defaults.file,
                directory: defaults.directory,
            },
        }
    }
}

/// Dispatches a parsed invocation to its handler.
pub async fn handle_command(
    volume: &Volume,
    defaults: &CollisionDefaults,
    invocation: Invocation,
    cancel: &CancellationToken,
) -> CommandResult {
    let policies = Policies::new(defaults, invocation.policy);
    let result = match invocation.command {
        Command::Touch(path) => handle_cmd_touch(volume, path, policies, cancel).await,
        Command::Mkdir(path) => handle_cmd_mkdir(volume, path, policies, cancel).await,
        Command::Write(path, text) => handle_cmd_write(volume, &path, &text, policies),
        Command::Cat(path) => handle_cmd_cat(volume, &path),
        Command::Rename(path, name) => handle_cmd_rename(volume, &path, &name, policies),
        Command::Mv(path, dir) => handle_cmd_mv(volume, &path, &dir, policies),
        Command::Cp(path, dir) => match handle_cmd_cp(volume, &path, dir, policies, cancel).await {
            Ok(result) => return result,
            Err(e) => Err(e),
        },
        Command::Rm(path) => handle_cmd_rm(volume, &path, cancel).await,
        Command::Ls(path) => handle_cmd_ls(volume, &path),
        Command::Stat(path) => handle_cmd_stat(volume, &path),
        Command::Help => Ok(USAGE.to_string()),
        Command::Unknown(raw) => {
            return CommandResult::failure(1, format!("unknown command: {:?}\n{}", raw, USAGE));
        }
    };

    match result {
        Ok(message) => CommandResult::success(message),
        Err(e) => {
            handle_error(&e);
            CommandResult::failure(exit_code(&e), e.to_string())
        }
    }
}

async fn handle_cmd_touch(
    volume: &Volume,
    path: String,
    policies: Policies,
    cancel: &CancellationToken,
) -> EntryResult<String> {
    let file = volume
        .create_file_async(PathBuf::from(path), policies.file, cancel)
        .await?;
    Ok(format!("created {}", file.path().display()))
}

async fn handle_cmd_mkdir(
    volume: &Volume,
    path: String,
    policies: Policies,
    cancel: &CancellationToken,
) -> EntryResult<String> {
    let dir = volume
        .create_directory_async(PathBuf::from(path), policies.directory, cancel)
        .await?;
    Ok(format!("created {}", dir.path().display()))
}

fn handle_cmd_write(volume: &Volume, path: &str, text: &str, policies: Policies) -> EntryResult<String> {
    let mut file = volume.create_file(Path::new(path), policies.file)?;
    file.write_all_text(text)?;
    Ok(format!("wrote {} bytes to {}", text.len(), file.path().display()))
}

fn handle_cmd_cat(volume: &Volume, path: &str) -> EntryResult<String> {
    volume.file(Path::new(path))?.read_all_text()
}

fn handle_cmd_rename(volume: &Volume, path: &str, name: &str, policies: Policies) -> EntryResult<String> {
    let path = Path::new(path);
    if volume.exists(path).has_folder() {
        let mut dir = volume.directory(path)?;
        let outcome = dir.rename(name, policies.directory)?;
        Ok(describe_move(dir.path(), outcome.existing().map(|d| d.path().to_path_buf())))
    } else {
        let mut file = volume.file(path)?;
        let outcome = file.rename(name, policies.file)?;
        Ok(describe_move(file.path(), outcome.existing().map(|f| f.path().to_path_buf())))
    }
}

fn handle_cmd_mv(volume: &Volume, path: &str, dir: &str, policies: Policies) -> EntryResult<String> {
    let path = Path::new(path);
    let target = Path::new(dir);
    if volume.exists(path).has_folder() {
        let mut entry = volume.directory(path)?;
        let outcome = entry.move_to(target, policies.directory)?;
        Ok(describe_move(entry.path(), outcome.existing().map(|d| d.path().to_path_buf())))
    } else {
        let mut entry = volume.file(path)?;
        let outcome = entry.move_to(target, policies.file)?;
        Ok(describe_move(entry.path(), outcome.existing().map(|f| f.path().to_path_buf())))
    }
}

fn describe_move(current: &Path, existing: Option<PathBuf>) -> String {
    match existing {
        Some(occupant) => format!("kept existing {}", occupant.display()),
        None => format!("now at {}", current.display()),
    }
}

async fn handle_cmd_cp(
    volume: &Volume,
    path: &str,
    dir: String,
    policies: Policies,
    cancel: &CancellationToken,
) -> EntryResult<CommandResult> {
    let path = Path::new(path);
    if volume.exists(path).has_folder() {
        let report = volume
            .directory(path)?
            .copy_to_async(PathBuf::from(dir), policies.directory, policies.file, cancel)
            .await?;
        let mut message = report.to_string();
        for failure in &report.failures {
            message.push_str(&format!("\n  {}: {}", failure.path.display(), failure.error));
        }
        if report.is_success() {
            Ok(CommandResult::success(message))
        } else {
            Ok(CommandResult::failure(PARTIAL_COPY_EXIT_CODE, message))
        }
    } else {
        let copy = volume
            .file(path)?
            .copy_to_async(PathBuf::from(dir), policies.file, cancel)
            .await?;
        Ok(CommandResult::success(format!("copied to {}", copy.path().display())))
    }
}

async fn handle_cmd_rm(volume: &Volume, path: &str, cancel: &CancellationToken) -> EntryResult<String> {
    let path = Path::new(path);
    let existence = volume.exists(path);
    if existence.has_folder() {
        volume.directory(path)?.delete_async(cancel).await?;
    } else if existence.has_file() {
        volume.file(path)?.delete()?;
    } else {
        return Err(StorageError::NotFound(path.to_path_buf()).into());
    }
    info!("Removed {}", path.display());
    Ok(format!("removed {}", path.display()))
}

fn handle_cmd_ls(volume: &Volume, path: &str) -> EntryResult<String> {
    let dir = volume.directory(Path::new(path))?;
    let mut lines: Vec<String> = dir
        .directories()?
        .iter()
        .map(|d| format!("{}/", d.name()))
        .collect();
    lines.extend(dir.files()?.iter().map(|f| f.name()));
    Ok(lines.join("\n"))
}

fn handle_cmd_stat(volume: &Volume, path: &str) -> EntryResult<String> {
    let path = Path::new(path);
    let existence = volume.exists(path);
    let (kind, created, modified) = if existence.has_folder() {
        let dir = volume.directory(path)?;
        (
            "directory",
            dir.timestamp_local(TimestampKind::Created)?,
            dir.timestamp_local(TimestampKind::Modified)?,
        )
    } else if existence.has_file() {
        let file = volume.file(path)?;
        (
            "file",
            file.timestamp_local(TimestampKind::Created)?,
            file.timestamp_local(TimestampKind::Modified)?,
        )
    } else {
        return Err(EntryError::Storage(StorageError::NotFound(path.to_path_buf())));
    };
    Ok(format!(
        "{} ({})\n  created:  {}\n  modified: {}",
        path.display(),
        kind,
        stamp(created),
        stamp(modified)
    ))
}

fn stamp(time: DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

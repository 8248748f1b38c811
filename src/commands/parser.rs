//! Module `parser`
//!
//! Turns command-line arguments into a [`Command`] plus optional global flags.

use crate::collision::CollisionPolicy;
use crate::error::EntryError;

/// A CLI command with its arguments.
#[derive(Debug, PartialEq)]
pub enum Command {
    Touch(String),
    Mkdir(String),
    Write(String, String), // path, text
    Cat(String),
    Rename(String, String), // path, new name
    Mv(String, String),     // path, destination directory
    Cp(String, String),     // path, destination directory
    Rm(String),
    Ls(String),
    Stat(String),
    Help,
    Unknown(String),
}

/// A parsed command line.
#[derive(Debug, PartialEq)]
pub struct Invocation {
    /// `--policy` override for every collision in this run.
    pub policy: Option<CollisionPolicy>,
    pub command: Command,
}

/// Outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    /// Carries the process exit code.
    Failure(i32),
}

/// Full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
}

impl CommandResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(message.into()),
        }
    }

    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Failure(code),
            message: Some(message.into()),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.status {
            CommandStatus::Success => 0,
            CommandStatus::Failure(code) => code,
        }
    }
}

pub const USAGE: &str = "usage: rax-fs [--policy <policy>] <command> [args]
commands:
  touch <path>             create an empty file
  mkdir <path>             create a directory
  write <path> <text>      create a file and write text into it
  cat <path>               print a file
  rename <path> <name>     rename a file or directory
  mv <path> <dir>          move into a directory
  cp <path> <dir>          copy into a directory (directories recursively)
  rm <path>                delete a file or directory
  ls [path]                list a directory
  stat <path>              show kind and timestamps
policies: generate_unique_name, replace_existing, fail_if_exists,
  throw_if_exists, open_if_exists, generate_unique_name_for_existing";

/// Parse the full argument list (program name excluded).
pub fn parse_args<I, S>(args: I) -> Result<Invocation, EntryError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut policy: Option<CollisionPolicy> = None;
    let mut words = Vec::new();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        let arg = arg.as_ref();
        if arg == "--policy" || arg == "-p" {
            let value = iter
                .next()
                .ok_or_else(|| EntryError::Validation("--policy requires a value".into()))?;
            policy = Some(value.as_ref().parse::<CollisionPolicy>().map_err(EntryError::Validation)?);
        } else if let Some(value) = arg.strip_prefix("--policy=") {
            policy = Some(value.parse::<CollisionPolicy>().map_err(EntryError::Validation)?);
        } else {
            words.push(arg.to_string());
        }
    }

    Ok(Invocation {
        policy,
        command: parse_command(&words),
    })
}

/// Parse command words into the `Command` enum.
///
/// Returns `Unknown` if a known command is misused.
pub fn parse_command(words: &[String]) -> Command {
    let cmd = words.first().map(|w| w.to_ascii_lowercase()).unwrap_or_default();
    let args: Vec<&str> = words.iter().skip(1).map(String::as_str).collect();

    match (cmd.as_str(), args.as_slice()) {
        ("touch", [path]) => Command::Touch(path.to_string()),
        ("mkdir", [path]) => Command::Mkdir(path.to_string()),
        ("write", [path, text @ ..]) if !text.is_empty() => {
            Command::Write(path.to_string(), text.join(" "))
        }
        ("cat", [path]) => Command::Cat(path.to_string()),
        ("rename", [path, name]) => Command::Rename(path.to_string(), name.to_string()),
        ("mv", [path, dir]) => Command::Mv(path.to_string(), dir.to_string()),
        ("cp", [path, dir]) => Command::Cp(path.to_string(), dir.to_string()),
        ("rm", [path]) => Command::Rm(path.to_string()),
        ("ls", []) => Command::Ls(".".to_string()),
        ("ls", [path]) => Command::Ls(path.to_string()),
        ("stat", [path]) => Command::Stat(path.to_string()),
        ("help" | "--help" | "-h", _) => Command::Help,
        _ => Command::Unknown(words.join(" ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_command(&words("touch a.txt")), Command::Touch("a.txt".into()));
        assert_eq!(parse_command(&words("MKDIR d")), Command::Mkdir("d".into()));
        assert_eq!(parse_command(&words("ls")), Command::Ls(".".into()));
        assert_eq!(parse_command(&words("rm d")), Command::Rm("d".into()));
        assert_eq!(parse_command(&words("help")), Command::Help);
    }

    #[test]
    fn test_parse_commands_with_two_args() {
        assert_eq!(
            parse_command(&words("rename a.txt b.txt")),
            Command::Rename("a.txt".into(), "b.txt".into())
        );
        assert_eq!(
            parse_command(&words("cp src out")),
            Command::Cp("src".into(), "out".into())
        );
        assert_eq!(
            parse_command(&words("write notes.txt hello there")),
            Command::Write("notes.txt".into(), "hello there".into())
        );
    }

    #[test]
    fn test_misused_commands_are_unknown() {
        assert_eq!(parse_command(&words("touch")), Command::Unknown("touch".into()));
        assert_eq!(parse_command(&words("mv a")), Command::Unknown("mv a".into()));
        assert_eq!(parse_command(&words("write a")), Command::Unknown("write a".into()));
        assert_eq!(parse_command(&[]), Command::Unknown(String::new()));
    }

    #[test]
    fn test_policy_flag() {
        let inv = parse_args(["--policy", "open-if-exists", "mkdir", "d"]).unwrap();
        assert_eq!(inv.policy, Some(CollisionPolicy::OpenIfExists));
        assert_eq!(inv.command, Command::Mkdir("d".into()));

        let inv = parse_args(["touch", "a", "--policy=replace_existing"]).unwrap();
        assert_eq!(inv.policy, Some(CollisionPolicy::ReplaceExisting));

        let inv = parse_args(["touch", "a"]).unwrap();
        assert_eq!(inv.policy, None);
    }

    #[test]
    fn test_bad_policy_flag() {
        assert!(matches!(
            parse_args(["--policy", "clobber", "touch", "a"]),
            Err(EntryError::Validation(_))
        ));
        assert!(matches!(parse_args(["touch", "a", "-p"]), Err(EntryError::Validation(_))));
    }

    #[test]
    fn test_result_exit_codes() {
        assert_eq!(CommandResult::success("ok").exit_code(), 0);
        assert_eq!(CommandResult::failure(4, "taken").exit_code(), 4);
    }
}

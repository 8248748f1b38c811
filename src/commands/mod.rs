pub mod handlers;
pub mod parser;

pub use handlers::handle_command;
pub use parser::{Command, CommandResult, CommandStatus, Invocation, USAGE, parse_args, parse_command};

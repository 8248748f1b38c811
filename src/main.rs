//! rax-fs - Entry Point
//!
//! Command-line front end over a configured volume.

use log::{error, info};
use std::process;
use tokio_util::sync::CancellationToken;

use rax_fs::commands::{CommandStatus, handle_command, parse_args};
use rax_fs::config::FsConfig;
use rax_fs::error::handlers::exit_code;
use rax_fs::utils::logging::setup_logging;

#[tokio::main]
async fn main() {
    setup_logging();

    let config = match FsConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(2);
        }
    };

    let invocation = match parse_args(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(exit_code(&e));
        }
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling pending work");
            on_interrupt.cancel();
        }
    });

    let volume = config.build_volume();
    let result = handle_command(&volume, &config.collisions, invocation, &cancel).await;

    if let Some(message) = &result.message {
        match result.status {
            CommandStatus::Success => println!("{}", message),
            CommandStatus::Failure(_) => eprintln!("{}", message),
        }
    }
    process::exit(result.exit_code());
}

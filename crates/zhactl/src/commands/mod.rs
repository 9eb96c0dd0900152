//! Command dispatch: routes parsed CLI commands to their handlers.

pub mod config_cmd;
pub mod devices;
pub mod diagnose;
pub mod names;
pub mod util;
pub mod watch;

use zhactl_core::HubConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a hub-backed command to its handler.
pub async fn dispatch(cmd: Command, hub: &HubConfig, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(args, hub, global).await,
        Command::Diagnose(args) => diagnose::handle(&args, hub, global).await,
        Command::Names(args) => names::handle(args, hub, global).await,
        Command::Watch(args) => watch::handle(args, hub, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal {
            message: "offline command routed to hub dispatch".into(),
        }),
    }
}

//! Shared helpers for command handlers.

use std::io::IsTerminal;

use zhactl_core::{HubConfig, Snapshot, fetch_snapshot, hub};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Read one snapshot from the hub behind a spinner.
pub async fn load_snapshot(config: &HubConfig, global: &GlobalOpts) -> Result<Snapshot, CliError> {
    let bar = output::spinner("Reading devices from hub...", global.quiet);
    let result = hub::with_client(config, async |rpc| fetch_snapshot(rpc).await).await;
    bar.finish_and_clear();
    Ok(result?)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal on stdin there is nobody to ask, so `--yes` is
/// required.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// `value`, or `-` when absent or blank.
pub fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_owned(),
        _ => "-".into(),
    }
}

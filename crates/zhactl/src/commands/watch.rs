//! `watch`: device listing, then a live event stream until Ctrl+C.

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use zhactl_api::event_types;
use zhactl_api::{EventKind, HubEvent};
use zhactl_core::{HubConfig, hub};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::devices;

/// Event types watched when none are given.
pub const DEFAULT_EVENTS: [&str; 2] = [event_types::ZHA_EVENT, event_types::STATE_CHANGED];

fn describe(event: &HubEvent) -> String {
    match event.kind() {
        EventKind::Zha {
            device_ieee,
            command,
            args,
        } => {
            let mut line = format!("{} {device_ieee}", event.event_type);
            if let Some(command) = command {
                line.push_str(&format!(" command={command}"));
            }
            if let Some(args) = args.filter(|a| !a.is_null()) {
                line.push_str(&format!(" args={args}"));
            }
            line
        }
        EventKind::StateChanged {
            entity_id,
            new_state,
        } => format!(
            "{} {entity_id} -> {}",
            event.event_type,
            new_state.unwrap_or("(removed)")
        ),
        EventKind::Other => format!("{} {}", event.event_type, event.data),
    }
}

fn render_event(event: &HubEvent, format: &OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => Ok(serde_json::to_string(event)?),
        OutputFormat::Yaml => Ok(format!("---\n{}", serde_yaml::to_string(event)?)),
        OutputFormat::Table | OutputFormat::Plain => Ok(format!(
            "[{}] {}",
            Local::now().format("%H:%M:%S"),
            describe(event)
        )),
    }
}

pub async fn handle(args: WatchArgs, config: &HubConfig, global: &GlobalOpts) -> Result<(), CliError> {
    if !args.no_listing {
        let summaries = devices::summaries(config, global).await?;
        output::print_output(&devices::render_summaries(&summaries, global)?, global.quiet);
    }

    let events: Vec<String> = if args.events.is_empty() {
        DEFAULT_EVENTS.iter().map(|e| (*e).to_owned()).collect()
    } else {
        args.events
    };

    let mut tap = hub::event_tap(config).await?;
    for event_type in &events {
        if let Err(e) = tap.subscribe(event_type).await {
            tap.close().await;
            return Err(zhactl_core::CoreError::from(e).into());
        }
    }
    if !global.quiet {
        eprintln!("Watching {} (Ctrl+C to stop)", events.join(", "));
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, stopping watch");
            on_signal.cancel();
        }
    });

    let mut render_error = None;
    let result = tap
        .run(&cancel, |event| match render_event(event, &global.output) {
            Ok(line) => output::print_output(&line, global.quiet),
            Err(e) => {
                render_error.get_or_insert(e);
                cancel.cancel();
            }
        })
        .await;
    tap.close().await;

    if let Some(e) = render_error {
        return Err(e);
    }
    result.map_err(|e| zhactl_core::CoreError::from(e).into())
}

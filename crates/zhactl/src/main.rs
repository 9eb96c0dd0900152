mod cli;
mod commands;
mod config;
mod csv;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, DevicesArgs, DevicesCommand};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a hub connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "zhactl", &mut std::io::stdout());
            Ok(())
        }

        // Template works on a local export file
        Command::Devices(DevicesArgs {
            command: DevicesCommand::Template { input, out },
        }) => commands::devices::template(&input, &out, &cli.global),

        cmd => {
            let (profile_name, hub) = config::build_hub_config(&cli.global)?;

            tracing::debug!(command = ?cmd, profile = %profile_name, url = %hub.url, "dispatching command");
            commands::dispatch(cmd, &hub, &cli.global)
                .await
                .map_err(|e| e.with_profile(&profile_name))
        }
    }
}

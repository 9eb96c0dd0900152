//! Clap derive structures for the `zhactl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// zhactl -- inventory, diagnose and rename Zigbee devices on a Home Assistant hub
#[derive(Debug, Parser)]
#[command(
    name = "zhactl",
    version,
    about = "Inventory, diagnose and rename ZHA Zigbee devices",
    long_about = "Talks to a Home Assistant hub over its WebSocket API.\n\n\
        Joins the Zigbee coordinator's device list with the device and entity\n\
        registries, reports unhealthy devices, and applies bulk renames from\n\
        a semicolon-separated CSV file.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Hub profile to use
    #[arg(long, short = 'p', env = "ZHACTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Hub base URL, e.g. http://homeassistant.local:8123 (overrides profile)
    #[arg(long, short = 'u', env = "HASS_URL", global = true)]
    pub url: Option<String>,

    /// Long-lived access token
    #[arg(long, env = "HASS_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ZHACTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List, export and rename Zigbee devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Report offline, unidentified, entity-less and low-battery devices
    #[command(alias = "diag")]
    Diagnose(DiagnoseArgs),

    /// Bulk-rename devices from a CSV file
    Names(NamesArgs),

    /// Print device listing, then stream hub events until Ctrl+C
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List Zigbee devices with battery level and last-seen time
    #[command(alias = "ls")]
    List {
        /// Also write the listing to this CSV file
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,
    },

    /// Export one CSV row per (device, entity) with an empty custom_name column
    Export {
        /// Output CSV file
        #[arg(long, value_name = "PATH", default_value = "zha_devices.csv")]
        csv: PathBuf,
    },

    /// Collapse an export file into a one-row-per-device rename template (offline)
    Template {
        /// Export CSV to read
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Template CSV to write
        #[arg(long, value_name = "PATH", default_value = "zha_rename_template.csv")]
        out: PathBuf,
    },

    /// Rename one device, optionally with its battery sensor
    Rename(RenameArgs),
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    #[command(flatten)]
    pub target: RenameTargetArgs,

    /// New device name
    #[arg(long)]
    pub name: String,

    /// New friendly name for the device's battery entity
    #[arg(long, value_name = "NAME")]
    pub battery_entity_name: Option<String>,

    /// Also rename the battery entity id to sensor.<device_name>_battery
    #[arg(long)]
    pub rename_entity_id: bool,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct RenameTargetArgs {
    /// Hardware (IEEE) address of the device
    #[arg(long)]
    pub ieee: Option<String>,

    /// Device registry id
    #[arg(long)]
    pub device_id: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DIAGNOSE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DiagnoseArgs {
    /// Flag battery readings strictly below this percentage (overrides profile)
    #[arg(long, value_name = "PERCENT")]
    pub battery_threshold: Option<f64>,

    /// Leave the coordinator out of the report
    #[arg(long)]
    pub skip_coordinator: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  NAMES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct NamesArgs {
    #[command(subcommand)]
    pub command: NamesCommand,
}

#[derive(Debug, Subcommand)]
pub enum NamesCommand {
    /// Plan renames from an `ieee;custom_name` CSV, confirm, and apply them
    Apply {
        /// CSV file with `ieee` and `custom_name` columns
        #[arg(long, value_name = "PATH")]
        csv: PathBuf,

        /// Print the plan and stop
        #[arg(long)]
        dry_run: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Event type to subscribe to (repeatable; default: zha_event and state_changed)
    #[arg(long = "event", value_name = "TYPE")]
    pub events: Vec<String>,

    /// Skip the device listing printed before streaming
    #[arg(long)]
    pub no_listing: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an access token in the system keyring (for --profile or the default)
    SetToken,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

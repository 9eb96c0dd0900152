//! Device command handlers.

use std::path::Path;

use chrono::{DateTime, Local, Utc};
use tabled::Tabled;

use zhactl_core::inventory::{self, DeviceSummary, ExportRow, TemplateRow};
use zhactl_core::rename::{self, BatteryOptions, BatteryOutcome, RenameOutcome, RenameTarget};
use zhactl_core::{HubConfig, IeeeAddress, JoinIndex, RegistryId, hub};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts, RenameArgs};
use crate::csv;
use crate::error::CliError;
use crate::output;

use super::util::{self, or_dash};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Custom name")]
    custom_name: String,
    #[tabled(rename = "IEEE")]
    ieee: String,
    #[tabled(rename = "NWK")]
    nwk: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Battery")]
    battery: String,
    #[tabled(rename = "Last seen")]
    last_seen: String,
}

fn local_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || "-".into(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

impl From<&DeviceSummary> for DeviceRow {
    fn from(d: &DeviceSummary) -> Self {
        Self {
            name: or_dash(d.name.as_deref()),
            custom_name: or_dash(d.custom_name.as_deref()),
            ieee: d.ieee.to_string(),
            nwk: d.nwk.map_or_else(|| "-".into(), |n| n.to_string()),
            model: or_dash(d.model.as_deref()),
            battery: d.battery.as_ref().map_or_else(|| "-".into(), ToString::to_string),
            last_seen: local_time(d.last_seen),
        }
    }
}

fn plain_line(d: &DeviceSummary) -> String {
    format!(
        "{}\t{}",
        d.ieee,
        d.custom_name.as_deref().or(d.name.as_deref()).unwrap_or("-")
    )
}

const LISTING_HEADERS: [&str; 11] = [
    "name",
    "custom_name",
    "ieee",
    "nwk",
    "manufacturer",
    "model",
    "power_source",
    "available",
    "battery",
    "battery_entity",
    "last_seen",
];

fn listing_fields(d: &DeviceSummary) -> [String; 11] {
    [
        d.name.clone().unwrap_or_default(),
        d.custom_name.clone().unwrap_or_default(),
        d.ieee.to_string(),
        d.nwk.map(|n| n.to_string()).unwrap_or_default(),
        d.manufacturer.clone().unwrap_or_default(),
        d.model.clone().unwrap_or_default(),
        d.power_source.clone().unwrap_or_default(),
        d.available.to_string(),
        d.battery.as_ref().map(ToString::to_string).unwrap_or_default(),
        d.battery
            .as_ref()
            .map(|b| b.entity_id.clone())
            .unwrap_or_default(),
        d.last_seen.map(|t| t.to_rfc3339()).unwrap_or_default(),
    ]
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(args: DevicesArgs, hub: &HubConfig, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List { csv } => list(hub, global, csv.as_deref()).await,
        DevicesCommand::Export { csv } => export(hub, global, &csv).await,
        DevicesCommand::Template { input, out } => template(&input, &out, global),
        DevicesCommand::Rename(args) => rename(&args, hub, global).await,
    }
}

/// Fetch and summarize every device, in topology order.
pub async fn summaries(hub: &HubConfig, global: &GlobalOpts) -> Result<Vec<DeviceSummary>, CliError> {
    let snapshot = util::load_snapshot(hub, global).await?;
    let index = JoinIndex::new(&snapshot, &hub.identifier_domain);
    Ok(index.views().iter().map(inventory::summarize).collect())
}

pub fn render_summaries(devices: &[DeviceSummary], global: &GlobalOpts) -> Result<String, CliError> {
    output::render_list(&global.output, devices, |d| DeviceRow::from(d), plain_line)
}

async fn list(hub: &HubConfig, global: &GlobalOpts, csv_path: Option<&Path>) -> Result<(), CliError> {
    let devices = summaries(hub, global).await?;
    output::print_output(&render_summaries(&devices, global)?, global.quiet);

    if let Some(path) = csv_path {
        let rows: Vec<[String; 11]> = devices.iter().map(listing_fields).collect();
        csv::write_file(
            path,
            &LISTING_HEADERS,
            rows.iter().map(|r| r.iter().map(String::as_str)),
        )?;
        if !global.quiet {
            eprintln!("✓ Wrote {} devices to {}", devices.len(), path.display());
        }
    }
    Ok(())
}

async fn export(hub: &HubConfig, global: &GlobalOpts, path: &Path) -> Result<(), CliError> {
    let snapshot = util::load_snapshot(hub, global).await?;
    let coordinator = hub.coordinator.locate(&snapshot.devices);
    let rows = inventory::export_rows(&snapshot.devices, coordinator.as_ref());

    csv::write_file(path, &ExportRow::HEADERS, rows.iter().map(ExportRow::fields))?;
    if !global.quiet {
        let devices = snapshot
            .devices
            .iter()
            .filter(|d| Some(&d.ieee) != coordinator.as_ref())
            .count();
        eprintln!(
            "✓ Exported {} rows for {devices} devices to {}",
            rows.len(),
            path.display()
        );
        eprintln!("  Fill in custom_name, then run: zhactl names apply --csv <file>");
    }
    Ok(())
}

/// Offline: collapse an export file into a rename template.
pub fn template(input: &Path, out: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    let rows = csv::read_export(input)?;
    let read = rows.len();
    let template = inventory::rename_template(rows);

    csv::write_file(out, &TemplateRow::HEADERS, template.iter().map(TemplateRow::fields))?;
    if !global.quiet {
        eprintln!(
            "✓ Collapsed {read} rows into {} devices in {}",
            template.len(),
            out.display()
        );
    }
    Ok(())
}

fn rename_detail(o: &RenameOutcome) -> String {
    let mut lines = vec![
        format!("Device:   {}", o.registry_id),
        format!("Old name: {}", or_dash(o.old_name.as_deref())),
        format!("New name: {}", o.new_name),
    ];
    match &o.battery {
        BatteryOutcome::NotRequested => {}
        BatteryOutcome::NotFound => lines.push("Battery:  no battery entity found".into()),
        BatteryOutcome::Updated {
            old_entity_id,
            entity_id,
            name,
        } => {
            if old_entity_id == entity_id {
                lines.push(format!("Battery:  {entity_id}"));
            } else {
                lines.push(format!("Battery:  {old_entity_id} -> {entity_id}"));
            }
            if let Some(name) = name {
                lines.push(format!("          name: {name}"));
            }
        }
    }
    lines.join("\n")
}

async fn rename(args: &RenameArgs, config: &HubConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let target = match (&args.target.ieee, &args.target.device_id) {
        (Some(ieee), _) => RenameTarget::Ieee(IeeeAddress::new(ieee)),
        (None, Some(id)) => RenameTarget::RegistryId(RegistryId::from(id.as_str())),
        (None, None) => {
            return Err(CliError::Validation {
                field: "target".into(),
                reason: "pass --ieee or --device-id".into(),
            });
        }
    };
    let battery = BatteryOptions {
        name: args.battery_entity_name.clone(),
        rename_entity_id: args.rename_entity_id,
    };

    let outcome = hub::with_client(config, async |rpc| {
        let snapshot = zhactl_core::fetch_snapshot(rpc).await?;
        let index = JoinIndex::new(&snapshot, &config.identifier_domain);
        rename::rename_device(rpc, &index, &target, &args.name, &battery).await
    })
    .await?;

    let out = output::render_single(&global.output, &outcome, rename_detail, |o| {
        format!("{}\t{}", o.registry_id, o.new_name)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

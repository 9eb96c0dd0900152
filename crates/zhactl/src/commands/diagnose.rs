//! `diagnose` handler: health report over the joined snapshot.

use std::fmt::Write as _;

use zhactl_core::diagnose::{BatteryFinding, DeviceRef, EntityFinding};
use zhactl_core::{HubConfig, JoinIndex, Report, diagnose};

use crate::cli::{DiagnoseArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

pub async fn handle(args: &DiagnoseArgs, hub: &HubConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let threshold = match args.battery_threshold {
        Some(t) => zhactl_config::validate_threshold(t)?,
        None => hub.battery_threshold,
    };

    let snapshot = util::load_snapshot(hub, global).await?;
    let index = JoinIndex::new(&snapshot, &hub.identifier_domain);
    let mut views = index.views();
    if args.skip_coordinator {
        if let Some(coordinator) = index.coordinator(&hub.coordinator) {
            views.retain(|v| *v.ieee() != coordinator);
        }
    }

    let report = diagnose(&views, threshold);
    let painter = Painter::new(&global.color);
    let out = match global.output {
        OutputFormat::Table => render_text(&report, painter),
        OutputFormat::Plain => render_plain(&report),
        _ => output::render_single(&global.output, &report, |_| String::new(), |_| String::new())?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn device_line(d: &DeviceRef) -> String {
    format!(
        "{} ({}) {} / {}",
        d.name,
        d.ieee,
        util::or_dash(d.manufacturer.as_deref()),
        util::or_dash(d.model.as_deref())
    )
}

fn entity_line(e: &EntityFinding) -> String {
    format!("{}: {} = {}", e.device_name, e.entity_id, e.state)
}

fn battery_line(b: &BatteryFinding) -> String {
    format!(
        "{}: {} {}{}",
        b.device_name,
        b.entity_id,
        b.level,
        b.unit.as_deref().unwrap_or_default()
    )
}

fn section<T>(out: &mut String, title: &str, items: &[T], line: impl Fn(&T) -> String, mark: &str) {
    let _ = writeln!(out, "{title} ({})", items.len());
    if items.is_empty() {
        let _ = writeln!(out, "  none");
    }
    for item in items {
        let _ = writeln!(out, "  {mark} {}", line(item));
    }
    let _ = writeln!(out);
}

/// Human-readable report, one section per issue category.
fn render_text(report: &Report, painter: Painter) -> String {
    let mut out = String::new();
    let bad = painter.bad("●");
    let warn = painter.warn("●");

    section(&mut out, "Offline devices", &report.offline, device_line, &bad);
    section(
        &mut out,
        "Unknown manufacturer/model",
        &report.unknown_identity,
        device_line,
        &warn,
    );
    section(&mut out, "Devices without entities", &report.no_entities, device_line, &warn);
    section(&mut out, "Unavailable entities", &report.unavailable, entity_line, &bad);
    section(
        &mut out,
        &format!("Low battery (< {}%)", report.battery_threshold),
        &report.low_battery,
        battery_line,
        &bad,
    );

    let affected = report.affected().count();
    let summary = if affected == 0 {
        painter.good(&format!("All {} devices healthy", report.devices.len()))
    } else {
        painter.bad(&format!(
            "{affected} of {} devices need attention",
            report.devices.len()
        ))
    };
    let _ = write!(out, "{summary}");
    out
}

/// `ieee<TAB>issue,issue` per affected device.
fn render_plain(report: &Report) -> String {
    report
        .affected()
        .map(|d| {
            let issues: Vec<&'static str> = d.issues.iter().map(|i| (*i).into()).collect();
            format!("{}\t{}", d.device.ieee, issues.join(","))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

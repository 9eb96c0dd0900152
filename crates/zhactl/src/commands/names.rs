//! `names apply`: plan renames from a CSV file, confirm, apply.

use std::path::Path;

use tabled::Tabled;

use zhactl_core::{HubConfig, JoinIndex, Plan, PlannedChange, fetch_snapshot, hub, plan};

use crate::cli::{GlobalOpts, NamesArgs, NamesCommand};
use crate::csv;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "IEEE")]
    ieee: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "New")]
    new: String,
}

impl From<&PlannedChange> for ChangeRow {
    fn from(c: &PlannedChange) -> Self {
        Self {
            ieee: c.ieee.to_string(),
            current: util::or_dash(c.old_name.as_deref()),
            new: c.new_name.clone(),
        }
    }
}

pub async fn handle(args: NamesArgs, config: &HubConfig, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        NamesCommand::Apply { csv, dry_run } => apply(&csv, dry_run, config, global).await,
    }
}

/// Skip counts as `reason: n` lines, omitting zeros.
fn skip_summary(plan: &Plan) -> String {
    plan.skipped
        .breakdown()
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(reason, n)| format!("  skipped {n}: {}", reason.describe()))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn apply(path: &Path, dry_run: bool, config: &HubConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let requests = csv::read_change_requests(path)?;

    let bar = output::spinner("Reading devices from hub...", global.quiet);
    let planned = hub::with_client(config, async |rpc| {
        let snapshot = fetch_snapshot(rpc).await?;
        let index = JoinIndex::new(&snapshot, &config.identifier_domain);
        let coordinator = index.coordinator(&config.coordinator);
        Ok(plan::plan(&requests, &index, coordinator.as_ref()))
    })
    .await;
    bar.finish_and_clear();
    let planned = planned?;

    let out = output::render_list(
        &global.output,
        &planned.changes,
        |c| ChangeRow::from(c),
        |c| format!("{}\t{}", c.ieee, c.new_name),
    )?;
    output::print_output(&out, global.quiet);
    if !global.quiet {
        eprintln!(
            "{} rows read, {} renames planned, {} skipped",
            requests.len(),
            planned.changes.len(),
            planned.skipped.total()
        );
        let skips = skip_summary(&planned);
        if !skips.is_empty() {
            eprintln!("{skips}");
        }
    }

    if planned.is_empty() {
        if !global.quiet {
            eprintln!("Nothing to rename.");
        }
        return Ok(());
    }
    if dry_run {
        return Ok(());
    }

    let prompt = format!("Apply {} renames?", planned.changes.len());
    if !util::confirm(&prompt, "names apply", global.yes)? {
        eprintln!("Aborted.");
        return Ok(());
    }

    let total = planned.changes.len();
    let applied = hub::with_client(config, async |rpc| plan::apply(rpc, &planned.changes).await)
        .await
        .map_err(|e| CliError::from_apply(e, total))?;

    if !global.quiet {
        eprintln!("✓ Renamed {} of {total} devices", applied.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zhactl_core::SkipStats;

    #[test]
    fn skip_summary_omits_zero_counts() {
        let plan = Plan {
            changes: Vec::new(),
            skipped: SkipStats {
                coordinator: 1,
                empty_name: 3,
                ..SkipStats::default()
            },
        };
        let text = skip_summary(&plan);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("skipped 3:"));
    }
}

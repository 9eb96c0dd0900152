// ── Device inventory ──
//
// Flat, printable summaries of the joined snapshot: one line per device
// for listings, one row per (device, entity) for exports, and the collapsed
// one-row-per-device rename template.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{Device, DeviceView, EntityView, IeeeAddress, NwkAddress};

// ── Listing ─────────────────────────────────────────────────────────

/// A battery level read from a live entity state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatteryReading {
    pub entity_id: String,
    pub state: String,
    pub unit: Option<String>,
}

impl fmt::Display for BatteryReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.state, self.unit.as_deref().unwrap_or_default())
    }
}

/// One device, as shown by `devices list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSummary {
    /// Name reported by the coordinator.
    pub name: Option<String>,
    /// Registry display name.
    pub custom_name: Option<String>,
    pub ieee: IeeeAddress,
    pub nwk: Option<NwkAddress>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub power_source: Option<String>,
    pub available: bool,
    pub battery: Option<BatteryReading>,
    pub last_seen: Option<DateTime<Utc>>,
    pub registry_id: Option<String>,
    pub entity_count: usize,
}

fn is_percent(unit: Option<&str>) -> bool {
    unit.is_some_and(|u| u == "%" || u.eq_ignore_ascii_case("percent"))
}

fn reading(entity: &EntityView<'_>) -> Option<BatteryReading> {
    let status = entity.status.filter(|s| !s.is_unavailable())?;
    let unit = status.unit();
    let battery_class = entity
        .category()
        .is_some_and(|c| c.eq_ignore_ascii_case("battery"));
    let all_digits = !status.state.is_empty() && status.state.bytes().all(|b| b.is_ascii_digit());
    let battery_named = entity.entity_id().as_str().contains("battery");

    let usable = (battery_class && (is_percent(unit) || all_digits))
        || (battery_named && is_percent(unit));
    usable.then(|| BatteryReading {
        entity_id: entity.entity_id().to_string(),
        state: status.state.clone(),
        unit: unit.map(str::to_owned),
    })
}

/// The device's battery level: the first entity classed as `battery` with a
/// percentage (or bare integer) state, else the first entity named
/// `*battery*` with a percentage unit. Unavailable states never count.
pub fn battery_reading(view: &DeviceView<'_>) -> Option<BatteryReading> {
    view.entities.iter().find_map(reading)
}

pub fn summarize(view: &DeviceView<'_>) -> DeviceSummary {
    let device = view.device;
    DeviceSummary {
        name: device.name.clone().or_else(|| device.user_given_name.clone()),
        custom_name: view
            .record
            .and_then(|r| r.display_name())
            .map(str::to_owned),
        ieee: device.ieee.clone(),
        nwk: device.nwk,
        manufacturer: view.manufacturer().map(str::to_owned),
        model: view.model().map(str::to_owned),
        power_source: device.power_source.clone(),
        available: device.available,
        battery: battery_reading(view),
        last_seen: device.last_seen,
        registry_id: view.registry_id().map(ToString::to_string),
        entity_count: view.entities.len(),
    }
}

// ── Export ──────────────────────────────────────────────────────────

/// One (device, entity) row of the export file. `custom_name` is always
/// empty; it is the column users fill in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub ieee: String,
    pub nwk: String,
    pub model: String,
    pub device_name: String,
    pub entity_id: String,
    pub entity_name: String,
    pub domain: String,
    pub custom_name: String,
}

impl ExportRow {
    pub const HEADERS: [&'static str; 8] = [
        "ieee",
        "nwk",
        "model",
        "device_name",
        "entity_id",
        "entity_name",
        "domain",
        "custom_name",
    ];

    pub fn fields(&self) -> [&str; 8] {
        [
            &self.ieee,
            &self.nwk,
            &self.model,
            &self.device_name,
            &self.entity_id,
            &self.entity_name,
            &self.domain,
            &self.custom_name,
        ]
    }
}

/// Rows for every topology device except `coordinator`. Devices without
/// embedded entities get one row with blank entity columns.
pub fn export_rows(devices: &[Device], coordinator: Option<&IeeeAddress>) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for device in devices {
        if coordinator == Some(&device.ieee) {
            continue;
        }
        let base = ExportRow {
            ieee: device.ieee.to_string(),
            nwk: device.nwk.map(|n| n.to_string()).unwrap_or_default(),
            model: device.model.clone().unwrap_or_default(),
            device_name: device
                .user_given_name
                .clone()
                .or_else(|| device.name.clone())
                .unwrap_or_default(),
            ..ExportRow::default()
        };

        if device.entities.is_empty() {
            rows.push(base);
            continue;
        }
        for entity in &device.entities {
            rows.push(ExportRow {
                entity_id: entity.entity_id.to_string(),
                entity_name: entity.name.clone().unwrap_or_default(),
                domain: entity.entity_id.domain().to_owned(),
                ..base.clone()
            });
        }
    }
    rows
}

// ── Rename template ─────────────────────────────────────────────────

/// One row per device: `ieee;model;device_name;custom_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRow {
    pub ieee: String,
    pub model: String,
    pub device_name: String,
    pub custom_name: String,
}

impl TemplateRow {
    pub const HEADERS: [&'static str; 4] = ["ieee", "model", "device_name", "custom_name"];

    pub fn fields(&self) -> [&str; 4] {
        [&self.ieee, &self.model, &self.device_name, &self.custom_name]
    }
}

/// Collapse export rows to one row per device. The first row for each
/// address wins; rows without an address are dropped; `custom_name` is
/// cleared.
pub fn rename_template<I>(rows: I) -> Vec<TemplateRow>
where
    I: IntoIterator<Item = TemplateRow>,
{
    let mut by_ieee: IndexMap<IeeeAddress, TemplateRow> = IndexMap::new();
    for row in rows {
        let ieee = IeeeAddress::new(&row.ieee);
        if ieee.is_empty() {
            continue;
        }
        by_ieee.entry(ieee.clone()).or_insert_with(|| TemplateRow {
            ieee: ieee.to_string(),
            model: row.model,
            device_name: row.device_name,
            custom_name: String::new(),
        });
    }
    by_ieee.into_values().collect()
}

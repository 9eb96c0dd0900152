// ── Diagnostic engine ──
//
// Evaluates independent health predicates over joined device views. Every
// predicate runs for every device; a device can collect several issues.

use serde::Serialize;
use strum::{Display, IntoStaticStr};

use crate::model::{DeviceView, IeeeAddress};

/// Device-level issue category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Issue {
    /// The coordinator reports the device as unavailable.
    Offline,
    /// Manufacturer or model is missing or a placeholder (`unk...`).
    UnknownIdentity,
    /// No entities are attached to the device's registry record.
    NoEntities,
    /// At least one entity reports `unavailable` or `unknown`.
    UnavailableEntities,
    /// At least one battery entity is below the threshold.
    LowBattery,
}

impl Issue {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::UnknownIdentity => "unknown manufacturer/model",
            Self::NoEntities => "no entities",
            Self::UnavailableEntities => "unavailable entities",
            Self::LowBattery => "low battery",
        }
    }
}

/// Identity of a device as printed in a report line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRef {
    pub ieee: IeeeAddress,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

/// An entity whose status is `unavailable` / `unknown`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityFinding {
    pub ieee: IeeeAddress,
    pub device_name: String,
    pub entity_id: String,
    pub state: String,
}

/// A battery entity reading below the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryFinding {
    pub ieee: IeeeAddress,
    pub device_name: String,
    pub entity_id: String,
    pub level: f64,
    pub unit: Option<String>,
}

/// Findings for one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceReport {
    #[serde(flatten)]
    pub device: DeviceRef,
    pub registry_id: Option<String>,
    pub issues: Vec<Issue>,
    pub unavailable: Vec<EntityFinding>,
    pub low_battery: Vec<BatteryFinding>,
}

impl DeviceReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Outcome of a diagnostic run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub battery_threshold: f64,
    /// One entry per input view, in input order.
    pub devices: Vec<DeviceReport>,
    pub offline: Vec<DeviceRef>,
    pub unknown_identity: Vec<DeviceRef>,
    pub no_entities: Vec<DeviceRef>,
    pub unavailable: Vec<EntityFinding>,
    pub low_battery: Vec<BatteryFinding>,
}

impl Report {
    /// Devices with at least one issue.
    pub fn affected(&self) -> impl Iterator<Item = &DeviceReport> {
        self.devices.iter().filter(|d| !d.is_healthy())
    }

    pub fn is_clean(&self) -> bool {
        self.devices.iter().all(DeviceReport::is_healthy)
    }
}

/// `true` when the string is absent, blank, or starts with `unk`
/// (case-insensitive), the prefix hubs use for unidentified hardware.
fn is_placeholder(value: Option<&str>) -> bool {
    value.is_none_or(|v| {
        let v = v.trim();
        v.is_empty() || v.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("unk"))
    })
}

/// Run every predicate over `views`.
///
/// Battery readings are compared strictly: a level equal to
/// `battery_threshold` is fine. Non-numeric readings are skipped.
/// Entities with no status are skipped by both per-entity predicates.
pub fn diagnose(views: &[DeviceView<'_>], battery_threshold: f64) -> Report {
    let mut report = Report {
        battery_threshold,
        devices: Vec::with_capacity(views.len()),
        offline: Vec::new(),
        unknown_identity: Vec::new(),
        no_entities: Vec::new(),
        unavailable: Vec::new(),
        low_battery: Vec::new(),
    };

    for view in views {
        let name = view.display_name().to_owned();
        let device = DeviceRef {
            ieee: view.ieee().clone(),
            name: name.clone(),
            manufacturer: view.manufacturer().map(str::to_owned),
            model: view.model().map(str::to_owned),
        };
        let mut issues = Vec::new();

        if !view.device.available {
            issues.push(Issue::Offline);
            report.offline.push(device.clone());
        }

        if is_placeholder(view.manufacturer()) || is_placeholder(view.model()) {
            issues.push(Issue::UnknownIdentity);
            report.unknown_identity.push(device.clone());
        }

        if view.entities.is_empty() {
            issues.push(Issue::NoEntities);
            report.no_entities.push(device.clone());
        }

        let mut unavailable = Vec::new();
        let mut low_battery = Vec::new();
        for entity in &view.entities {
            let Some(status) = entity.status else {
                continue;
            };

            if status.is_unavailable() {
                unavailable.push(EntityFinding {
                    ieee: device.ieee.clone(),
                    device_name: name.clone(),
                    entity_id: entity.entity_id().to_string(),
                    state: status.state.clone(),
                });
            }

            if entity.is_battery() {
                if let Some(level) = status.numeric().filter(|l| *l < battery_threshold) {
                    low_battery.push(BatteryFinding {
                        ieee: device.ieee.clone(),
                        device_name: name.clone(),
                        entity_id: entity.entity_id().to_string(),
                        level,
                        unit: status.unit().map(str::to_owned),
                    });
                }
            }
        }

        if !unavailable.is_empty() {
            issues.push(Issue::UnavailableEntities);
            report.unavailable.extend(unavailable.iter().cloned());
        }
        if !low_battery.is_empty() {
            issues.push(Issue::LowBattery);
            report.low_battery.extend(low_battery.iter().cloned());
        }

        report.devices.push(DeviceReport {
            device,
            registry_id: view.registry_id().map(ToString::to_string),
            issues,
            unavailable,
            low_battery,
        });
    }

    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::CoordinatorRule;
    use crate::join;
    use crate::model::{
        Device, EntityRecord, NwkAddress, RegistryId, RegistryRecord, Snapshot, StatusSnapshot,
    };
    use pretty_assertions::assert_eq;

    const IEEE: &str = "00:15:8d:00:01:02:03:04";

    fn device(manufacturer: &str, model: &str) -> Device {
        let mut d = Device::new(IEEE);
        d.manufacturer = Some(manufacturer.into());
        d.model = Some(model.into());
        d
    }

    fn registered(device: Device, entities: Vec<(&str, Option<&str>)>) -> Snapshot {
        let mut record = RegistryRecord::new("dev1");
        record.identifiers.push(("zha".into(), device.ieee.to_string()));
        record.name_by_user = Some("Hall sensor".into());

        let mut records = Vec::new();
        let mut statuses = Vec::new();
        for (id, state) in entities {
            records.push(EntityRecord::new(id, Some(RegistryId::from("dev1"))));
            if let Some(state) = state {
                statuses.push(StatusSnapshot::new(id, state));
            }
        }
        Snapshot::new(vec![device], vec![record], records, statuses)
    }

    fn run(snapshot: &Snapshot, threshold: f64) -> Report {
        diagnose(&join::build(snapshot, "zha"), threshold)
    }

    #[test]
    fn healthy_device_has_no_issues() {
        let snapshot = registered(
            device("LUMI", "lumi.sensor_motion"),
            vec![("binary_sensor.hall_motion", Some("off")), ("sensor.hall_battery", Some("80"))],
        );
        let report = run(&snapshot, 25.0);
        assert!(report.is_clean());
        assert_eq!(report.devices.len(), 1);
        assert_eq!(report.devices[0].device.name, "Hall sensor");
    }

    #[test]
    fn predicates_are_independent() {
        let mut dev = device("LUMI", "unknown");
        dev.available = false;
        let snapshot = registered(
            dev,
            vec![
                ("sensor.hall_battery", Some("12")),
                ("binary_sensor.hall_motion", Some("unavailable")),
            ],
        );
        let report = run(&snapshot, 25.0);
        assert_eq!(
            report.devices[0].issues,
            vec![
                Issue::Offline,
                Issue::UnknownIdentity,
                Issue::UnavailableEntities,
                Issue::LowBattery
            ]
        );
        assert_eq!(report.offline.len(), 1);
        assert_eq!(report.unknown_identity.len(), 1);
        assert_eq!(report.unavailable[0].entity_id, "binary_sensor.hall_motion");
        assert!((report.low_battery[0].level - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn battery_threshold_is_strict() {
        let snapshot = registered(
            device("LUMI", "lumi.weather"),
            vec![
                ("sensor.a_battery", Some("24")),
                ("sensor.b_battery", Some("25")),
                ("sensor.c_battery", Some("N/A")),
                ("sensor.d_battery", None),
            ],
        );
        let report = run(&snapshot, 25.0);
        let flagged: Vec<_> = report.low_battery.iter().map(|b| b.entity_id.as_str()).collect();
        assert_eq!(flagged, vec!["sensor.a_battery"]);
        assert!(report.unavailable.is_empty());
    }

    #[test]
    fn battery_by_declared_or_attribute_category() {
        let mut snapshot = registered(
            device("IKEA of Sweden", "TRADFRI remote control"),
            vec![("sensor.remote_power", Some("10")), ("sensor.remote_level", Some("5"))],
        );
        snapshot.entities[0].category = Some("battery".into());
        snapshot.statuses[1] = StatusSnapshot::new("sensor.remote_level", "5")
            .with_attribute("device_class", "Battery");

        let report = run(&snapshot, 25.0);
        assert_eq!(report.low_battery.len(), 2);
    }

    #[test]
    fn non_battery_numeric_entities_are_ignored() {
        let snapshot = registered(
            device("LUMI", "lumi.weather"),
            vec![("sensor.hall_temperature", Some("3.5"))],
        );
        assert!(run(&snapshot, 25.0).low_battery.is_empty());
    }

    #[test]
    fn unknown_identity_variants() {
        assert!(is_placeholder(None));
        assert!(is_placeholder(Some("")));
        assert!(is_placeholder(Some("  ")));
        assert!(is_placeholder(Some("UNK_MANUFACTURER")));
        assert!(is_placeholder(Some("Unknown")));
        assert!(!is_placeholder(Some("LUMI")));
        assert!(!is_placeholder(Some("un")));
    }

    #[test]
    fn bare_coordinator_is_entity_less_and_unidentified() {
        let mut coord = Device::new("AA");
        coord.nwk = Some(NwkAddress::COORDINATOR);
        let snapshot = Snapshot::new(vec![coord], vec![], vec![], vec![]);
        let report = run(&snapshot, 25.0);

        assert!(report.offline.is_empty());
        assert!(report.unavailable.is_empty());
        assert!(report.low_battery.is_empty());
        assert_eq!(report.no_entities.len(), 1);
        assert_eq!(report.no_entities[0].name, "aa");
        assert!(report.devices[0].registry_id.is_none());
        // A missing manufacturer counts as unknown identity, coordinator included.
        assert_eq!(report.unknown_identity.len(), 1);
        assert_eq!(report.unknown_identity[0].ieee, IeeeAddress::new("AA"));
    }

    #[test]
    fn excluded_coordinator_produces_empty_report() {
        let mut coord = Device::new("AA");
        coord.nwk = Some(NwkAddress::COORDINATOR);
        let snapshot = Snapshot::new(vec![coord], vec![], vec![], vec![]);
        let index = join::JoinIndex::new(&snapshot, "zha");
        let skip = CoordinatorRule::Address(IeeeAddress::new("AA"));
        let coordinator = index.coordinator(&skip);

        let views: Vec<_> = index
            .views()
            .into_iter()
            .filter(|v| Some(v.ieee()) != coordinator.as_ref())
            .collect();
        let report = diagnose(&views, 25.0);
        assert!(report.devices.is_empty());
        assert!(report.no_entities.is_empty());
    }

    #[test]
    fn issue_labels() {
        assert_eq!(Issue::LowBattery.to_string(), "low_battery");
        assert_eq!(Issue::UnknownIdentity.describe(), "unknown manufacturer/model");
        assert_eq!(
            serde_json::to_value(Issue::NoEntities).unwrap(),
            serde_json::json!("no_entities")
        );
    }
}

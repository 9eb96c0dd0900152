// ── Single-device rename ──
//
// Renames one device in the registry and, optionally, the battery sensor
// that belongs to it.

use serde::Serialize;
use tracing::info;

use zhactl_api::{EntityRegistryUpdate, RpcClient};

use crate::error::CoreError;
use crate::join::JoinIndex;
use crate::model::{EntityRecord, IeeeAddress, RegistryId, RegistryRecord};

/// How the device to rename is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameTarget {
    Ieee(IeeeAddress),
    RegistryId(RegistryId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatteryOptions {
    /// New friendly name for the battery entity.
    pub name: Option<String>,
    /// Also move the battery entity to `sensor.<slug>_battery`.
    pub rename_entity_id: bool,
}

impl BatteryOptions {
    pub fn is_requested(&self) -> bool {
        self.name.is_some() || self.rename_entity_id
    }
}

/// What happened to the battery entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatteryOutcome {
    NotRequested,
    NotFound,
    Updated {
        old_entity_id: String,
        entity_id: String,
        name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    pub registry_id: RegistryId,
    pub old_name: Option<String>,
    pub new_name: String,
    pub battery: BatteryOutcome,
}

/// Find the registry record for `target`.
///
/// An address resolves through the registry's identifiers first, then
/// through the topology device's own registry reference. An address the
/// topology knows but the registry does not is a ghost.
pub fn resolve_target<'a>(
    index: &JoinIndex<'a>,
    target: &RenameTarget,
) -> Result<&'a RegistryRecord, CoreError> {
    match target {
        RenameTarget::RegistryId(id) => {
            index
                .record_by_id(id.as_str())
                .ok_or_else(|| CoreError::DeviceNotFound {
                    identifier: id.to_string(),
                })
        }
        RenameTarget::Ieee(ieee) => {
            if let Some(record) = index.record_by_ieee(ieee) {
                return Ok(record);
            }
            let device = index
                .device_by_ieee(ieee)
                .ok_or_else(|| CoreError::DeviceNotFound {
                    identifier: ieee.to_string(),
                })?;
            device
                .device_reg_id
                .as_ref()
                .and_then(|id| index.record_by_id(id.as_str()))
                .ok_or_else(|| CoreError::GhostDevice {
                    ieee: ieee.to_string(),
                })
        }
    }
}

/// `true` for identifiers that look like a battery sensor.
fn looks_like_battery(entity: &EntityRecord) -> bool {
    let id = entity.entity_id.as_str();
    id.contains(":battery_")
        || id.ends_with("_battery")
        || entity.entity_id.object_id().ends_with("battery")
        || (entity.entity_id.domain() == "sensor" && id.contains("battery"))
}

/// The first entity of `record` that looks like a battery sensor.
pub fn find_battery_entity<'a>(
    index: &JoinIndex<'a>,
    record: &RegistryRecord,
) -> Option<&'a EntityRecord> {
    index
        .entities_of(record)
        .into_iter()
        .map(|view| view.record)
        .find(|entity| looks_like_battery(entity))
}

/// Entity-id slug for a device name: lowercase ASCII alphanumerics with
/// single underscores between words.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// `sensor.<slug>_battery`, or `None` if the name has no usable characters.
pub fn battery_entity_id(device_name: &str) -> Option<String> {
    let slug = slugify(device_name);
    (!slug.is_empty()).then(|| format!("sensor.{slug}_battery"))
}

/// Rename the device `target` to `name`, then apply `battery` to its
/// battery entity if one is found.
///
/// The device rename is not undone if the battery update fails.
pub async fn rename_device(
    rpc: &mut RpcClient,
    index: &JoinIndex<'_>,
    target: &RenameTarget,
    name: &str,
    battery: &BatteryOptions,
) -> Result<RenameOutcome, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "device name must not be empty".into(),
        });
    }
    let new_entity_id = if battery.rename_entity_id {
        Some(battery_entity_id(name).ok_or_else(|| CoreError::ValidationFailed {
            message: format!("cannot derive an entity id from '{name}'"),
        })?)
    } else {
        None
    };

    let record = resolve_target(index, target)?;
    rpc.update_device_registry(record.id.as_str(), Some(name))
        .await?;
    info!(device = %record.id, name, "Renamed device");

    let battery_outcome = if battery.is_requested() {
        match find_battery_entity(index, record) {
            Some(entity) => {
                let update = EntityRegistryUpdate {
                    entity_id: entity.entity_id.to_string(),
                    name: battery.name.clone(),
                    new_entity_id,
                };
                let entry = rpc.update_entity_registry(&update).await?;
                info!(
                    from = %entity.entity_id,
                    to = %entry.entity_id,
                    "Updated battery entity"
                );
                BatteryOutcome::Updated {
                    old_entity_id: entity.entity_id.to_string(),
                    entity_id: entry.entity_id,
                    name: entry.name,
                }
            }
            None => BatteryOutcome::NotFound,
        }
    } else {
        BatteryOutcome::NotRequested
    };

    Ok(RenameOutcome {
        registry_id: record.id.clone(),
        old_name: record.name_by_user.clone(),
        new_name: name.to_owned(),
        battery: battery_outcome,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Device, Snapshot};

    const DOOR: &str = "00:15:8d:00:01:02:03:04";

    fn snapshot() -> Snapshot {
        let mut door = RegistryRecord::new("dev-door");
        door.identifiers.push(("zha".into(), DOOR.into()));
        let mut orphan = Device::new("00:15:8d:00:0f:0f:0f:0f");
        orphan.device_reg_id = Some(RegistryId::from("dev-orphan"));
        let mut ghost = Device::new("00:15:8d:00:09:09:09:09");
        ghost.device_reg_id = Some(RegistryId::from("deleted"));

        Snapshot::new(
            vec![Device::new(DOOR), orphan, ghost],
            vec![door, RegistryRecord::new("dev-orphan")],
            vec![
                EntityRecord::new("binary_sensor.lumi_door", Some("dev-door".into())),
                EntityRecord::new("sensor.lumi_door_power", Some("dev-door".into())),
                EntityRecord::new("sensor.lumi_door_battery", Some("dev-door".into())),
            ],
            vec![],
        )
    }

    #[test]
    fn resolve_by_address_and_id() {
        let snapshot = snapshot();
        let index = JoinIndex::new(&snapshot, "zha");

        let by_ieee = resolve_target(&index, &RenameTarget::Ieee(DOOR.to_uppercase().into()));
        assert_eq!(by_ieee.unwrap().id.as_str(), "dev-door");

        let by_id = resolve_target(&index, &RenameTarget::RegistryId("dev-door".into()));
        assert_eq!(by_id.unwrap().id.as_str(), "dev-door");
    }

    #[test]
    fn resolve_through_topology_reference() {
        let snapshot = snapshot();
        let index = JoinIndex::new(&snapshot, "zha");
        let target = RenameTarget::Ieee("00:15:8d:00:0f:0f:0f:0f".into());
        assert_eq!(
            resolve_target(&index, &target).unwrap().id.as_str(),
            "dev-orphan"
        );
    }

    #[test]
    fn resolve_failures() {
        let snapshot = snapshot();
        let index = JoinIndex::new(&snapshot, "zha");

        let ghost = RenameTarget::Ieee("00:15:8d:00:09:09:09:09".into());
        assert!(matches!(
            resolve_target(&index, &ghost),
            Err(CoreError::GhostDevice { .. })
        ));

        let missing = RenameTarget::Ieee("ff:ff".into());
        assert!(matches!(
            resolve_target(&index, &missing),
            Err(CoreError::DeviceNotFound { .. })
        ));

        let bad_id = RenameTarget::RegistryId("nope".into());
        assert!(matches!(
            resolve_target(&index, &bad_id),
            Err(CoreError::DeviceNotFound { .. })
        ));
    }

    #[test]
    fn battery_entity_is_first_match() {
        let snapshot = snapshot();
        let index = JoinIndex::new(&snapshot, "zha");
        let record = index.record_by_id("dev-door").unwrap();
        assert_eq!(
            find_battery_entity(&index, record).unwrap().entity_id.as_str(),
            "sensor.lumi_door_battery"
        );
        let orphan = index.record_by_id("dev-orphan").unwrap();
        assert!(find_battery_entity(&index, orphan).is_none());
    }

    #[test]
    fn battery_heuristics() {
        let looks = |id: &str| looks_like_battery(&EntityRecord::new(id, None));
        assert!(looks("sensor.door_battery"));
        assert!(looks("sensor.batterylevel"));
        assert!(looks("sensor.battery_voltage"));
        assert!(looks("sensor.0x00158d:battery_level"));
        assert!(!looks("binary_sensor.battery_low_flag"));
        assert!(!looks("switch.plug"));
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Front Door"), "front_door");
        assert_eq!(slugify("  Kid's room - sensor #2 "), "kid_s_room_sensor_2");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(
            battery_entity_id("Front Door").as_deref(),
            Some("sensor.front_door_battery")
        );
        assert_eq!(battery_entity_id("---"), None);
    }
}

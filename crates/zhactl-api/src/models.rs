// Wire types for the hub's WebSocket results
//
// These mirror the JSON the hub sends as closely as practical. Every field
// the tools do not strictly need is optional, and unknown fields are kept in
// `extra` so nothing is silently lost. `zhactl-core` converts these into its
// own domain model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Topology ────────────────────────────────────────────────────────

/// One device from `zha/devices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZhaDevice {
    #[serde(default)]
    pub ieee: String,

    /// Short network address. Sent as an integer by current hubs, as a
    /// string (`"0x1A2B"`, `"0000"`) by some older ones.
    #[serde(default)]
    pub nwk: Option<Value>,

    #[serde(default)]
    pub manufacturer: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub user_given_name: Option<String>,

    /// Absent on some device types; treat absence as available.
    #[serde(default)]
    pub available: Option<bool>,

    #[serde(default)]
    pub power_source: Option<String>,

    /// ISO-8601 string or epoch seconds, depending on hub version.
    #[serde(default)]
    pub last_seen: Option<Value>,

    /// Direct reference into the device registry.
    #[serde(default)]
    pub device_reg_id: Option<String>,

    #[serde(default)]
    pub entities: Vec<ZhaEntityRef>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entity summary embedded in a [`ZhaDevice`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZhaEntityRef {
    #[serde(default)]
    pub entity_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

// ── Registries ──────────────────────────────────────────────────────

/// One record from `config/device_registry/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRegistryEntry {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub name_by_user: Option<String>,

    #[serde(default)]
    pub manufacturer: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    /// Composite identifiers, normally `[domain, value]` pairs.
    /// Kept as raw JSON because integrations are not consistent about it.
    #[serde(default)]
    pub identifiers: Vec<Value>,

    #[serde(default)]
    pub area_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One record from `config/entity_registry/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRegistryEntry {
    pub entity_id: String,

    #[serde(default)]
    pub device_id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub original_name: Option<String>,

    #[serde(default)]
    pub platform: Option<String>,

    #[serde(default)]
    pub device_class: Option<String>,

    #[serde(default)]
    pub original_device_class: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Live state ──────────────────────────────────────────────────────

/// One entry from `get_states`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub attributes: Map<String, Value>,

    #[serde(default)]
    pub last_changed: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Mutations ───────────────────────────────────────────────────────

/// Parameters for `config/device_registry/update`.
///
/// `name_by_user: None` is sent as `null`, which clears the custom name.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRegistryUpdate<'a> {
    pub device_id: &'a str,
    pub name_by_user: Option<&'a str>,
}

/// Parameters for `config/entity_registry/update`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityRegistryUpdate {
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_entity_id: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zha_device_minimal_fields() {
        let dev: ZhaDevice = serde_json::from_value(json!({
            "ieee": "00:12:4B:00:AA:BB:CC:DD",
            "nwk": 4660,
            "manufacturer": "LUMI",
            "model": "lumi.sensor_motion",
            "lqi": 255,
            "entities": [{ "entity_id": "binary_sensor.motion", "name": "Motion" }]
        }))
        .unwrap();
        assert_eq!(dev.ieee, "00:12:4B:00:AA:BB:CC:DD");
        assert_eq!(dev.nwk, Some(json!(4660)));
        assert!(dev.available.is_none());
        assert_eq!(dev.entities.len(), 1);
        assert_eq!(dev.extra["lqi"], 255);
    }

    #[test]
    fn registry_entry_keeps_raw_identifiers() {
        let entry: DeviceRegistryEntry = serde_json::from_value(json!({
            "id": "dev1",
            "name": "LUMI lumi.sensor_motion",
            "name_by_user": null,
            "identifiers": [["zha", "00:12:4b:00:aa:bb:cc:dd"], ["other", "x", "y"]]
        }))
        .unwrap();
        assert_eq!(entry.identifiers.len(), 2);
        assert!(entry.name_by_user.is_none());
    }

    #[test]
    fn device_update_sends_null_to_clear() {
        let params = DeviceRegistryUpdate {
            device_id: "dev1",
            name_by_user: None,
        };
        assert_eq!(
            serde_json::to_value(params).unwrap(),
            json!({ "device_id": "dev1", "name_by_user": null })
        );
    }

    #[test]
    fn entity_update_omits_unset_fields() {
        let update = EntityRegistryUpdate {
            entity_id: "sensor.door_battery".into(),
            name: Some("Door battery".into()),
            new_entity_id: None,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "entity_id": "sensor.door_battery", "name": "Door battery" })
        );
    }
}

// ── API-to-domain type conversions ──
//
// Bridges raw `zhactl_api` wire types into `zhactl_core::model`. Each `From`
// impl normalizes addresses, parses loosely-typed fields into strong types,
// and fills defaults for anything the hub left out.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use zhactl_api::{DeviceRegistryEntry, EntityRegistryEntry, EntityState, ZhaDevice, ZhaEntityRef};

use crate::model::{
    Device, EntityRecord, EntitySummary, IeeeAddress, NwkAddress, RegistryId, RegistryRecord,
    StatusSnapshot,
};

// ── Helpers ────────────────────────────────────────────────────────

/// `last_seen` arrives as RFC 3339, as a naive ISO timestamp (UTC), or as
/// epoch seconds depending on hub version.
fn parse_last_seen(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| {
                #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
                n.as_f64().map(|f| f as i64)
            })?;
            DateTime::from_timestamp(secs, 0)
        }
        _ => None,
    }
}

/// Composite identifiers are exactly `[tag, value]`. Anything else (bare
/// strings, arrays of any other length) cannot be joined on and is dropped.
fn parse_identifier(raw: &Value) -> Option<(String, String)> {
    let [tag, value] = raw.as_array()?.as_slice() else {
        return None;
    };
    let value = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some((tag.as_str()?.to_owned(), value))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

// ── Topology ───────────────────────────────────────────────────────

impl From<ZhaDevice> for Device {
    fn from(d: ZhaDevice) -> Self {
        Self {
            ieee: IeeeAddress::new(&d.ieee),
            nwk: d.nwk.as_ref().and_then(NwkAddress::from_json),
            name: non_empty(d.name),
            user_given_name: non_empty(d.user_given_name),
            manufacturer: d.manufacturer,
            model: d.model,
            available: d.available.unwrap_or(true),
            power_source: d.power_source,
            last_seen: d.last_seen.as_ref().and_then(parse_last_seen),
            device_reg_id: non_empty(d.device_reg_id).map(RegistryId::from),
            entities: d.entities.into_iter().map(EntitySummary::from).collect(),
        }
    }
}

impl From<ZhaEntityRef> for EntitySummary {
    fn from(e: ZhaEntityRef) -> Self {
        Self {
            entity_id: e.entity_id.into(),
            name: e.name,
        }
    }
}

// ── Registries ─────────────────────────────────────────────────────

impl From<DeviceRegistryEntry> for RegistryRecord {
    fn from(r: DeviceRegistryEntry) -> Self {
        Self {
            id: r.id.into(),
            name: r.name,
            name_by_user: r.name_by_user,
            manufacturer: r.manufacturer,
            model: r.model,
            area_id: r.area_id,
            identifiers: r.identifiers.iter().filter_map(parse_identifier).collect(),
        }
    }
}

impl From<EntityRegistryEntry> for EntityRecord {
    fn from(e: EntityRegistryEntry) -> Self {
        Self {
            entity_id: e.entity_id.into(),
            device_id: non_empty(e.device_id).map(RegistryId::from),
            name: e.name,
            original_name: e.original_name,
            platform: e.platform,
            category: e.device_class.or(e.original_device_class),
        }
    }
}

// ── Live state ─────────────────────────────────────────────────────

impl From<EntityState> for StatusSnapshot {
    fn from(s: EntityState) -> Self {
        Self {
            entity_id: s.entity_id.into(),
            state: s.state,
            attributes: s.attributes,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn zha(value: Value) -> ZhaDevice {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn device_conversion_normalizes_and_defaults() {
        let device = Device::from(zha(json!({
            "ieee": "00:12:4B:00:AA:BB:CC:DD",
            "nwk": "0x0000",
            "manufacturer": "Texas Instruments",
            "model": "CC2652",
            "device_reg_id": "",
            "entities": [{ "entity_id": "sensor.coordinator" }]
        })));
        assert_eq!(device.ieee.as_str(), "00:12:4b:00:aa:bb:cc:dd");
        assert!(device.is_coordinator());
        assert!(device.available);
        assert!(device.device_reg_id.is_none());
        assert_eq!(device.entities[0].entity_id.as_str(), "sensor.coordinator");
    }

    #[test]
    fn last_seen_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            parse_last_seen(&json!("2025-03-01T12:30:00+00:00")),
            Some(expected)
        );
        assert_eq!(parse_last_seen(&json!("2025-03-01T12:30:00")), Some(expected));
        assert_eq!(parse_last_seen(&json!(expected.timestamp())), Some(expected));
        assert_eq!(parse_last_seen(&json!("yesterday")), None);
    }

    #[test]
    fn registry_identifiers_keep_pairs_only() {
        let entry: DeviceRegistryEntry = serde_json::from_value(json!({
            "id": "dev1",
            "identifiers": [
                ["zha", "00:12:4b:00:aa:bb:cc:dd"],
                ["mqtt"],
                ["zha", "00:15:8d:00:01:02:03:04", "extra"],
                "bare",
                ["hue", 17]
            ]
        }))
        .unwrap();
        let record = RegistryRecord::from(entry);
        assert_eq!(
            record.identifiers,
            vec![
                ("zha".to_owned(), "00:12:4b:00:aa:bb:cc:dd".to_owned()),
                ("hue".to_owned(), "17".to_owned()),
            ]
        );
    }

    #[test]
    fn entity_category_prefers_device_class() {
        let entry: EntityRegistryEntry = serde_json::from_value(json!({
            "entity_id": "sensor.door_battery",
            "device_id": "dev1",
            "device_class": null,
            "original_device_class": "battery",
            "disabled_by": "user"
        }))
        .unwrap();
        assert!(entry.extra.contains_key("disabled_by"));
        let record = EntityRecord::from(entry);
        assert_eq!(record.category.as_deref(), Some("battery"));
        assert_eq!(record.device_id, Some(RegistryId::from("dev1")));
    }
}

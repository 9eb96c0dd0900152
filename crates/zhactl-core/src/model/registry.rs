// ── Registry records and live status ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::identity::{EntityId, RegistryId};

/// A device as known to the hub's device registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub id: RegistryId,
    /// Name discovered by the integration.
    pub name: Option<String>,
    /// Name assigned by the user. Overrides `name` for display.
    pub name_by_user: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub area_id: Option<String>,
    /// `(domain_tag, value)` pairs, e.g. `("zha", "00:12:4b:...")`.
    pub identifiers: Vec<(String, String)>,
}

impl RegistryRecord {
    pub fn new(id: impl Into<RegistryId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            name_by_user: None,
            manufacturer: None,
            model: None,
            area_id: None,
            identifiers: Vec::new(),
        }
    }

    /// User-assigned name if set, otherwise the discovered name.
    pub fn display_name(&self) -> Option<&str> {
        non_empty(self.name_by_user.as_deref()).or_else(|| non_empty(self.name.as_deref()))
    }
}

/// An entity as known to the hub's entity registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_id: EntityId,
    /// Owning device registry record.
    pub device_id: Option<RegistryId>,
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub platform: Option<String>,
    /// Declared category (`device_class`, else `original_device_class`).
    pub category: Option<String>,
}

impl EntityRecord {
    pub fn new(entity_id: impl Into<EntityId>, device_id: Option<RegistryId>) -> Self {
        Self {
            entity_id: entity_id.into(),
            device_id,
            name: None,
            original_name: None,
            platform: None,
            category: None,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        non_empty(self.name.as_deref()).or_else(|| non_empty(self.original_name.as_deref()))
    }
}

/// Current value of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub entity_id: EntityId,
    pub state: String,
    pub attributes: Map<String, Value>,
}

impl StatusSnapshot {
    pub const UNAVAILABLE: &'static str = "unavailable";
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(entity_id: impl Into<EntityId>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_owned(), value.into());
        self
    }

    /// `true` for the hub's `unavailable` / `unknown` sentinels.
    pub fn is_unavailable(&self) -> bool {
        self.state == Self::UNAVAILABLE || self.state == Self::UNKNOWN
    }

    pub fn unit(&self) -> Option<&str> {
        self.attributes
            .get("unit_of_measurement")
            .and_then(Value::as_str)
    }

    /// Category override from the `device_class` attribute.
    pub fn category(&self) -> Option<&str> {
        self.attributes.get("device_class").and_then(Value::as_str)
    }

    /// The state as a finite number, if it is one.
    pub fn numeric(&self) -> Option<f64> {
        self.state
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_user_name() {
        let mut rec = RegistryRecord::new("dev1");
        assert_eq!(rec.display_name(), None);
        rec.name = Some("LUMI lumi.weather".into());
        assert_eq!(rec.display_name(), Some("LUMI lumi.weather"));
        rec.name_by_user = Some(String::new());
        assert_eq!(rec.display_name(), Some("LUMI lumi.weather"));
        rec.name_by_user = Some("Bathroom climate".into());
        assert_eq!(rec.display_name(), Some("Bathroom climate"));
    }

    #[test]
    fn status_sentinels() {
        assert!(StatusSnapshot::new("sensor.a", "unavailable").is_unavailable());
        assert!(StatusSnapshot::new("sensor.a", "unknown").is_unavailable());
        assert!(!StatusSnapshot::new("sensor.a", "Unavailable").is_unavailable());
        assert!(!StatusSnapshot::new("sensor.a", "on").is_unavailable());
    }

    #[test]
    fn status_numeric() {
        assert_eq!(StatusSnapshot::new("sensor.a", " 24.5 ").numeric(), Some(24.5));
        assert_eq!(StatusSnapshot::new("sensor.a", "N/A").numeric(), None);
        assert_eq!(StatusSnapshot::new("sensor.a", "NaN").numeric(), None);
    }

    #[test]
    fn status_attributes() {
        let status = StatusSnapshot::new("sensor.door_battery", "87")
            .with_attribute("unit_of_measurement", "%")
            .with_attribute("device_class", "battery");
        assert_eq!(status.unit(), Some("%"));
        assert_eq!(status.category(), Some("battery"));
    }
}

// ── Topology device ──
//
// One radio as reported by the Zigbee coordinator. Everything here comes
// from `zha/devices`; user-facing names live on the registry record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{EntityId, IeeeAddress, NwkAddress, RegistryId};

/// A device from the topology listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub ieee: IeeeAddress,
    pub nwk: Option<NwkAddress>,
    pub name: Option<String>,
    pub user_given_name: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    /// Hubs omit the flag for some device types; absence reads as available.
    pub available: bool,
    pub power_source: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
    /// Direct reference into the device registry, when the hub sends one.
    pub device_reg_id: Option<RegistryId>,
    pub entities: Vec<EntitySummary>,
}

/// Entity reference embedded in a topology record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub entity_id: EntityId,
    pub name: Option<String>,
}

impl Device {
    /// A bare device with only its address set. Handy for tests and for
    /// callers that build snapshots by hand.
    pub fn new(ieee: impl Into<IeeeAddress>) -> Self {
        Self {
            ieee: ieee.into(),
            nwk: None,
            name: None,
            user_given_name: None,
            manufacturer: None,
            model: None,
            available: true,
            power_source: None,
            last_seen: None,
            device_reg_id: None,
            entities: Vec::new(),
        }
    }

    pub fn is_coordinator(&self) -> bool {
        self.nwk.is_some_and(NwkAddress::is_coordinator)
    }

    /// The device's own identity, for when no registry name exists:
    /// topology name, then model, then manufacturer.
    pub fn bare_name(&self) -> Option<&str> {
        [&self.name, &self.model, &self.manufacturer]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .find(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinator_requires_nwk_zero() {
        let mut dev = Device::new("AA");
        assert!(!dev.is_coordinator());
        dev.nwk = Some(NwkAddress::new(0x1234));
        assert!(!dev.is_coordinator());
        dev.nwk = Some(NwkAddress::COORDINATOR);
        assert!(dev.is_coordinator());
    }

    #[test]
    fn bare_name_falls_back_through_identity() {
        let mut dev = Device::new("AA");
        assert_eq!(dev.bare_name(), None);
        dev.manufacturer = Some("LUMI".into());
        assert_eq!(dev.bare_name(), Some("LUMI"));
        dev.model = Some("lumi.weather".into());
        assert_eq!(dev.bare_name(), Some("lumi.weather"));
        dev.name = Some("  ".into());
        assert_eq!(dev.bare_name(), Some("lumi.weather"));
        dev.name = Some("LUMI lumi.weather".into());
        assert_eq!(dev.bare_name(), Some("LUMI lumi.weather"));
    }
}

// ── Runtime hub configuration ──
//
// Describes *how* to reach a hub and the policy knobs the engines need.
// Carries the access token but never touches disk; the CLI builds a
// `HubConfig` from `zhactl-config` profiles and hands it in.

use secrecy::SecretString;
use url::Url;

use crate::model::{Device, IeeeAddress};

/// Default battery level (percent) below which a reading is flagged.
pub const DEFAULT_BATTERY_THRESHOLD: f64 = 25.0;

/// Composite identifier tag that links registry records to Zigbee radios.
pub const DEFAULT_IDENTIFIER_DOMAIN: &str = "zha";

/// How to find the coordinator, the one device that must never be renamed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CoordinatorRule {
    /// The first topology device whose short address is `0x0000`.
    #[default]
    NwkZero,
    /// A fixed hardware address.
    Address(IeeeAddress),
}

impl CoordinatorRule {
    /// Apply the rule to a topology listing.
    pub fn locate(&self, devices: &[Device]) -> Option<IeeeAddress> {
        match self {
            Self::NwkZero => devices
                .iter()
                .find(|d| d.is_coordinator())
                .map(|d| d.ieee.clone()),
            Self::Address(ieee) => Some(ieee.clone()),
        }
    }
}

/// Configuration for one hub.
///
/// Built by the CLI, passed to [`crate::hub`] -- core never reads config files.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Hub base URL (`http(s)://` or `ws(s)://`). The WebSocket path is
    /// derived from it.
    pub url: Url,
    /// Long-lived access token.
    pub token: SecretString,
    /// Battery readings strictly below this are reported.
    pub battery_threshold: f64,
    pub coordinator: CoordinatorRule,
    /// Identifier tag used to join registry records to topology devices.
    pub identifier_domain: String,
}

impl HubConfig {
    pub fn new(url: Url, token: SecretString) -> Self {
        Self {
            url,
            token,
            battery_threshold: DEFAULT_BATTERY_THRESHOLD,
            coordinator: CoordinatorRule::default(),
            identifier_domain: DEFAULT_IDENTIFIER_DOMAIN.to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::NwkAddress;

    #[test]
    fn nwk_zero_rule_picks_first_coordinator() {
        let mut router = Device::new("00:00:00:00:00:00:00:01");
        router.nwk = Some(NwkAddress::new(0x1234));
        let mut coord = Device::new("00:00:00:00:00:00:00:02");
        coord.nwk = Some(NwkAddress::COORDINATOR);
        let mut second = Device::new("00:00:00:00:00:00:00:03");
        second.nwk = Some(NwkAddress::COORDINATOR);

        let found = CoordinatorRule::NwkZero.locate(&[router, coord, second]);
        assert_eq!(found.unwrap().as_str(), "00:00:00:00:00:00:00:02");
    }

    #[test]
    fn nwk_zero_rule_without_coordinator() {
        assert!(CoordinatorRule::NwkZero.locate(&[Device::new("AA")]).is_none());
    }

    #[test]
    fn address_rule_ignores_topology() {
        let rule = CoordinatorRule::Address(IeeeAddress::new("AA"));
        assert_eq!(rule.locate(&[]).unwrap().as_str(), "aa");
    }

    #[test]
    fn defaults() {
        let cfg = HubConfig::new(
            Url::parse("http://homeassistant.local:8123").unwrap(),
            "t".to_string().into(),
        );
        assert!((cfg.battery_threshold - 25.0).abs() < f64::EPSILON);
        assert_eq!(cfg.coordinator, CoordinatorRule::NwkZero);
        assert_eq!(cfg.identifier_domain, "zha");
    }
}

// ── Core identity types ──
//
// IeeeAddress is the join key between the topology listing and the device
// registry. It is only ever constructed through normalization, so two
// addresses compare equal exactly when the hub would consider them the same
// radio.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ── IeeeAddress ─────────────────────────────────────────────────────

/// 64-bit Zigbee hardware address, normalized to trimmed lowercase
/// colon-separated form (`00:12:4b:00:aa:bb:cc:dd`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct IeeeAddress(String);

impl IeeeAddress {
    /// Normalize any common spelling. Accepts colon- or dash-separated hex
    /// in either case, with surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase().replace('-', ":"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for IeeeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IeeeAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for IeeeAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for IeeeAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<IeeeAddress> for String {
    fn from(addr: IeeeAddress) -> Self {
        addr.0
    }
}

// ── NwkAddress ──────────────────────────────────────────────────────

/// 16-bit Zigbee short network address. `0x0000` is reserved for the
/// coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NwkAddress(u16);

impl NwkAddress {
    pub const COORDINATOR: Self = Self(0);

    pub fn new(value: u16) -> Self {
        Self(value)
    }

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn is_coordinator(self) -> bool {
        self.0 == 0
    }

    /// Parse the spellings hubs use: `"0"`, `"4660"`, `"0x1234"`, `"0000"`,
    /// `"1A2B"`. Digit-only strings are read as decimal, anything else
    /// without a prefix as hex.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            return u16::from_str_radix(hex, 16).ok().map(Self);
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s.parse().ok().map(Self);
        }
        u16::from_str_radix(s, 16).ok().map(Self)
    }

    /// Read the `nwk` field of a topology record (integer or string).
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().and_then(|v| u16::try_from(v).ok()).map(Self),
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }
}

impl fmt::Display for NwkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

// ── Registry and entity identifiers ─────────────────────────────────

/// Opaque device registry identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryId(String);

impl RegistryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RegistryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RegistryId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Entity identifier of the form `<domain>.<object_id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Platform domain, e.g. `sensor` for `sensor.door_battery`.
    /// Identifiers without a dot have an empty domain.
    pub fn domain(&self) -> &str {
        self.0.split_once('.').map_or("", |(domain, _)| domain)
    }

    /// Everything after the first dot.
    pub fn object_id(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(_, rest)| rest)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

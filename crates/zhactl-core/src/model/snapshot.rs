// ── Snapshot arena and joined views ──
//
// A Snapshot owns the four collections read at the start of a run. Views
// borrow from it; nothing is mutated after the fetch.

use serde::Serialize;

use super::device::Device;
use super::identity::{EntityId, IeeeAddress, RegistryId};
use super::registry::{EntityRecord, RegistryRecord, StatusSnapshot};

/// Everything read from the hub for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub devices: Vec<Device>,
    pub registry: Vec<RegistryRecord>,
    pub entities: Vec<EntityRecord>,
    pub statuses: Vec<StatusSnapshot>,
}

impl Snapshot {
    pub fn new(
        devices: Vec<Device>,
        registry: Vec<RegistryRecord>,
        entities: Vec<EntityRecord>,
        statuses: Vec<StatusSnapshot>,
    ) -> Self {
        Self {
            devices,
            registry,
            entities,
            statuses,
        }
    }
}

/// A topology device joined with its registry record and entities.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceView<'a> {
    pub device: &'a Device,
    /// `None` for ghost devices (not in the registry).
    pub record: Option<&'a RegistryRecord>,
    /// Entities owned by `record`, in registry order.
    pub entities: Vec<EntityView<'a>>,
}

/// An entity record paired with its live status, if any.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EntityView<'a> {
    pub record: &'a EntityRecord,
    pub status: Option<&'a StatusSnapshot>,
}

impl<'a> DeviceView<'a> {
    pub fn ieee(&self) -> &'a IeeeAddress {
        &self.device.ieee
    }

    pub fn is_ghost(&self) -> bool {
        self.record.is_none()
    }

    pub fn registry_id(&self) -> Option<&'a RegistryId> {
        self.record.map(|r| &r.id)
    }

    /// Registry display name, else the device's own identity, else its
    /// address.
    pub fn display_name(&self) -> &'a str {
        self.record
            .and_then(RegistryRecord::display_name)
            .or_else(|| self.device.bare_name())
            .unwrap_or_else(|| self.device.ieee.as_str())
    }

    /// Topology manufacturer, falling back to the registry's.
    pub fn manufacturer(&self) -> Option<&'a str> {
        self.device
            .manufacturer
            .as_deref()
            .or_else(|| self.record.and_then(|r| r.manufacturer.as_deref()))
    }

    /// Topology model, falling back to the registry's.
    pub fn model(&self) -> Option<&'a str> {
        self.device
            .model
            .as_deref()
            .or_else(|| self.record.and_then(|r| r.model.as_deref()))
    }
}

impl<'a> EntityView<'a> {
    pub fn entity_id(&self) -> &'a EntityId {
        &self.record.entity_id
    }

    pub fn state(&self) -> Option<&'a str> {
        self.status.map(|s| s.state.as_str())
    }

    /// Declared category, overridden by the live `device_class` attribute.
    pub fn category(&self) -> Option<&'a str> {
        self.status
            .and_then(StatusSnapshot::category)
            .or(self.record.category.as_deref())
    }

    /// `true` if the identifier, declared category, or attribute category
    /// mentions `battery`.
    pub fn is_battery(&self) -> bool {
        let mentions = |s: &str| s.to_lowercase().contains("battery");
        mentions(self.record.entity_id.as_str())
            || self.record.category.as_deref().is_some_and(mentions)
            || self
                .status
                .and_then(StatusSnapshot::category)
                .is_some_and(mentions)
    }
}

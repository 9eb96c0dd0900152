// ── Join engine ──
//
// Builds the lookup indices over one Snapshot and resolves each topology
// device to its registry record, entities and statuses. Every duplicate-key
// policy is first-match-wins: the earliest record in input order owns the
// key and later duplicates are ignored (and logged).

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::debug;

use crate::config::CoordinatorRule;
use crate::model::{
    Device, DeviceView, EntityRecord, EntityView, IeeeAddress, RegistryRecord, Snapshot,
    StatusSnapshot,
};

/// Lookup indices over a [`Snapshot`].
#[derive(Debug)]
pub struct JoinIndex<'a> {
    snapshot: &'a Snapshot,
    by_id: HashMap<&'a str, &'a RegistryRecord>,
    by_ieee: HashMap<IeeeAddress, &'a RegistryRecord>,
    entities_by_owner: HashMap<&'a str, Vec<&'a EntityRecord>>,
    status_by_entity: HashMap<&'a str, &'a StatusSnapshot>,
    devices_by_ieee: HashMap<&'a IeeeAddress, &'a Device>,
}

impl<'a> JoinIndex<'a> {
    /// Index `snapshot`. Registry records are linked to radios through
    /// composite identifiers whose tag equals `domain_tag`, compared
    /// case-insensitively.
    pub fn new(snapshot: &'a Snapshot, domain_tag: &str) -> Self {
        let mut by_id = HashMap::with_capacity(snapshot.registry.len());
        let mut by_ieee: HashMap<IeeeAddress, &RegistryRecord> = HashMap::new();
        for record in &snapshot.registry {
            by_id.entry(record.id.as_str()).or_insert(record);

            for (tag, value) in &record.identifiers {
                if !tag.eq_ignore_ascii_case(domain_tag) {
                    continue;
                }
                match by_ieee.entry(IeeeAddress::new(value)) {
                    Entry::Occupied(kept) => debug!(
                        ieee = %kept.key(),
                        kept = %kept.get().id,
                        ignored = %record.id,
                        "Duplicate registry address, keeping first"
                    ),
                    Entry::Vacant(slot) => {
                        slot.insert(record);
                    }
                }
            }
        }

        let mut entities_by_owner: HashMap<&str, Vec<&EntityRecord>> = HashMap::new();
        for entity in &snapshot.entities {
            if let Some(owner) = &entity.device_id {
                entities_by_owner
                    .entry(owner.as_str())
                    .or_default()
                    .push(entity);
            }
        }

        let mut status_by_entity = HashMap::with_capacity(snapshot.statuses.len());
        for status in &snapshot.statuses {
            status_by_entity
                .entry(status.entity_id.as_str())
                .or_insert(status);
        }

        let mut devices_by_ieee = HashMap::with_capacity(snapshot.devices.len());
        for device in &snapshot.devices {
            devices_by_ieee.entry(&device.ieee).or_insert(device);
        }

        Self {
            snapshot,
            by_id,
            by_ieee,
            entities_by_owner,
            status_by_entity,
            devices_by_ieee,
        }
    }

    pub fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    pub fn record_by_id(&self, id: &str) -> Option<&'a RegistryRecord> {
        self.by_id.get(id).copied()
    }

    pub fn record_by_ieee(&self, ieee: &IeeeAddress) -> Option<&'a RegistryRecord> {
        self.by_ieee.get(ieee).copied()
    }

    /// First topology device with this address.
    pub fn device_by_ieee(&self, ieee: &IeeeAddress) -> Option<&'a Device> {
        self.devices_by_ieee.get(ieee).copied()
    }

    pub fn status(&self, entity_id: &str) -> Option<&'a StatusSnapshot> {
        self.status_by_entity.get(entity_id).copied()
    }

    /// The registry record for `device`: its direct registry reference when
    /// that names a known record, otherwise the address index. `None` means
    /// a ghost device.
    pub fn resolve(&self, device: &Device) -> Option<&'a RegistryRecord> {
        device
            .device_reg_id
            .as_ref()
            .and_then(|id| self.record_by_id(id.as_str()))
            .or_else(|| self.record_by_ieee(&device.ieee))
    }

    /// Entities owned by `record`, each paired with its status.
    pub fn entities_of(&self, record: &RegistryRecord) -> Vec<EntityView<'a>> {
        self.entities_by_owner
            .get(record.id.as_str())
            .map(|group| {
                group
                    .iter()
                    .map(|&entity| EntityView {
                        record: entity,
                        status: self.status(entity.entity_id.as_str()),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Join one device.
    pub fn view(&self, device: &'a Device) -> DeviceView<'a> {
        let record = self.resolve(device);
        let entities = record.map(|r| self.entities_of(r)).unwrap_or_default();
        DeviceView {
            device,
            record,
            entities,
        }
    }

    /// Join every device, in topology order.
    pub fn views(&self) -> Vec<DeviceView<'a>> {
        self.snapshot.devices.iter().map(|d| self.view(d)).collect()
    }

    pub fn coordinator(&self, rule: &CoordinatorRule) -> Option<IeeeAddress> {
        rule.locate(&self.snapshot.devices)
    }
}

/// Index `snapshot` and join every device in one call.
pub fn build<'a>(snapshot: &'a Snapshot, domain_tag: &str) -> Vec<DeviceView<'a>> {
    JoinIndex::new(snapshot, domain_tag).views()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{NwkAddress, RegistryId};
    use pretty_assertions::assert_eq;

    const SENSOR: &str = "00:15:8d:00:01:02:03:04";
    const PLUG: &str = "00:17:88:01:0a:0b:0c:0d";

    fn record(id: &str, ieee: &str) -> RegistryRecord {
        let mut r = RegistryRecord::new(id);
        r.identifiers.push(("zha".into(), ieee.into()));
        r
    }

    fn entity(id: &str, owner: &str) -> EntityRecord {
        EntityRecord::new(id, Some(RegistryId::from(owner)))
    }

    fn sample() -> Snapshot {
        let mut plug = Device::new(PLUG.to_uppercase());
        plug.nwk = Some(NwkAddress::new(0x1234));
        Snapshot::new(
            vec![Device::new(SENSOR), plug, Device::new("00:00:00:00:00:00:00:99")],
            vec![record("dev-sensor", SENSOR), record("dev-plug", &PLUG.to_uppercase())],
            vec![
                entity("sensor.motion_battery", "dev-sensor"),
                entity("binary_sensor.motion", "dev-sensor"),
                entity("switch.plug", "dev-plug"),
                EntityRecord::new("sun.sun", None),
            ],
            vec![
                StatusSnapshot::new("sensor.motion_battery", "87"),
                StatusSnapshot::new("switch.plug", "on"),
            ],
        )
    }

    fn summary(views: &[DeviceView<'_>]) -> Vec<(String, Option<String>, Vec<String>)> {
        views
            .iter()
            .map(|v| {
                (
                    v.ieee().to_string(),
                    v.registry_id().map(ToString::to_string),
                    v.entities.iter().map(|e| e.entity_id().to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn joins_by_identifier_and_groups_entities() {
        let snapshot = sample();
        let views = build(&snapshot, "zha");
        assert_eq!(
            summary(&views),
            vec![
                (
                    SENSOR.to_owned(),
                    Some("dev-sensor".to_owned()),
                    vec!["sensor.motion_battery".to_owned(), "binary_sensor.motion".to_owned()]
                ),
                (PLUG.to_owned(), Some("dev-plug".to_owned()), vec!["switch.plug".to_owned()]),
                ("00:00:00:00:00:00:00:99".to_owned(), None, vec![]),
            ]
        );
    }

    #[test]
    fn pairs_statuses_and_tolerates_missing_ones() {
        let snapshot = sample();
        let views = build(&snapshot, "zha");
        let sensor = &views[0];
        assert_eq!(sensor.entities[0].state(), Some("87"));
        assert_eq!(sensor.entities[1].state(), None);
    }

    #[test]
    fn ghost_device_has_no_record_and_no_entities() {
        let snapshot = sample();
        let views = build(&snapshot, "zha");
        let ghost = &views[2];
        assert!(ghost.is_ghost());
        assert!(ghost.entities.is_empty());
    }

    #[test]
    fn join_is_independent_of_input_order() {
        let snapshot = sample();
        let mut reversed = snapshot.clone();
        reversed.registry.reverse();
        reversed.entities.reverse();
        reversed.statuses.reverse();

        let forward = JoinIndex::new(&snapshot, "zha");
        let backward = JoinIndex::new(&reversed, "zha");
        for device in &snapshot.devices {
            assert_eq!(
                forward.resolve(device).map(|r| &r.id),
                backward.resolve(device).map(|r| &r.id)
            );
        }
    }

    #[test]
    fn domain_tag_is_case_insensitive_and_filtered() {
        let mut snapshot = sample();
        snapshot.registry[0].identifiers = vec![("ZHA".into(), SENSOR.into())];
        snapshot.registry[1].identifiers = vec![("mqtt".into(), PLUG.into())];

        let index = JoinIndex::new(&snapshot, "zha");
        assert!(index.record_by_ieee(&IeeeAddress::new(SENSOR)).is_some());
        assert!(index.record_by_ieee(&IeeeAddress::new(PLUG)).is_none());
    }

    #[test]
    fn direct_registry_reference_wins() {
        let mut snapshot = sample();
        snapshot.devices[0].device_reg_id = Some(RegistryId::from("dev-plug"));
        let index = JoinIndex::new(&snapshot, "zha");
        assert_eq!(index.resolve(&snapshot.devices[0]).unwrap().id.as_str(), "dev-plug");
    }

    #[test]
    fn unknown_registry_reference_falls_back_to_address() {
        let mut snapshot = sample();
        snapshot.devices[0].device_reg_id = Some(RegistryId::from("deleted"));
        let index = JoinIndex::new(&snapshot, "zha");
        assert_eq!(
            index.resolve(&snapshot.devices[0]).unwrap().id.as_str(),
            "dev-sensor"
        );
    }

    #[test]
    fn duplicate_address_resolves_to_first_record() {
        let mut snapshot = sample();
        snapshot.registry.push(record("dev-sensor-dup", SENSOR));
        let index = JoinIndex::new(&snapshot, "zha");
        assert_eq!(
            index.resolve(&snapshot.devices[0]).unwrap().id.as_str(),
            "dev-sensor"
        );

        snapshot.registry.swap(0, 2);
        let index = JoinIndex::new(&snapshot, "zha");
        assert_eq!(
            index.resolve(&snapshot.devices[0]).unwrap().id.as_str(),
            "dev-sensor-dup"
        );
    }

    #[test]
    fn duplicate_status_keeps_first() {
        let mut snapshot = sample();
        snapshot
            .statuses
            .push(StatusSnapshot::new("sensor.motion_battery", "3"));
        let index = JoinIndex::new(&snapshot, "zha");
        assert_eq!(index.status("sensor.motion_battery").unwrap().state, "87");
    }

    #[test]
    fn coordinator_lookup() {
        let mut snapshot = sample();
        snapshot.devices[2].nwk = Some(NwkAddress::COORDINATOR);
        let index = JoinIndex::new(&snapshot, "zha");
        assert_eq!(
            index.coordinator(&CoordinatorRule::NwkZero).unwrap().as_str(),
            "00:00:00:00:00:00:00:99"
        );
        assert!(index.device_by_ieee(&IeeeAddress::new(PLUG)).is_some());
    }
}

// ── Domain model ──
//
// Canonical types for one hub snapshot. Wire types from `zhactl-api` are
// converted into these in `crate::convert`.

pub mod device;
pub mod identity;
pub mod registry;
pub mod snapshot;

pub use device::{Device, EntitySummary};
pub use identity::{EntityId, IeeeAddress, NwkAddress, RegistryId};
pub use registry::{EntityRecord, RegistryRecord, StatusSnapshot};
pub use snapshot::{DeviceView, EntityView, Snapshot};

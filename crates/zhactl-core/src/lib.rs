//! Domain logic between `zhactl-api` and the `zhactl` CLI.
//!
//! One run reads a [`Snapshot`] from the hub, joins it into
//! [`DeviceView`]s, and then either reports on it or plans renames:
//!
//! - **[`fetch`]** -- four sequential reads (topology, device registry,
//!   entity registry, live states) into an owning [`Snapshot`].
//!
//! - **[`join`]** -- [`JoinIndex`] resolves every topology device to its
//!   registry record by direct reference or by hardware address, and pairs
//!   each entity with its live status. Duplicate keys resolve first-match.
//!
//! - **[`diagnose`]** -- independent health predicates (offline, unknown
//!   identity, no entities, unavailable entities, low battery) aggregated
//!   into a [`Report`].
//!
//! - **[`plan`]** -- diff desired names against the registry into a
//!   reviewable [`Plan`], then [`apply`](plan::apply) it one update at a
//!   time.
//!
//! - **[`rename`]** / **[`inventory`]** -- single-device rename with its
//!   battery entity, and flat listing / export rows.
//!
//! Everything after the fetch is synchronous and side-effect free. Network
//! access goes through [`hub::with_client`], which always closes the
//! connection.

pub mod config;
pub mod convert;
pub mod diagnose;
pub mod error;
pub mod fetch;
pub mod hub;
pub mod inventory;
pub mod join;
pub mod model;
pub mod plan;
pub mod rename;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CoordinatorRule, HubConfig};
pub use diagnose::{Issue, Report, diagnose};
pub use error::CoreError;
pub use fetch::fetch_snapshot;
pub use join::JoinIndex;
pub use plan::{AppliedChange, ChangeRequest, Plan, PlannedChange, SkipReason, SkipStats};

pub use model::{
    Device, DeviceView, EntityId, EntityRecord, EntityView, IeeeAddress, NwkAddress, RegistryId,
    RegistryRecord, Snapshot, StatusSnapshot,
};

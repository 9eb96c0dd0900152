// zhactl-api: Async Rust client for the Home Assistant WebSocket API

pub mod error;
pub mod events;
pub mod models;
pub mod rpc;
pub mod session;

pub use error::Error;
pub use events::{EventKind, EventTap, HubEvent};
pub use models::{
    DeviceRegistryEntry, DeviceRegistryUpdate, EntityRegistryEntry, EntityRegistryUpdate,
    EntityState, ZhaDevice, ZhaEntityRef,
};
pub use rpc::RpcClient;
pub use session::Session;

/// Operation type tags understood by the hub.
pub mod ops {
    pub const ZHA_DEVICES: &str = "zha/devices";
    pub const DEVICE_REGISTRY_LIST: &str = "config/device_registry/list";
    pub const ENTITY_REGISTRY_LIST: &str = "config/entity_registry/list";
    pub const GET_STATES: &str = "get_states";
    pub const DEVICE_REGISTRY_UPDATE: &str = "config/device_registry/update";
    pub const ENTITY_REGISTRY_UPDATE: &str = "config/entity_registry/update";
    pub const SUBSCRIBE_EVENTS: &str = "subscribe_events";
}

/// Event type tags the monitoring flow subscribes to.
pub mod event_types {
    pub const ZHA_EVENT: &str = "zha_event";
    pub const STATE_CHANGED: &str = "state_changed";
}

// ── Snapshot fetcher ──

use tracing::{debug, info};

use zhactl_api::RpcClient;

use crate::error::CoreError;
use crate::model::Snapshot;

/// Read the four collections a run works from, in order: topology, device
/// registry, entity registry, live states.
///
/// The calls are sequential (the client has one request in flight at a
/// time). Any failure aborts the fetch; there is no partial snapshot.
pub async fn fetch_snapshot(rpc: &mut RpcClient) -> Result<Snapshot, CoreError> {
    let devices = rpc.list_zha_devices().await?;
    debug!(count = devices.len(), "Fetched topology");

    let registry = rpc.list_device_registry().await?;
    debug!(count = registry.len(), "Fetched device registry");

    let entities = rpc.list_entity_registry().await?;
    debug!(count = entities.len(), "Fetched entity registry");

    let statuses = rpc.get_states().await?;
    debug!(count = statuses.len(), "Fetched states");

    let snapshot = Snapshot::new(
        devices.into_iter().map(Into::into).collect(),
        registry.into_iter().map(Into::into).collect(),
        entities.into_iter().map(Into::into).collect(),
        statuses.into_iter().map(Into::into).collect(),
    );
    info!(
        devices = snapshot.devices.len(),
        registry = snapshot.registry.len(),
        entities = snapshot.entities.len(),
        states = snapshot.statuses.len(),
        "Snapshot ready"
    );
    Ok(snapshot)
}

// ── Scoped hub access ──
//
// Open an authenticated session from a `HubConfig`, pick its consumption
// mode, and guarantee the socket is released on every exit path.

use tracing::debug;

use zhactl_api::session::websocket_url;
use zhactl_api::{EventTap, RpcClient, Session};

use crate::config::HubConfig;
use crate::error::CoreError;

async fn open(config: &HubConfig) -> Result<Session, CoreError> {
    let endpoint = websocket_url(&config.url)?;
    debug!(endpoint = %endpoint, "Opening hub session");
    Ok(Session::open(&endpoint, &config.token).await?)
}

/// Connect, run `f` with a request/reply client, disconnect.
///
/// The connection is closed whether `f` succeeds or fails; `f`'s result is
/// returned unchanged.
pub async fn with_client<T, F>(config: &HubConfig, f: F) -> Result<T, CoreError>
where
    F: AsyncFnOnce(&mut RpcClient) -> Result<T, CoreError>,
{
    let mut rpc = open(config).await?.into_rpc();
    let result = f(&mut rpc).await;
    rpc.close().await;
    result
}

/// Connect and switch to event-stream mode. The caller owns the tap and
/// must `close()` it.
pub async fn event_tap(config: &HubConfig) -> Result<EventTap, CoreError> {
    Ok(open(config).await?.into_event_tap())
}

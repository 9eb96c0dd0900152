// Request correlator
//
// Strict request/reply over the session socket: every call allocates the
// next id, sends one envelope, then reads frames until the matching
// `result` arrives. Frames for other ids (late events, stale results) are
// dropped here. `call` takes `&mut self`, so a client can never have more
// than one request in flight.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::Error;
use crate::models::{
    DeviceRegistryEntry, DeviceRegistryUpdate, EntityRegistryEntry, EntityRegistryUpdate,
    EntityState, ZhaDevice,
};
use crate::ops;
use crate::session::Session;

/// Request/reply client over an authenticated [`Session`].
pub struct RpcClient {
    session: Session,
    next_id: u64,
}

impl RpcClient {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session,
            next_id: 1,
        }
    }

    /// Issue `operation` with `params` and wait for its result payload.
    ///
    /// `params` must serialize to a JSON object (its fields are merged into
    /// the envelope) or to `null` / `()` for operations without arguments.
    /// Returns `Value::Null` when a successful result carries no payload.
    pub async fn call<P>(&mut self, operation: &str, params: P) -> Result<Value, Error>
    where
        P: Serialize,
    {
        let id = self.allocate_id();
        let envelope = build_request(id, operation, params)?;
        debug!(id, operation, "Sending request");
        self.session.send_json(&envelope).await?;

        loop {
            let text = self.session.recv_text().await?;
            match classify_reply(&text, id) {
                Reply::Success(result) => {
                    debug!(id, operation, "Request succeeded");
                    return Ok(result);
                }
                Reply::Failure(detail) => {
                    debug!(id, operation, "Request failed");
                    return Err(Error::Operation {
                        operation: operation.to_owned(),
                        detail,
                    });
                }
                Reply::Unrelated => {
                    trace!(pending = id, "Discarding unrelated frame");
                }
            }
        }
    }

    /// Like [`call`](Self::call), deserializing the payload into `T`.
    pub async fn call_typed<T, P>(&mut self, operation: &str, params: P) -> Result<T, Error>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let value = self.call(operation, params).await?;
        serde_json::from_value(value.clone()).map_err(|e| {
            let body = value.to_string();
            Error::Deserialization {
                message: format!("{operation}: {e}"),
                body,
            }
        })
    }

    /// Release the connection.
    pub async fn close(self) {
        self.session.close().await;
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ── Typed operations ─────────────────────────────────────────────

    /// Topology: every device known to the Zigbee coordinator.
    pub async fn list_zha_devices(&mut self) -> Result<Vec<ZhaDevice>, Error> {
        self.call_typed(ops::ZHA_DEVICES, ()).await
    }

    /// Device registry records.
    pub async fn list_device_registry(&mut self) -> Result<Vec<DeviceRegistryEntry>, Error> {
        self.call_typed(ops::DEVICE_REGISTRY_LIST, ()).await
    }

    /// Entity registry records.
    pub async fn list_entity_registry(&mut self) -> Result<Vec<EntityRegistryEntry>, Error> {
        self.call_typed(ops::ENTITY_REGISTRY_LIST, ()).await
    }

    /// Live state of every entity.
    pub async fn get_states(&mut self) -> Result<Vec<EntityState>, Error> {
        self.call_typed(ops::GET_STATES, ()).await
    }

    /// Set (or clear, with `None`) a device's user-assigned name.
    pub async fn update_device_registry(
        &mut self,
        device_id: &str,
        name_by_user: Option<&str>,
    ) -> Result<DeviceRegistryEntry, Error> {
        let params = DeviceRegistryUpdate {
            device_id,
            name_by_user,
        };
        self.call_typed(ops::DEVICE_REGISTRY_UPDATE, params).await
    }

    /// Update an entity's friendly name and/or entity id.
    ///
    /// The hub answers with `{"entity_entry": {...}}`; the inner record is
    /// returned.
    pub async fn update_entity_registry(
        &mut self,
        update: &EntityRegistryUpdate,
    ) -> Result<EntityRegistryEntry, Error> {
        let value = self.call(ops::ENTITY_REGISTRY_UPDATE, update).await?;
        let entry = value.get("entity_entry").cloned().unwrap_or(value);
        serde_json::from_value(entry.clone()).map_err(|e| Error::Deserialization {
            message: format!("{}: {e}", ops::ENTITY_REGISTRY_UPDATE),
            body: entry.to_string(),
        })
    }
}

// ── Envelope helpers ─────────────────────────────────────────────────

/// Build `{"id": id, "type": operation, ...params}`.
pub(crate) fn build_request<P: Serialize>(
    id: u64,
    operation: &str,
    params: P,
) -> Result<Value, Error> {
    let invalid = |reason: String| Error::InvalidParams {
        operation: operation.to_owned(),
        reason,
    };

    let mut fields: Map<String, Value> =
        match serde_json::to_value(params).map_err(|e| invalid(e.to_string()))? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => return Err(invalid(format!("expected an object, got {other}"))),
        };

    fields.insert("id".into(), Value::from(id));
    fields.insert("type".into(), Value::from(operation));
    Ok(Value::Object(fields))
}

/// What an inbound frame means for the request with id `pending`.
#[derive(Debug, PartialEq)]
pub(crate) enum Reply {
    Success(Value),
    Failure(Value),
    Unrelated,
}

pub(crate) fn classify_reply(text: &str, pending: u64) -> Reply {
    let Ok(frame) = serde_json::from_str::<Value>(text) else {
        return Reply::Unrelated;
    };

    let is_result = frame.get("type").and_then(Value::as_str) == Some("result");
    let matches = frame.get("id").and_then(Value::as_u64) == Some(pending);
    if !(is_result && matches) {
        return Reply::Unrelated;
    }

    if frame.get("success").and_then(Value::as_bool) == Some(true) {
        Reply::Success(frame.get("result").cloned().unwrap_or(Value::Null))
    } else {
        Reply::Failure(frame)
    }
}

//! Event tap: the event-stream consumption mode of a session.
//!
//! Subscribes to one or more event types, then reads the socket until the
//! caller cancels, handing every `event` frame to an observer closure. There
//! is no reconnection: when the hub goes away, [`EventTap::run`] returns the
//! error.
//!
//! # Example
//!
//! ```rust,ignore
//! use tokio_util::sync::CancellationToken;
//! use zhactl_api::{Session, event_types};
//!
//! let session = Session::open(&url, &token).await?;
//! let mut tap = session.into_event_tap();
//! tap.subscribe(event_types::ZHA_EVENT).await?;
//! tap.subscribe(event_types::STATE_CHANGED).await?;
//!
//! let cancel = CancellationToken::new();
//! tap.run(&cancel, |event| println!("{}", event.event_type)).await?;
//! tap.close().await;
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::Error;
use crate::event_types;
use crate::ops;
use crate::session::Session;

// ── HubEvent ─────────────────────────────────────────────────────────

/// The `event` object of an inbound event frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubEvent {
    /// Event type tag, e.g. `"zha_event"`, `"state_changed"`.
    pub event_type: String,

    /// Event-specific payload.
    #[serde(default)]
    pub data: Value,

    /// ISO-8601 timestamp from the hub.
    #[serde(default)]
    pub time_fired: Option<String>,

    /// `"LOCAL"` or `"REMOTE"`.
    #[serde(default)]
    pub origin: Option<String>,
}

/// Typed view over the event types the monitoring flow cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind<'a> {
    /// A Zigbee device command (remote button press etc).
    Zha {
        device_ieee: String,
        command: Option<&'a str>,
        args: Option<&'a Value>,
    },
    /// An entity changed state. `new_state` is `None` when it was removed.
    StateChanged {
        entity_id: &'a str,
        new_state: Option<&'a str>,
    },
    Other,
}

impl HubEvent {
    /// Classify this event by its type tag.
    pub fn kind(&self) -> EventKind<'_> {
        match self.event_type.as_str() {
            event_types::ZHA_EVENT => EventKind::Zha {
                device_ieee: self
                    .data
                    .get("device_ieee")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_lowercase(),
                command: self.data.get("command").and_then(Value::as_str),
                args: self.data.get("args"),
            },
            event_types::STATE_CHANGED => EventKind::StateChanged {
                entity_id: self
                    .data
                    .get("entity_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default(),
                new_state: self
                    .data
                    .get("new_state")
                    .and_then(|s| s.get("state"))
                    .and_then(Value::as_str),
            },
            _ => EventKind::Other,
        }
    }
}

// ── EventTap ─────────────────────────────────────────────────────────

/// Event-stream client over an authenticated [`Session`].
pub struct EventTap {
    session: Session,
    next_id: u64,
    subscribed: Vec<String>,
}

impl EventTap {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session,
            next_id: 1,
            subscribed: Vec::new(),
        }
    }

    /// Send a `subscribe_events` request for `event_type`.
    ///
    /// Fire-and-forget: the acknowledgement is read (and dropped) by
    /// [`run`](Self::run) like any other non-event frame.
    pub async fn subscribe(&mut self, event_type: &str) -> Result<(), Error> {
        let id = self.next_id;
        self.next_id += 1;

        let request = serde_json::json!({
            "id": id,
            "type": ops::SUBSCRIBE_EVENTS,
            "event_type": event_type,
        });
        self.session.send_json(&request).await?;
        debug!(id, event_type, "Subscribed");
        self.subscribed.push(event_type.to_owned());
        Ok(())
    }

    /// Event types subscribed so far.
    pub fn subscriptions(&self) -> &[String] {
        &self.subscribed
    }

    /// Read events until `cancel` fires, calling `on_event` for each.
    ///
    /// Returns `Ok(())` on cancellation, or the transport error if the
    /// connection drops.
    pub async fn run<F>(&mut self, cancel: &CancellationToken, mut on_event: F) -> Result<(), Error>
    where
        F: FnMut(&HubEvent),
    {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("Event tap cancelled");
                    return Ok(());
                }
                frame = self.session.recv_text() => {
                    if let Some(event) = parse_event_frame(&frame?) {
                        on_event(&event);
                    }
                }
            }
        }
    }

    /// Release the connection.
    pub async fn close(self) {
        self.session.close().await;
    }
}

// ── Frame parsing ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EventFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    event: Option<HubEvent>,
}

/// Extract the event from an `{"type": "event", "event": {...}}` frame.
///
/// Results, pongs, and anything unparseable yield `None`.
fn parse_event_frame(text: &str) -> Option<HubEvent> {
    let frame: EventFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            debug!(error = %e, "Failed to parse frame");
            return None;
        }
    };

    if frame.kind != "event" {
        trace!(kind = %frame.kind, "Skipping non-event frame");
        return None;
    }
    frame.event
}

// ── Tests ────────────────────────────────────────────────────────────

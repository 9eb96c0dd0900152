//! Transport session: one authenticated WebSocket connection to the hub.
//!
//! A [`Session`] owns the socket for its whole lifetime. It is created by
//! [`Session::open`], which performs the fixed three-message handshake:
//!
//! 1. hub → client: unsolicited hello (`auth_required`)
//! 2. client → hub: `{"type": "auth", "access_token": ...}`
//! 3. hub → client: `auth_ok` (anything else is an authentication failure)
//!
//! After the handshake the session is turned into exactly one consumption
//! mode, either request/reply ([`RpcClient`]) or the event stream
//! ([`EventTap`]). The two never share a live socket.

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::Error;
use crate::events::EventTap;
use crate::rpc::RpcClient;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An authenticated connection to the hub.
pub struct Session {
    stream: WsStream,
    url: Url,
}

impl Session {
    /// Connect to `url` (a `ws://` / `wss://` endpoint) and authenticate.
    ///
    /// No retries: a refused connection or a rejected token is returned
    /// as-is. On authentication failure the socket is closed before
    /// returning.
    pub async fn open(url: &Url, token: &SecretString) -> Result<Self, Error> {
        info!(url = %url, "Connecting to hub");

        let (stream, _response) =
            tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| Error::Connect {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        let mut session = Self {
            stream,
            url: url.clone(),
        };

        if let Err(e) = session.handshake(token).await {
            session.close().await;
            return Err(e);
        }

        info!("Authenticated with hub");
        Ok(session)
    }

    async fn handshake(&mut self, token: &SecretString) -> Result<(), Error> {
        let hello = self.recv_text().await.map_err(|e| Error::Authentication {
            message: format!("no hello from hub: {e}"),
        })?;
        trace!(hello = %hello, "Hub hello");

        let auth = serde_json::json!({
            "type": "auth",
            "access_token": token.expose_secret(),
        });
        self.send_json(&auth).await?;

        let reply = self.recv_text().await.map_err(|e| Error::Authentication {
            message: format!("no auth reply from hub: {e}"),
        })?;

        check_auth_reply(&reply)
    }

    /// The endpoint this session is connected to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Switch to request/reply mode.
    pub fn into_rpc(self) -> RpcClient {
        RpcClient::new(self)
    }

    /// Switch to event-stream mode.
    pub fn into_event_tap(self) -> EventTap {
        EventTap::new(self)
    }

    /// Close the connection.
    ///
    /// Always releases the socket; a failing close frame is only logged
    /// since the peer may already be gone.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Close frame not delivered");
        }
    }

    // ── Frame I/O (crate-internal) ───────────────────────────────────

    /// Serialize `value` and send it as a single text frame.
    pub(crate) async fn send_json(&mut self, value: &Value) -> Result<(), Error> {
        self.stream
            .send(Message::text(value.to_string()))
            .await
            .map_err(Error::from)
    }

    /// Wait for the next text frame.
    ///
    /// Pings, pongs and binary frames are skipped; a close frame or the end
    /// of the stream becomes [`Error::ConnectionClosed`].
    pub(crate) async fn recv_text(&mut self) -> Result<String, Error> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Close(frame))) => {
                    if let Some(cf) = frame {
                        debug!(code = %cf.code, reason = %cf.reason.as_str(), "Close frame received");
                    }
                    return Err(Error::ConnectionClosed);
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    trace!("WebSocket ping/pong");
                }
                Some(Ok(_)) => {
                    warn!("Ignoring non-text frame");
                }
                Some(Err(e)) => return Err(Error::from(e)),
                None => return Err(Error::ConnectionClosed),
            }
        }
    }
}

/// The hub acknowledges a valid token with `{"type": "auth_ok", ...}`.
fn check_auth_reply(reply: &str) -> Result<(), Error> {
    let parsed: Value = serde_json::from_str(reply).map_err(|_| Error::Authentication {
        message: format!("unexpected reply: {reply}"),
    })?;

    match parsed.get("type").and_then(Value::as_str) {
        Some("auth_ok") => Ok(()),
        _ => Err(Error::Authentication {
            message: parsed
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| format!("unexpected reply: {reply}"), str::to_owned),
        }),
    }
}

/// Derive the WebSocket endpoint from a hub base URL.
///
/// `http`/`https` map to `ws`/`wss`; `/api/websocket` is appended unless the
/// path already ends with it. Query and fragment are kept.
pub fn websocket_url(base: &Url) -> Result<Url, Error> {
    let unsupported = |reason: String| Error::Connect {
        url: base.to_string(),
        reason,
    };
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(unsupported(format!("unsupported scheme '{other}'"))),
    };

    let mut url = base.clone();
    url.set_scheme(scheme)
        .map_err(|()| unsupported(format!("cannot switch to '{scheme}'")))?;

    if !url.path().trim_end_matches('/').ends_with("/api/websocket") {
        url.path_segments_mut()
            .map_err(|()| unsupported("URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(["api", "websocket"]);
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn auth_ok_reply_accepted() {
        assert!(check_auth_reply(r#"{"type":"auth_ok","ha_version":"2025.1.0"}"#).is_ok());
    }

    #[test]
    fn auth_invalid_reply_rejected_with_message() {
        let err = check_auth_reply(r#"{"type":"auth_invalid","message":"Invalid access token"}"#)
            .unwrap_err();
        match err {
            Error::Authentication { message } => assert_eq!(message, "Invalid access token"),
            other => panic!("expected Authentication, got {other:?}"),
        }
    }

    #[test]
    fn non_json_reply_rejected() {
        assert!(matches!(
            check_auth_reply("auth_ok"),
            Err(Error::Authentication { .. })
        ));
    }

    #[test]
    fn websocket_url_from_http_base() {
        let base = Url::parse("http://homeassistant.local:8123").unwrap();
        assert_eq!(
            websocket_url(&base).unwrap().as_str(),
            "ws://homeassistant.local:8123/api/websocket"
        );
    }

    #[test]
    fn websocket_url_keeps_existing_path() {
        let base = Url::parse("wss://hub.example.com/api/websocket").unwrap();
        assert_eq!(
            websocket_url(&base).unwrap().as_str(),
            "wss://hub.example.com/api/websocket"
        );
    }

    #[test]
    fn websocket_url_https_trailing_slash() {
        let base = Url::parse("https://hub.example.com/").unwrap();
        assert_eq!(
            websocket_url(&base).unwrap().as_str(),
            "wss://hub.example.com/api/websocket"
        );
    }

    #[test]
    fn websocket_url_keeps_query_and_fragment() {
        let base = Url::parse("http://hub:8123/?x=1#top").unwrap();
        assert_eq!(
            websocket_url(&base).unwrap().as_str(),
            "ws://hub:8123/api/websocket?x=1#top"
        );
    }

    #[test]
    fn websocket_url_under_path_prefix() {
        let base = Url::parse("https://example.com/ha/").unwrap();
        assert_eq!(
            websocket_url(&base).unwrap().as_str(),
            "wss://example.com/ha/api/websocket"
        );
    }

    #[test]
    fn websocket_url_rejects_other_schemes() {
        let base = Url::parse("ftp://hub").unwrap();
        assert!(websocket_url(&base).is_err());
    }
}

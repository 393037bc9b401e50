// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single live WebSocket connection of a chat session.
//!
//! The credential is bound at handshake time via the `token` query
//! parameter; frames themselves carry no auth. There is no reconnect: a
//! closed connection stays closed until the session is re-authorized.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::ChatError;
use crate::protocol::OutboundEvent;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// What the connection produced next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A text frame, still undecoded.
    Frame(String),
    /// The connection is gone. Carries the server's close reason, or the
    /// transport error, or an empty string when neither was given.
    Closed(String),
}

pub struct ConnectionManager {
    server_url: String,
    conn: Option<WsStream>,
}

impl ConnectionManager {
    /// `server_url` is the HTTP base URL; the WS URL is derived from it.
    pub fn new(server_url: &str) -> Self {
        Self { server_url: server_url.to_owned(), conn: None }
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Open the connection, presenting `credential` at the handshake.
    pub async fn connect(&mut self, credential: &str) -> Result<(), ChatError> {
        if self.conn.is_some() {
            return Err(ChatError::AlreadyConnected);
        }
        let url = build_ws_url(&self.server_url, credential);
        if url.starts_with("ws://") {
            // The token sits in the upgrade URL; on plaintext transport it is
            // visible to anything on the path.
            warn!(server = %self.server_url, "access token sent over unencrypted ws://");
        }
        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| ChatError::ConnectFailed(e.to_string()))?;
        info!(server = %self.server_url, "connected");
        self.conn = Some(stream);
        Ok(())
    }

    /// Serialize and transmit one event. Returns whether a frame was written;
    /// on a closed connection this does nothing.
    pub async fn send(&mut self, event: &OutboundEvent) -> bool {
        let Some(conn) = self.conn.as_mut() else {
            debug!(kind = event.kind(), "send on closed connection dropped");
            return false;
        };
        let text = match event.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(kind = event.kind(), err = %e, "failed to encode outbound event");
                return false;
            }
        };
        match conn.send(Message::Text(text.into())).await {
            Ok(()) => true,
            Err(e) => {
                debug!(kind = event.kind(), err = %e, "send failed");
                false
            }
        }
    }

    /// Keepalive ping. Returns whether it was written.
    pub async fn ping(&mut self) -> bool {
        match self.conn.as_mut() {
            Some(conn) => conn.send(Message::Ping(Vec::new().into())).await.is_ok(),
            None => false,
        }
    }

    /// Wait for the next text frame or the close. Control frames are skipped
    /// and binary frames are dropped with a warning. Once closed, the manager no longer holds a connection.
    pub async fn next_event(&mut self) -> ConnectionEvent {
        let Some(conn) = self.conn.as_mut() else {
            return ConnectionEvent::Closed(String::new());
        };
        let reason = loop {
            match conn.next().await {
                Some(Ok(Message::Text(text))) => {
                    return ConnectionEvent::Frame(text.as_str().to_owned());
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame.map(|f| f.reason.as_str().to_owned()).unwrap_or_default();
                }
                Some(Ok(Message::Binary(data))) => {
                    warn!(len = data.len(), "dropping binary frame");
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => break e.to_string(),
                None => break String::new(),
            }
        };
        info!(reason = %reason, "connection closed");
        self.conn = None;
        ConnectionEvent::Closed(reason)
    }

    /// Close with a best-effort close frame.
    pub async fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            let _ = conn.close(None).await;
            debug!("connection closed locally");
        }
    }
}

/// Build the WebSocket URL from an HTTP base URL.
pub fn build_ws_url(base_url: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_owned()
    };
    format!("{ws_base}/ws?token={token}")
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;

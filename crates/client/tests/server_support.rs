// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process chat server for integration tests.
//!
//! Serves `POST /authenticate`, `POST /authorize` and `GET /ws?token=`.
//! Tests push frames (or a close) to the connected client and read back
//! what the client sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Writer whose contents stay readable while a view owns a clone.
#[derive(Debug, Clone, Default)]
pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    pub fn contents(&self) -> String {
        self.0.lock().map(|buf| String::from_utf8_lossy(&buf).into_owned()).unwrap_or_default()
    }

    /// Poll until the output contains `needle`.
    pub async fn wait_for(&self, needle: &str) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while !self.contents().contains(needle) {
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("timed out waiting for {needle:?}, output: {:?}", self.contents());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }
}

impl std::io::Write for SharedOutput {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let mut buf = self.0.lock().map_err(|_| std::io::Error::other("poisoned"))?;
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

enum Push {
    Frame(String),
    Binary(Vec<u8>),
    Close(String),
}

struct ServerState {
    /// token -> username
    tokens: Mutex<HashMap<String, String>>,
    reject_logins: AtomicBool,
    connections: AtomicU32,
    /// Tokens presented on successful upgrades.
    handshakes: Mutex<Vec<String>>,
    outbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<Push>>,
    received: mpsc::UnboundedSender<String>,
}

impl ServerState {
    fn username_for(&self, token: &str) -> Option<String> {
        self.tokens.lock().ok()?.get(token).cloned()
    }
}

pub struct FakeChatServer {
    pub addr: SocketAddr,
    state: Arc<ServerState>,
    push: mpsc::UnboundedSender<Push>,
    received: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeChatServer {
    pub async fn spawn() -> anyhow::Result<Self> {
        let (push, outbound) = mpsc::unbounded_channel();
        let (received_tx, received) = mpsc::unbounded_channel();
        let state = Arc::new(ServerState {
            tokens: Mutex::new(HashMap::new()),
            reject_logins: AtomicBool::new(false),
            connections: AtomicU32::new(0),
            handshakes: Mutex::new(Vec::new()),
            outbound: tokio::sync::Mutex::new(outbound),
            received: received_tx,
        });

        let router = Router::new()
            .route("/authenticate", post(authenticate))
            .route("/authorize", post(authorize))
            .route("/ws", get(ws_handler))
            .with_state(Arc::clone(&state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Ok(Self { addr, state, push, received: tokio::sync::Mutex::new(received), _handle: handle })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Accept `token` as belonging to `username`.
    pub fn issue(&self, token: &str, username: &str) {
        if let Ok(mut tokens) = self.state.tokens.lock() {
            tokens.insert(token.to_owned(), username.to_owned());
        }
    }

    pub fn revoke(&self, token: &str) {
        if let Ok(mut tokens) = self.state.tokens.lock() {
            tokens.remove(token);
        }
    }

    pub fn reject_logins(&self) {
        self.state.reject_logins.store(true, Ordering::Relaxed);
    }

    pub fn connections(&self) -> u32 {
        self.state.connections.load(Ordering::Relaxed)
    }

    pub fn handshakes(&self) -> Vec<String> {
        self.state.handshakes.lock().map(|h| h.clone()).unwrap_or_default()
    }

    /// Queue an envelope for the connected (or next) client.
    pub fn push_event(&self, kind: &str, payload: serde_json::Value) {
        self.push_raw(&serde_json::json!({ "type": kind, "payload": payload }).to_string());
    }

    pub fn push_raw(&self, raw: &str) {
        let _ = self.push.send(Push::Frame(raw.to_owned()));
    }

    pub fn push_binary(&self, data: &[u8]) {
        let _ = self.push.send(Push::Binary(data.to_vec()));
    }

    /// Queue a close frame carrying `reason`.
    pub fn push_close(&self, reason: &str) {
        let _ = self.push.send(Push::Close(reason.to_owned()));
    }

    /// Next text frame the client sent, as JSON.
    pub async fn next_received(&self) -> anyhow::Result<serde_json::Value> {
        let mut rx = self.received.lock().await;
        let text = tokio::time::timeout(RECV_TIMEOUT, rx.recv())
            .await
            .map_err(|_| anyhow::anyhow!("server recv timeout"))?
            .ok_or_else(|| anyhow::anyhow!("server recv channel closed"))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Poll until `n` clients have connected.
    pub async fn wait_for_connections(&self, n: u32) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while self.connections() < n {
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("timed out waiting for {n} connections, saw {}", self.connections());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
}

async fn authenticate(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<LoginBody>,
) -> Response {
    if state.reject_logins.load(Ordering::Relaxed) || body.username.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "bad username").into_response();
    }
    let token = format!("tok-{}", body.username);
    if let Ok(mut tokens) = state.tokens.lock() {
        tokens.insert(token.clone(), body.username);
    }
    Json(serde_json::json!({ "accessToken": token })).into_response()
}

async fn authorize(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();
    match state.username_for(token) {
        Some(username) => Json(serde_json::json!({ "username": username })).into_response(),
        None => (StatusCode::UNAUTHORIZED, "unauthorized").into_response(),
    }
}

#[derive(Deserialize)]
struct WsQuery {
    token: Option<String>,
}

async fn ws_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let token = query.token.unwrap_or_default();
    if state.username_for(&token).is_none() {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }
    if let Ok(mut handshakes) = state.handshakes.lock() {
        handshakes.push(token);
    }
    ws.on_upgrade(move |socket| handle_socket(state, socket)).into_response()
}

async fn handle_socket(state: Arc<ServerState>, socket: WebSocket) {
    state.connections.fetch_add(1, Ordering::Relaxed);
    let (mut tx, mut rx) = socket.split();
    let mut outbound = state.outbound.lock().await;

    loop {
        tokio::select! {
            push = outbound.recv() => match push {
                Some(Push::Frame(text)) => {
                    if tx.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(Push::Binary(data)) => {
                    if tx.send(Message::Binary(data.into())).await.is_err() {
                        break;
                    }
                }
                Some(Push::Close(reason)) => {
                    let frame = CloseFrame { code: 1000, reason: reason.into() };
                    let _ = tx.send(Message::Close(Some(frame))).await;
                    break;
                }
                None => break,
            },
            msg = rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let _ = state.received.send(text.as_str().to_owned());
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

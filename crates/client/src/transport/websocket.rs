//! WebSocket subscription to one workspace's events.

use crate::error::{ClientError, ClientResult};
use futures_util::{SinkExt, StreamExt};
use gorev_core::events::Event;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info};
use url::Url;

pub const WS_PATH: &str = "/api/v1/ws";

/// Live feed of events for a single workspace.
pub struct EventSubscriber {
    sender: mpsc::Sender<Message>,
    receiver: mpsc::Receiver<ClientResult<Event>>,
}

impl EventSubscriber {
    pub async fn connect(base_url: &Url, workspace_id: &str) -> ClientResult<Self> {
        let ws_url = build_ws_url(base_url, workspace_id)?;
        debug!(url = %ws_url, "Connecting to WebSocket");

        let (ws_stream, _) = connect_async(ws_url.as_str())
            .await
            .map_err(|e| ClientError::WebSocket(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<Message>(16);
        let (event_tx, event_rx) = mpsc::channel::<ClientResult<Event>>(128);

        tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                if let Err(e) = write.send(message).await {
                    error!(error = %e, "Failed to send WebSocket message");
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                let item = match msg {
                    Ok(Message::Text(text)) => match parse_frame(&text) {
                        Some(event) => event,
                        None => continue,
                    },
                    Ok(Message::Close(_)) => {
                        info!("WebSocket connection closed");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => Err(ClientError::WebSocket(e.to_string())),
                };
                let failed = item.is_err();
                if event_tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });

        info!(workspace = %workspace_id, "WebSocket connected");
        Ok(Self {
            sender: out_tx,
            receiver: event_rx,
        })
    }

    /// Application-level ping; the daemon answers with `{"type":"pong"}`, which is swallowed.
    pub async fn ping(&self) -> ClientResult<()> {
        self.sender
            .send(Message::Text(r#"{"type":"ping"}"#.to_string()))
            .await
            .map_err(|_| ClientError::WebSocket("Not connected".to_string()))
    }

    /// `None` once the connection is closed.
    pub async fn next_event(&mut self) -> Option<ClientResult<Event>> {
        self.receiver.recv().await
    }

    pub async fn close(self) -> ClientResult<()> {
        self.sender
            .send(Message::Close(None))
            .await
            .map_err(|_| ClientError::WebSocket("Not connected".to_string()))
    }
}

/// `http://host:port` -> `ws://host:port/api/v1/ws?workspace_id=...`
fn build_ws_url(base_url: &Url, workspace_id: &str) -> ClientResult<Url> {
    let mut url = base_url.clone();
    let scheme = match url.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::Config("Failed to set WebSocket scheme".to_string()))?;
    url.set_path(WS_PATH);
    url.query_pairs_mut()
        .clear()
        .append_pair("workspace_id", workspace_id);
    Ok(url)
}

/// Events pass through; control frames such as pongs yield `None`.
fn parse_frame(text: &str) -> Option<ClientResult<Event>> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => return Some(Err(e.into())),
    };
    match value.get("type").and_then(Value::as_str) {
        Some("pong") | Some("ping") => None,
        _ => Some(serde_json::from_value(value).map_err(ClientError::from)),
    }
}

//! WebSocket endpoint relaying workspace events to UI subscribers.

mod hub;

pub use hub::{Hub, HubHandle};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::{SinkExt, StreamExt};
use gorev_client::HEADER_WORKSPACE_ID;
use gorev_core::{Event, EventKind};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::config::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    workspace_id: Option<String>,
}

/// Control frames a client may send
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    Pong,
}

/// `GET /api/v1/ws?workspace_id=...`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let workspace_id = query
        .workspace_id
        .or_else(|| {
            headers
                .get(HEADER_WORKSPACE_ID)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    ws.on_upgrade(move |mut socket| async move {
        match workspace_id {
            Some(workspace_id) => handle_socket(socket, state, workspace_id).await,
            None => {
                tracing::debug!("WebSocket without workspace id, closing");
                let _ = socket.send(Message::Close(None)).await;
            }
        }
    })
}

/// `GET /api/v1/ws/stats`
pub async fn ws_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.hub.stats().await)
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, workspace_id: String) {
    let Some(mut subscription) = state.hub.subscribe(&workspace_id).await else {
        tracing::warn!(workspace = %workspace_id, "Event hub unavailable, closing socket");
        return;
    };
    tracing::info!(workspace = %workspace_id, subscriber = %subscription.id, "WebSocket connected");

    let (mut sender, mut receiver) = socket.split();

    let connected = Event::new(
        workspace_id.as_str(),
        EventKind::WorkspaceSync {
            action: "connected".to_string(),
            data: json!({ "subscriber_id": subscription.id }),
        },
    );
    if send_json(&mut sender, &connected).await.is_err() {
        state.hub.unsubscribe(&subscription).await;
        return;
    }

    loop {
        tokio::select! {
            event = subscription.events.recv() => {
                let Some(event) = event else {
                    // dropped by the hub: slow consumer or shutdown
                    break;
                };
                if send_json(&mut sender, &event).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(ClientMessage::Ping) = serde_json::from_str::<ClientMessage>(text.as_str()) {
                            if send_json(&mut sender, &ServerMessage::Pong).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if sender.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "WebSocket receive error");
                        break;
                    }
                }
            }
        }
    }

    state.hub.unsubscribe(&subscription).await;
    let _ = sender.send(Message::Close(None)).await;
    tracing::info!(workspace = %workspace_id, subscriber = %subscription.id, "WebSocket disconnected");
}

async fn send_json<S, T>(sender: &mut S, value: &T) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
    T: Serialize,
{
    let text = serde_json::to_string(value).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize WebSocket message");
    })?;
    sender
        .send(Message::Text(text.into()))
        .await
        .map_err(|_| ())
}

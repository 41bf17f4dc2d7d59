//! Event hub: a single task owning the subscriber table.
//!
//! Publishers never block. Events go through a bounded queue with `try_send`, and a
//! full queue drops the event with a warning. Each subscriber has its own bounded
//! queue; a subscriber that falls behind is disconnected rather than slowing the
//! others down. Events for one workspace reach each subscriber in publish order.

use gorev_core::{Event, EventEmitter};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

enum Command {
    Subscribe {
        workspace_id: String,
        subscriber_id: String,
        sender: mpsc::Sender<Event>,
    },
    Unsubscribe {
        workspace_id: String,
        subscriber_id: String,
    },
    Publish(Event),
    Stats(oneshot::Sender<HubStats>),
    Shutdown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub total_subscribers: usize,
    pub workspaces: BTreeMap<String, usize>,
}

/// Receiving end handed to a WebSocket connection
pub struct Subscription {
    pub id: String,
    pub workspace_id: String,
    pub events: mpsc::Receiver<Event>,
}

/// Cheap, cloneable access to the hub
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<Command>,
    subscriber_buffer: usize,
}

impl HubHandle {
    pub async fn subscribe(&self, workspace_id: &str) -> Option<Subscription> {
        let (sender, events) = mpsc::channel(self.subscriber_buffer);
        let subscriber_id = Uuid::new_v4().to_string();
        self.commands
            .send(Command::Subscribe {
                workspace_id: workspace_id.to_string(),
                subscriber_id: subscriber_id.clone(),
                sender,
            })
            .await
            .ok()?;
        Some(Subscription {
            id: subscriber_id,
            workspace_id: workspace_id.to_string(),
            events,
        })
    }

    pub async fn unsubscribe(&self, subscription: &Subscription) {
        let _ = self
            .commands
            .send(Command::Unsubscribe {
                workspace_id: subscription.workspace_id.clone(),
                subscriber_id: subscription.id.clone(),
            })
            .await;
    }

    pub async fn stats(&self) -> HubStats {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Stats(tx)).await.is_err() {
            return HubStats::default();
        }
        rx.await.unwrap_or_default()
    }

    /// Queue a stop behind every event published so far.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}

impl EventEmitter for HubHandle {
    fn emit(&self, event: Event) {
        match self.commands.try_send(Command::Publish(event)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(Command::Publish(event))) => {
                tracing::warn!(
                    workspace = %event.workspace_id,
                    event = event.type_name(),
                    "Event queue full, dropping event"
                );
            }
            Err(_) => tracing::debug!("Event hub stopped, dropping event"),
        }
    }
}

pub struct Hub {
    commands: mpsc::Receiver<Command>,
    subscribers: HashMap<String, HashMap<String, mpsc::Sender<Event>>>,
}

impl Hub {
    /// Start the hub task.
    pub fn spawn(event_buffer: usize, subscriber_buffer: usize) -> (HubHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(event_buffer.max(1));
        let hub = Self {
            commands: rx,
            subscribers: HashMap::new(),
        };
        let handle = HubHandle {
            commands: tx,
            subscriber_buffer: subscriber_buffer.max(1),
        };
        (handle, tokio::spawn(hub.run()))
    }

    async fn run(mut self) {
        tracing::debug!("Event hub started");
        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Subscribe {
                    workspace_id,
                    subscriber_id,
                    sender,
                } => {
                    tracing::debug!(workspace = %workspace_id, subscriber = %subscriber_id, "Subscriber joined");
                    self.subscribers
                        .entry(workspace_id)
                        .or_default()
                        .insert(subscriber_id, sender);
                }
                Command::Unsubscribe {
                    workspace_id,
                    subscriber_id,
                } => self.remove(&workspace_id, &subscriber_id),
                Command::Publish(event) => self.broadcast(event),
                Command::Stats(reply) => {
                    let _ = reply.send(self.stats());
                }
                Command::Shutdown => break,
            }
        }
        let total: usize = self.subscribers.values().map(HashMap::len).sum();
        self.subscribers.clear();
        tracing::info!(disconnected = total, "Event hub stopped");
    }

    fn broadcast(&mut self, event: Event) {
        let Some(subscribers) = self.subscribers.get_mut(&event.workspace_id) else {
            return;
        };
        subscribers.retain(|id, sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(workspace = %event.workspace_id, subscriber = %id, "Slow subscriber, disconnecting");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
        if subscribers.is_empty() {
            self.subscribers.remove(&event.workspace_id);
        }
    }

    fn remove(&mut self, workspace_id: &str, subscriber_id: &str) {
        if let Some(subscribers) = self.subscribers.get_mut(workspace_id) {
            subscribers.remove(subscriber_id);
            if subscribers.is_empty() {
                self.subscribers.remove(workspace_id);
            }
        }
        tracing::debug!(workspace = %workspace_id, subscriber = %subscriber_id, "Subscriber left");
    }

    fn stats(&self) -> HubStats {
        let workspaces: BTreeMap<String, usize> = self
            .subscribers
            .iter()
            .map(|(ws, subs)| (ws.clone(), subs.len()))
            .collect();
        HubStats {
            total_subscribers: workspaces.values().sum(),
            workspaces,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gorev_core::EventKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_events_are_filtered_by_workspace_and_ordered() {
        let (hub, task) = Hub::spawn(16, 16);
        let mut a = hub.subscribe("ws-a").await.unwrap();
        let mut b = hub.subscribe("ws-b").await.unwrap();

        hub.emit_task_created("ws-a", "t1", json!({}));
        hub.emit_task_updated("ws-a", "t1", json!({}));
        hub.emit_task_deleted("ws-b", "t9");

        let first = a.events.recv().await.unwrap();
        let second = a.events.recv().await.unwrap();
        assert!(matches!(first.kind, EventKind::TaskCreated { .. }));
        assert!(matches!(second.kind, EventKind::TaskUpdated { .. }));

        let other = b.events.recv().await.unwrap();
        assert_eq!(other.workspace_id, "ws-b");
        assert!(a.events.try_recv().is_err());

        hub.shutdown().await;
        task.await.unwrap();
        assert!(a.events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_slow_subscriber_is_disconnected() {
        let (hub, _task) = Hub::spawn(16, 1);
        let mut slow = hub.subscribe("ws").await.unwrap();
        let fast = hub.subscribe("ws").await.unwrap();
        drop(fast);

        hub.emit_workspace_sync("ws");
        hub.emit_workspace_sync("ws");

        assert_eq!(slow.events.recv().await.unwrap().type_name(), "workspace_sync");
        assert!(slow.events.recv().await.is_none());
        assert_eq!(hub.stats().await.total_subscribers, 0);
    }

    #[tokio::test]
    async fn test_stats_and_unsubscribe() {
        let (hub, _task) = Hub::spawn(16, 16);
        let a = hub.subscribe("ws-a").await.unwrap();
        let _b = hub.subscribe("ws-a").await.unwrap();
        let _c = hub.subscribe("ws-b").await.unwrap();

        let stats = hub.stats().await;
        assert_eq!(stats.total_subscribers, 3);
        assert_eq!(stats.workspaces["ws-a"], 2);

        hub.unsubscribe(&a).await;
        let stats = hub.stats().await;
        assert_eq!(stats.total_subscribers, 2);
        assert_eq!(stats.workspaces["ws-a"], 1);
    }

    #[tokio::test]
    async fn test_emit_never_blocks_when_queue_is_full() {
        let (hub, task) = Hub::spawn(1, 16);
        hub.shutdown().await;
        task.await.unwrap();
        for _ in 0..10 {
            hub.emit_workspace_sync("ws");
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A change inside one workspace, broadcast to that workspace's subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub workspace_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(workspace_id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn task_created(workspace_id: &str, task_id: &str, data: Value) -> Self {
        Self::new(
            workspace_id,
            EventKind::TaskCreated {
                entity_id: task_id.to_string(),
                data,
            },
        )
    }

    pub fn task_updated(workspace_id: &str, task_id: &str, data: Value) -> Self {
        Self::new(
            workspace_id,
            EventKind::TaskUpdated {
                entity_id: task_id.to_string(),
                data,
            },
        )
    }

    pub fn task_deleted(workspace_id: &str, task_id: &str) -> Self {
        Self::new(
            workspace_id,
            EventKind::TaskDeleted {
                entity_id: task_id.to_string(),
            },
        )
    }

    pub fn project_created(workspace_id: &str, project_id: &str, data: Value) -> Self {
        Self::new(
            workspace_id,
            EventKind::ProjectCreated {
                entity_id: project_id.to_string(),
                data,
            },
        )
    }

    pub fn workspace_sync(workspace_id: &str, action: &str) -> Self {
        Self::new(
            workspace_id,
            EventKind::WorkspaceSync {
                action: action.to_string(),
                data: Value::Null,
            },
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            EventKind::TaskCreated { .. } => "task_created",
            EventKind::TaskUpdated { .. } => "task_updated",
            EventKind::TaskDeleted { .. } => "task_deleted",
            EventKind::ProjectCreated { .. } => "project_created",
            EventKind::WorkspaceSync { .. } => "workspace_sync",
        }
    }
}

/// Types of change events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    TaskCreated {
        entity_id: String,
        #[serde(default)]
        data: Value,
    },
    TaskUpdated {
        entity_id: String,
        #[serde(default)]
        data: Value,
    },
    TaskDeleted {
        entity_id: String,
    },
    ProjectCreated {
        entity_id: String,
        #[serde(default)]
        data: Value,
    },
    WorkspaceSync {
        action: String,
        #[serde(default, skip_serializing_if = "Value::is_null")]
        data: Value,
    },
}

/// Sink for workspace events.
///
/// `emit` must not block: implementations enqueue and return.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: Event);

    fn emit_task_created(&self, workspace_id: &str, task_id: &str, data: Value) {
        self.emit(Event::task_created(workspace_id, task_id, data));
    }

    fn emit_task_updated(&self, workspace_id: &str, task_id: &str, data: Value) {
        self.emit(Event::task_updated(workspace_id, task_id, data));
    }

    fn emit_task_deleted(&self, workspace_id: &str, task_id: &str) {
        self.emit(Event::task_deleted(workspace_id, task_id));
    }

    fn emit_project_created(&self, workspace_id: &str, project_id: &str, data: Value) {
        self.emit(Event::project_created(workspace_id, project_id, data));
    }

    fn emit_workspace_sync(&self, workspace_id: &str) {
        self.emit(Event::workspace_sync(workspace_id, "refresh"));
    }
}

/// Emitter for contexts that have no hub to talk to
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEmitter;

impl EventEmitter for NoOpEmitter {
    fn emit(&self, event: Event) {
        tracing::trace!(event = event.type_name(), workspace = %event.workspace_id, "Dropping event (no hub)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Event>>);

    impl EventEmitter for Recorder {
        fn emit(&self, event: Event) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_event_wire_format() {
        let event = Event::task_created("abcd", "t-1", serde_json::json!({"baslik": "x"}));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "task_created");
        assert_eq!(value["workspace_id"], "abcd");
        assert_eq!(value["entity_id"], "t-1");
        assert_eq!(value["data"]["baslik"], "x");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_event_roundtrip_keeps_kind() {
        let event = Event::workspace_sync("abcd", "connected");
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_typed_helpers_route_through_emit() {
        let recorder = Recorder::default();
        recorder.emit_task_deleted("ws", "t-9");
        recorder.emit_workspace_sync("ws");

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].type_name(), "task_deleted");
        assert_eq!(events[1].type_name(), "workspace_sync");
    }
}

// JSON-RPC method dispatch over the tool registry, with change events for mutating tools

use crate::error::{DispatchError, ToolError};
use crate::protocol::{CallToolParams, CallToolResult, InitializeResult, ListToolsResult};
use crate::tools::{Args, ToolContext, ToolName, ToolRegistry};
use gorev_core::{Event, LanguageSetting, WorkspaceContext};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::{Arc, LazyLock};

static ENTITY_ID: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"ID:\s*([a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12})").ok()
});

/// First `ID: <uuid>` in a tool's response text.
pub fn extract_entity_id(text: &str) -> Option<String> {
    let re = ENTITY_ID.as_ref()?;
    re.captures(text).map(|c| c[1].to_string())
}

/// Result of one dispatch plus the events it should produce, in order.
#[derive(Debug)]
pub struct Dispatch {
    pub result: Value,
    pub events: Vec<Event>,
}

impl Dispatch {
    fn quiet(result: Value) -> Self {
        Self {
            result,
            events: Vec::new(),
        }
    }
}

pub struct Dispatcher {
    registry: ToolRegistry,
    lang: Arc<LanguageSetting>,
    version: String,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry, lang: Arc<LanguageSetting>, version: impl Into<String>) -> Self {
        Self {
            registry,
            lang,
            version: version.into(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Dispatch and publish the resulting events through the workspace's emitter.
    pub async fn dispatch(
        &self,
        method: &str,
        params: Value,
        workspace: Option<&WorkspaceContext>,
    ) -> Result<Value, DispatchError> {
        let Dispatch { result, events } = self.dispatch_inner(method, params, workspace).await?;
        if let Some(ws) = workspace {
            if !events.is_empty() {
                ws.refresh_task_count();
            }
            for event in events {
                tracing::debug!(workspace = %ws.id, event = event.type_name(), "Emitting event");
                ws.emitter.emit(event);
            }
        }
        Ok(result)
    }

    /// Dispatch without side effects beyond the tool itself.
    pub async fn dispatch_inner(
        &self,
        method: &str,
        params: Value,
        workspace: Option<&WorkspaceContext>,
    ) -> Result<Dispatch, DispatchError> {
        let result = match method {
            "initialize" => to_value(InitializeResult::new(&self.version))?,
            "notifications/initialized" => json!({}),
            "tools/list" => to_value(ListToolsResult {
                tools: self.registry.list_schemas(),
            })?,
            "resources/list" => json!({ "resources": [] }),
            "resources/templates/list" => json!({ "resourceTemplates": [] }),
            "tools/call" => {
                let call: CallToolParams = serde_json::from_value(params)
                    .map_err(|e| DispatchError::InvalidParams(format!("tools/call: {}", e)))?;
                if call.name.trim().is_empty() {
                    return Err(DispatchError::InvalidParams("tools/call: missing tool name".to_string()));
                }
                return self.call_tool(call.name.trim(), call.arguments, workspace).await;
            }
            tool => return self.call_tool(tool, params, workspace).await,
        };
        Ok(Dispatch::quiet(result))
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
        workspace: Option<&WorkspaceContext>,
    ) -> Result<Dispatch, DispatchError> {
        let tool_name = match name.parse::<ToolName>() {
            Ok(tool_name) => tool_name,
            Err(e) => return error_result(e),
        };
        let Some(tool) = self.registry.get(tool_name) else {
            return error_result(ToolError::Unknown(name.to_string()));
        };
        let args = match Args::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return error_result(e),
        };

        let ctx = ToolContext::new(workspace, self.lang.get());
        match tool.execute(ctx, &args).await {
            Ok(text) => {
                let events = workspace
                    .map(|ws| events_for(tool_name, &args, &text, ws.id.as_str()))
                    .unwrap_or_default();
                Ok(Dispatch {
                    result: to_value(CallToolResult::text(text))?,
                    events,
                })
            }
            Err(ToolError::MissingWorkspace) => Err(DispatchError::MissingWorkspace),
            Err(ToolError::Service(e)) if e.is_internal() => {
                tracing::error!(tool = %tool_name, error = %e, "Tool failed");
                Err(DispatchError::Internal(e.to_string()))
            }
            Err(e) => {
                tracing::debug!(tool = %tool_name, error = %e, "Tool returned an error");
                error_result(e)
            }
        }
    }
}

fn to_value(value: impl serde::Serialize) -> Result<Value, DispatchError> {
    serde_json::to_value(value).map_err(|e| DispatchError::Internal(e.to_string()))
}

fn error_result(error: ToolError) -> Result<Dispatch, DispatchError> {
    Ok(Dispatch::quiet(to_value(CallToolResult::error(error.to_string()))?))
}

/// Events a successful tool call produces.
pub fn events_for(tool: ToolName, args: &Args, text: &str, workspace_id: &str) -> Vec<Event> {
    let sync = || vec![Event::workspace_sync(workspace_id, "refresh")];
    let created = || match extract_entity_id(text) {
        Some(id) => vec![Event::task_created(workspace_id, &id, args.to_value())],
        None => sync(),
    };

    match tool {
        ToolName::GorevGuncelle | ToolName::GorevDuzenle => args
            .str("id")
            .map(|id| vec![Event::task_updated(workspace_id, id, args.to_value())])
            .unwrap_or_default(),
        ToolName::GorevSil => args
            .str("id")
            .map(|id| vec![Event::task_deleted(workspace_id, id)])
            .unwrap_or_default(),
        ToolName::TemplatedenGorevOlustur | ToolName::GorevIntelligentCreate => created(),
        ToolName::ProjeOlustur => match extract_entity_id(text) {
            Some(id) => vec![Event::project_created(workspace_id, &id, args.to_value())],
            None => sync(),
        },
        ToolName::GorevHierarchy => match args.str("action") {
            Some("create_subtask") => created(),
            _ => sync(),
        },
        ToolName::GorevBulk | ToolName::GorevImport | ToolName::GorevBagimlilikEkle => sync(),
        ToolName::AktifProje => match args.str("action") {
            Some("set") | Some("clear") => sync(),
            _ => Vec::new(),
        },
        ToolName::GorevContext => match args.str("action") {
            Some("set_active") => sync(),
            _ => Vec::new(),
        },
        ToolName::GorevListele
        | ToolName::GorevDetay
        | ToolName::TemplateListele
        | ToolName::ProjeListele
        | ToolName::ProjeGorevleri
        | ToolName::GorevFilterProfile
        | ToolName::GorevFileWatch
        | ToolName::IdeManage
        | ToolName::GorevSearch
        | ToolName::OzetGoster
        | ToolName::GorevExport
        | ToolName::GorevSuggestions => Vec::new(),
    }
}

// File path associations for tasks; the workspace file watcher follows them

use crate::error::{ToolError, ToolResult};
use crate::protocol::ToolSchema;
use crate::tools::format::json_block;
use crate::tools::registry::{
    json_schema_enum, json_schema_object, json_schema_string, Tool, ToolContext, ToolName,
};
use crate::tools::Args;
use gorev_core::Msg;
use serde_json::json;
use std::fmt::Write;

pub struct GorevFileWatch;

#[async_trait::async_trait]
impl Tool for GorevFileWatch {
    fn name(&self) -> ToolName {
        ToolName::GorevFileWatch
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Görevlerle dosya yollarını ilişkilendirir.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "action": json_schema_enum("İşlem", &["add", "remove", "list", "stats"]),
                    "task_id": json_schema_string("Görev ID"),
                    "file_path": json_schema_string("add/remove: dosya yolu")
                }),
                vec!["action"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let ws = ctx.workspace()?;
        let service = &ws.service;
        let lang = ctx.lang();
        match args.required_str("action")? {
            "add" => {
                let watch = service.add_watch(
                    args.required_str("task_id")?,
                    args.required_str("file_path")?,
                )?;
                ws.sync_watches();
                Ok(format!("{}: {} -> {}", Msg::WatchAdded.text(lang), watch.path, watch.task_id))
            }
            "remove" => {
                let path = args.required_str("file_path")?;
                service.remove_watch(args.required_str("task_id")?, path)?;
                ws.sync_watches();
                Ok(format!("{}: {}", Msg::WatchRemoved.text(lang), path))
            }
            "list" => {
                let watches = service.list_watches(args.str("task_id"))?;
                if watches.is_empty() {
                    return Ok("İzlenen dosya yok.".to_string());
                }
                let mut out = String::new();
                for w in &watches {
                    let _ = writeln!(out, "- {} (görev {})", w.path, w.task_id);
                }
                Ok(out)
            }
            "stats" => Ok(json_block(&service.watch_stats()?)),
            other => Err(ToolError::invalid(format!(
                "invalid action '{}' (expected add, remove, list or stats)",
                other
            ))),
        }
    }
}

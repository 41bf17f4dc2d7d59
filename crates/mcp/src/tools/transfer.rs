// Export and import of workspace data

use crate::error::{ToolError, ToolResult};
use crate::protocol::ToolSchema;
use crate::tools::format::json_block;
use crate::tools::registry::{
    json_schema_array, json_schema_boolean, json_schema_enum, json_schema_object,
    json_schema_string, Tool, ToolContext, ToolName,
};
use crate::tools::Args;
use anyhow::Context;
use gorev_core::service::{ConflictPolicy, ExportBundle, ExportOptions};
use gorev_core::Msg;
use serde_json::{json, Value};
use std::path::Path;

pub struct GorevExport;

#[async_trait::async_trait]
impl Tool for GorevExport {
    fn name(&self) -> ToolName {
        ToolName::GorevExport
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Projeleri, görevleri ve bağımlılıkları JSON olarak dışa aktarır.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "output_path": json_schema_string("Verilirse JSON bu dosyaya yazılır"),
                    "include_completed": json_schema_boolean("Tamamlanan görevleri dahil et (varsayılan true)"),
                    "project_ids": json_schema_array(json_schema_string("Proje ID"), "Yalnızca bu projeler")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let options = ExportOptions {
            include_completed: args.bool("include_completed").unwrap_or(true),
            project_ids: args.string_list("project_ids"),
        };
        let bundle = ctx.service()?.export(&options)?;

        let Some(path) = args.str("output_path") else {
            return Ok(json_block(&bundle));
        };
        let json = serde_json::to_string_pretty(&bundle).context("Failed to serialize export")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path))?;
        Ok(format!(
            "📦 {} proje, {} görev, {} bağımlılık -> {}",
            bundle.projects.len(),
            bundle.tasks.len(),
            bundle.dependencies.len(),
            path
        ))
    }
}

pub struct GorevImport;

impl GorevImport {
    async fn bundle(args: &Args) -> ToolResult<ExportBundle> {
        let value = match (args.get("data"), args.str("file_path")) {
            (Some(Value::String(text)), _) => {
                serde_json::from_str(text).map_err(|e| ToolError::invalid(format!("invalid data: {}", e)))?
            }
            (Some(data), _) => data.clone(),
            (None, Some(path)) => {
                let text = tokio::fs::read_to_string(Path::new(path))
                    .await
                    .with_context(|| format!("Failed to read {}", path))?;
                serde_json::from_str(&text)
                    .map_err(|e| ToolError::invalid(format!("invalid JSON in {}: {}", path, e)))?
            }
            (None, None) => return Err(ToolError::missing("data")),
        };
        serde_json::from_value(value).map_err(|e| ToolError::invalid(format!("invalid export bundle: {}", e)))
    }
}

#[async_trait::async_trait]
impl Tool for GorevImport {
    fn name(&self) -> ToolName {
        ToolName::GorevImport
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "gorev_export çıktısını içe aktarır.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "data": json_schema_string("Dışa aktarılmış JSON"),
                    "file_path": json_schema_string("data yerine okunacak dosya"),
                    "conflict_resolution": json_schema_enum("Var olan kayıtlar", &["skip", "overwrite"]),
                    "dry_run": json_schema_boolean("Hiçbir şey yazmadan raporla")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let service = ctx.service()?;
        let bundle = Self::bundle(args).await?;
        let policy = args
            .parse::<ConflictPolicy>("conflict_resolution")?
            .unwrap_or_default();
        let report = service.import(&bundle, policy, args.flag("dry_run"))?;
        Ok(format!("{}\n{}", Msg::ImportCompleted.text(ctx.lang()), json_block(&report)))
    }
}

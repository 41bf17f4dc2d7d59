// Bulk operations over many task ids

use crate::error::{ToolError, ToolResult};
use crate::protocol::ToolSchema;
use crate::tools::registry::{
    json_schema_array, json_schema_enum, json_schema_object, json_schema_string, Tool,
    ToolContext, ToolName,
};
use crate::tools::tasks::{task_update_from, STATUSES};
use crate::tools::Args;
use gorev_core::service::{BulkReport, TagMode};
use gorev_core::{Lang, Msg, TaskStatus};
use serde_json::json;
use std::fmt::Write;

pub struct GorevBulk;

#[async_trait::async_trait]
impl Tool for GorevBulk {
    fn name(&self) -> ToolName {
        ToolName::GorevBulk
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Birden fazla görevde toplu durum değişikliği, etiketleme veya güncelleme yapar.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "operation": json_schema_enum("İşlem", &["transition", "tag", "update"]),
                    "ids": json_schema_array(json_schema_string("Görev ID"), "Görev ID listesi"),
                    "durum": json_schema_enum("transition: yeni durum", STATUSES),
                    "tags": json_schema_array(json_schema_string("Etiket"), "tag: etiketler"),
                    "tag_operation": json_schema_enum("tag: etiket işlemi", &["add", "remove", "replace"]),
                    "updates": {
                        "type": "object",
                        "description": "update: baslik, aciklama, durum, oncelik, proje_id, son_tarih, etiketler"
                    }
                }),
                vec!["operation", "ids"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let service = ctx.service()?;
        let ids = args.string_list("ids");
        if ids.is_empty() {
            return Err(ToolError::missing("ids"));
        }

        let report = match args.required_str("operation")? {
            "transition" => {
                let status = args
                    .parse::<TaskStatus>("durum")?
                    .ok_or_else(|| ToolError::missing("durum"))?;
                service.bulk_transition(&ids, status)
            }
            "tag" => {
                let tags = args.string_list("tags");
                if tags.is_empty() {
                    return Err(ToolError::missing("tags"));
                }
                let mode = args.parse::<TagMode>("tag_operation")?.unwrap_or(TagMode::Add);
                service.bulk_tag(&ids, &tags, mode)
            }
            "update" => {
                let updates = args
                    .get("updates")
                    .cloned()
                    .ok_or_else(|| ToolError::missing("updates"))?;
                let update = task_update_from(&Args::from_value(updates)?)?;
                if update.is_empty() {
                    return Err(ToolError::invalid("updates contains no editable field"));
                }
                service.bulk_update(&ids, &update)
            }
            other => {
                return Err(ToolError::invalid(format!(
                    "invalid operation '{}' (expected transition, tag or update)",
                    other
                )))
            }
        };
        Ok(render_report(ctx.lang(), &report))
    }
}

fn render_report(lang: Lang, report: &BulkReport) -> String {
    let mut out = format!(
        "{}: {}/{}\n",
        Msg::BulkCompleted.text(lang),
        report.succeeded.len(),
        report.total()
    );
    for id in &report.succeeded {
        let _ = writeln!(out, "✅ ID: {}", id);
    }
    for failure in &report.failed {
        let _ = writeln!(out, "❌ {}: {}", failure.id, failure.error);
    }
    out
}

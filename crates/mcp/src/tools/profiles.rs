// Saved filter profiles

use crate::error::{ToolError, ToolResult};
use crate::protocol::ToolSchema;
use crate::tools::format::task_list;
use crate::tools::registry::{
    json_schema_enum, json_schema_object, json_schema_string, Tool, ToolContext, ToolName,
};
use crate::tools::Args;
use gorev_core::{Msg, TaskFilter};
use serde_json::json;
use std::fmt::Write;

pub struct GorevFilterProfile;

#[async_trait::async_trait]
impl Tool for GorevFilterProfile {
    fn name(&self) -> ToolName {
        ToolName::GorevFilterProfile
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Görev filtrelerini isimli profil olarak kaydeder, çalıştırır, listeler veya siler.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "action": json_schema_enum("İşlem", &["save", "load", "list", "delete"]),
                    "name": json_schema_string("Profil adı"),
                    "description": json_schema_string("save: açıklama"),
                    "filters": {
                        "type": "object",
                        "description": "save: durum, oncelik, proje_id, etiket, tum_projeler, sirala, filtre, limit, offset"
                    }
                }),
                vec!["action"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let service = ctx.service()?;
        let lang = ctx.lang();
        match args.required_str("action")? {
            "save" => {
                let filters = args.object::<TaskFilter>("filters")?.unwrap_or_default();
                let profile = service.save_filter_profile(
                    args.required_str("name")?,
                    args.raw_str("description").unwrap_or_default(),
                    filters,
                )?;
                Ok(format!("{}: {}", Msg::ProfileSaved.text(lang), profile.name))
            }
            "load" => {
                let (profile, tasks) = service.load_filter_profile(args.required_str("name")?)?;
                Ok(format!(
                    "🔖 {} ({}x)\n\n{}",
                    profile.name,
                    profile.use_count,
                    task_list(lang, Msg::Tasks, &tasks)
                ))
            }
            "list" => {
                let profiles = service.list_filter_profiles()?;
                if profiles.is_empty() {
                    return Ok("Kayıtlı filtre profili yok.".to_string());
                }
                let mut out = String::new();
                for p in &profiles {
                    let _ = write!(out, "- **{}** ({}x)", p.name, p.use_count);
                    if !p.description.is_empty() {
                        let _ = write!(out, ": {}", p.description);
                    }
                    out.push('\n');
                }
                Ok(out)
            }
            "delete" => {
                let name = args.required_str("name")?;
                service.delete_filter_profile(name)?;
                Ok(format!("{}: {}", Msg::ProfileDeleted.text(lang), name))
            }
            other => Err(ToolError::invalid(format!(
                "invalid action '{}' (expected save, load, list or delete)",
                other
            ))),
        }
    }
}

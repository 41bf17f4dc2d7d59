// Project tools

use crate::error::{ToolError, ToolResult};
use crate::protocol::ToolSchema;
use crate::tools::format::task_list;
use crate::tools::registry::{
    json_schema_enum, json_schema_number, json_schema_object, json_schema_string, Tool,
    ToolContext, ToolName,
};
use crate::tools::Args;
use gorev_core::Msg;
use serde_json::json;
use std::fmt::Write;

pub struct ProjeListele;

#[async_trait::async_trait]
impl Tool for ProjeListele {
    fn name(&self) -> ToolName {
        ToolName::ProjeListele
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Tüm projeleri görev sayılarıyla listeler.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, _args: &Args) -> ToolResult<String> {
        let lang = ctx.lang();
        let projects = ctx.service()?.list_projects()?;
        if projects.is_empty() {
            return Ok(Msg::NoProjects.text(lang).to_string());
        }
        let mut out = format!("## {} ({})\n\n", Msg::Projects.text(lang), projects.len());
        for overview in &projects {
            let p = &overview.project;
            let marker = if overview.is_active { " ⭐" } else { "" };
            let _ = writeln!(
                out,
                "- **{}**{} (ID: {}) - {} görev",
                p.name, marker, p.id, overview.task_count
            );
            if !p.description.is_empty() {
                let _ = writeln!(out, "  {}", p.description);
            }
        }
        Ok(out)
    }
}

pub struct ProjeOlustur;

#[async_trait::async_trait]
impl Tool for ProjeOlustur {
    fn name(&self) -> ToolName {
        ToolName::ProjeOlustur
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Yeni proje oluşturur.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "isim": json_schema_string("Proje adı"),
                    "tanim": json_schema_string("Proje açıklaması")
                }),
                vec!["isim"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let name = args.required_str("isim")?;
        let description = args.raw_str("tanim").unwrap_or_default();
        let project = ctx.service()?.create_project(name, description)?;
        Ok(format!(
            "{}: {}\nID: {}",
            Msg::ProjectCreated.text(ctx.lang()),
            project.name,
            project.id
        ))
    }
}

pub struct ProjeGorevleri;

#[async_trait::async_trait]
impl Tool for ProjeGorevleri {
    fn name(&self) -> ToolName {
        ToolName::ProjeGorevleri
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Bir projenin görevlerini listeler.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "proje_id": json_schema_string("Proje ID"),
                    "limit": json_schema_number("En fazla kaç görev"),
                    "offset": json_schema_number("Atlanacak görev sayısı")
                }),
                vec!["proje_id"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let service = ctx.service()?;
        let project_id = args.required_str("proje_id")?;
        let project = service.get_project(project_id)?;
        let tasks = service.project_tasks(
            project_id,
            args.usize("limit")?,
            args.usize("offset")?.unwrap_or(0),
        )?;
        Ok(format!(
            "# {}\n\n{}",
            project.name,
            task_list(ctx.lang(), Msg::Tasks, &tasks)
        ))
    }
}

pub struct AktifProje;

#[async_trait::async_trait]
impl Tool for AktifProje {
    fn name(&self) -> ToolName {
        ToolName::AktifProje
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Aktif projeyi ayarlar, gösterir veya kaldırır.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "action": json_schema_enum("İşlem", &["set", "get", "clear"]),
                    "proje_id": json_schema_string("set için proje ID")
                }),
                vec!["action"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let service = ctx.service()?;
        let lang = ctx.lang();
        match args.required_str("action")? {
            "set" => {
                let project = service.set_active_project(args.required_str("proje_id")?)?;
                Ok(format!(
                    "{}: {} (ID: {})",
                    Msg::ActiveProjectSet.text(lang),
                    project.name,
                    project.id
                ))
            }
            "get" => Ok(match service.active_project()? {
                Some(p) => format!("⭐ {} (ID: {})", p.name, p.id),
                None => Msg::NoActiveProject.text(lang).to_string(),
            }),
            "clear" => {
                service.clear_active_project()?;
                Ok(Msg::ActiveProjectCleared.text(lang).to_string())
            }
            other => Err(ToolError::invalid(format!(
                "invalid action '{}' (expected set, get or clear)",
                other
            ))),
        }
    }
}

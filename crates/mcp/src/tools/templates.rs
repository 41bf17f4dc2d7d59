// Template tools

use crate::error::ToolResult;
use crate::protocol::ToolSchema;
use crate::tools::format::created;
use crate::tools::registry::{json_schema_object, json_schema_string, Tool, ToolContext, ToolName};
use crate::tools::Args;
use gorev_core::Msg;
use serde_json::json;
use std::fmt::Write;

pub struct TemplateListele;

#[async_trait::async_trait]
impl Tool for TemplateListele {
    fn name(&self) -> ToolName {
        ToolName::TemplateListele
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Kullanılabilir görev template'lerini ve alanlarını listeler.".to_string(),
            input_schema: json_schema_object(
                json!({ "kategori": json_schema_string("Kategoriye göre filtrele (Teknik, Özellik, Araştırma...)") }),
                vec![],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let lang = ctx.lang();
        let templates = ctx.service()?.list_templates(args.str("kategori"))?;
        if templates.is_empty() {
            return Ok(Msg::NoTemplates.text(lang).to_string());
        }

        let mut out = format!("## {}\n", Msg::Templates.text(lang));
        let mut category = "";
        for template in &templates {
            if template.category != category {
                category = &template.category;
                let _ = write!(out, "\n### {}\n", category);
            }
            let _ = write!(out, "\n**{}**", template.name);
            if let Some(alias) = &template.alias {
                let _ = write!(out, " (`{}`)", alias);
            }
            let _ = write!(out, "\n- ID: `{}`\n", template.id);
            if !template.description.is_empty() {
                let _ = writeln!(out, "- {}", template.description);
            }
            for field in &template.fields {
                let _ = write!(out, "  - `{}`", field.name);
                if field.required {
                    out.push_str(" *");
                }
                if !field.options.is_empty() {
                    let _ = write!(out, " [{}]", field.options.join("|"));
                }
                if let Some(default) = &field.default {
                    let _ = write!(out, " = {}", default);
                }
                out.push('\n');
            }
        }
        Ok(out)
    }
}

pub struct TemplatedenGorevOlustur;

#[async_trait::async_trait]
impl Tool for TemplatedenGorevOlustur {
    fn name(&self) -> ToolName {
        ToolName::TemplatedenGorevOlustur
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Bir template'ten görev oluşturur. Zorunlu alanlar 'degerler' içinde verilmelidir.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "template_id": json_schema_string("Template ID veya alias (bug, feature, research, refactor)"),
                    "degerler": {
                        "type": "object",
                        "description": "Template alanlarının değerleri",
                        "additionalProperties": { "type": "string" }
                    }
                }),
                vec!["template_id", "degerler"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let template_id = args.required_str("template_id")?;
        let values = args.string_map("degerler")?;
        let (template, task) = ctx.service()?.create_from_template(template_id, &values)?;
        Ok(format!(
            "{}\n{}: {}",
            created(ctx.lang(), Msg::TemplateTaskCreated, &task),
            template.name,
            template.id
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{run, workspace};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_templates() {
        let (_dir, _registry, ws) = workspace();
        let out = run(&TemplateListele, &ws, json!({})).await.unwrap();
        assert!(out.contains("`bug`"));
        assert!(out.contains("`environment` * [development|staging|production]"));
    }

    #[tokio::test]
    async fn test_create_from_bug_template() {
        let (_dir, _registry, ws) = workspace();
        let out = run(
            &TemplatedenGorevOlustur,
            &ws,
            json!({
                "template_id": "bug",
                "degerler": {
                    "title": "Login broken",
                    "description": "500 on submit",
                    "module": "auth",
                    "environment": "production",
                    "steps": "open /login",
                    "expected": "logged in",
                    "actual": "error page"
                }
            }),
        )
        .await
        .unwrap();

        let task = &ws.service.list_tasks(&Default::default()).unwrap()[0];
        assert!(out.contains(&format!("ID: {}", task.id)));
        assert_eq!(task.title, "🐛 [auth] Login broken");
        assert_eq!(task.tags, vec!["bug"]);
    }

    #[tokio::test]
    async fn test_missing_fields_fail() {
        let (_dir, _registry, ws) = workspace();
        let err = run(
            &TemplatedenGorevOlustur,
            &ws,
            json!({"template_id": "bug", "degerler": {"title": "x"}}),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("missing required template fields"));
    }
}

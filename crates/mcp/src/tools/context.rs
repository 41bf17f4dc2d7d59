// AI-assistant context: active task, recent work, suggestions and assisted creation

use crate::error::{ToolError, ToolResult};
use crate::protocol::ToolSchema;
use crate::tools::format::{created, task_line};
use crate::tools::registry::{
    json_schema_boolean, json_schema_enum, json_schema_number, json_schema_object,
    json_schema_string, Tool, ToolContext, ToolName,
};
use crate::tools::Args;
use gorev_core::i18n::priority_emoji;
use gorev_core::service::IntelligentRequest;
use gorev_core::{Lang, Msg, Task};
use serde_json::json;
use std::fmt::Write;

const DEFAULT_RECENT: usize = 5;
const DEFAULT_SUGGESTIONS: usize = 10;

fn section(out: &mut String, lang: Lang, heading: &str, tasks: &[Task]) {
    if tasks.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n## {} ({})\n", heading, tasks.len());
    for task in tasks {
        let _ = writeln!(out, "{}", task_line(lang, task));
    }
}

pub struct GorevContext;

#[async_trait::async_trait]
impl Tool for GorevContext {
    fn name(&self) -> ToolName {
        ToolName::GorevContext
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Aktif görevi yönetir, son görevleri ve çalışma bağlamı özetini gösterir.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "action": json_schema_enum("İşlem", &["set_active", "get_active", "recent", "summary"]),
                    "task_id": json_schema_string("set_active: görev ID"),
                    "limit": json_schema_number("recent: en fazla kaç görev")
                }),
                vec!["action"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let service = ctx.service()?;
        let lang = ctx.lang();
        match args.required_str("action")? {
            "set_active" => {
                let task = service.set_active_task(args.required_str("task_id")?)?;
                Ok(format!("{}: {}\nID: {}", Msg::ActiveTaskSet.text(lang), task.title, task.id))
            }
            "get_active" => Ok(match service.active_task()? {
                Some(task) => task_line(lang, &task),
                None => Msg::NoActiveTask.text(lang).to_string(),
            }),
            "recent" => {
                let limit = args.usize("limit")?.unwrap_or(DEFAULT_RECENT);
                let tasks = service.recent_tasks(limit)?;
                if tasks.is_empty() {
                    return Ok(Msg::NoTasks.text(lang).to_string());
                }
                let mut out = String::new();
                section(&mut out, lang, Msg::RecentTasks.text(lang), &tasks);
                Ok(out.trim_start().to_string())
            }
            "summary" => {
                let summary = service.context_summary()?;
                let mut out = String::from("# AI Context\n");
                match &summary.active_task {
                    Some(task) => {
                        let _ = writeln!(out, "\n⭐ {}", task_line(lang, task));
                    }
                    None => {
                        let _ = writeln!(out, "\n{}", Msg::NoActiveTask.text(lang));
                    }
                }
                section(&mut out, lang, "Devam Eden", &summary.in_progress);
                section(&mut out, lang, "Yüksek Öncelikli Bekleyen", &summary.high_priority_pending);
                section(&mut out, lang, "Bloke", &summary.blocked);
                section(&mut out, lang, Msg::RecentTasks.text(lang), &summary.recent);
                Ok(out)
            }
            other => Err(ToolError::invalid(format!(
                "invalid action '{}' (expected set_active, get_active, recent or summary)",
                other
            ))),
        }
    }
}

pub struct GorevSuggestions;

#[async_trait::async_trait]
impl Tool for GorevSuggestions {
    fn name(&self) -> ToolName {
        ToolName::GorevSuggestions
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Gecikmiş, yaklaşan, bloke veya başlanmaya hazır görevler için öneriler üretir.".to_string(),
            input_schema: json_schema_object(
                json!({ "limit": json_schema_number("En fazla kaç öneri") }),
                vec![],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let lang = ctx.lang();
        let limit = args.usize("limit")?.unwrap_or(DEFAULT_SUGGESTIONS);
        let suggestions = ctx.service()?.suggestions(limit)?;
        if suggestions.is_empty() {
            return Ok(Msg::NoSuggestions.text(lang).to_string());
        }
        let mut out = format!("## {} ({})\n\n", Msg::Suggestions.text(lang), suggestions.len());
        for s in &suggestions {
            let _ = write!(out, "- {} {}", priority_emoji(s.priority), s.message);
            if let Some(id) = &s.task_id {
                let _ = write!(out, " (ID: {})", id);
            }
            out.push('\n');
        }
        Ok(out)
    }
}

pub struct GorevIntelligentCreate;

#[async_trait::async_trait]
impl Tool for GorevIntelligentCreate {
    fn name(&self) -> ToolName {
        ToolName::GorevIntelligentCreate
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Başlık ve açıklamadan görev oluşturur; isteğe bağlı olarak alt görevlere böler, öncelik ve süre tahmini yapar.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "title": json_schema_string("Görev başlığı"),
                    "description": json_schema_string("Açıklama; madde işaretli satırlar alt görev olur"),
                    "auto_split": json_schema_boolean("Açıklamadaki maddeleri alt görevlere böl"),
                    "estimate_time": json_schema_boolean("Süre tahmini yap"),
                    "smart_priority": json_schema_boolean("Önceliği metinden çıkar"),
                    "suggest_template": json_schema_boolean("Uygun şablonu öner"),
                    "project_id": json_schema_string("Proje ID")
                }),
                vec!["title"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let lang = ctx.lang();
        let request: IntelligentRequest = args.deserialize()?;
        let outcome = ctx.service()?.intelligent_create(request)?;

        let mut out = created(lang, Msg::TaskCreated, &outcome.task);
        if let Some(reason) = &outcome.priority_reason {
            let _ = write!(out, "\n{}: {} ({})", Msg::Priority.text(lang), outcome.task.priority, reason);
        }
        if let Some(hours) = outcome.estimated_hours {
            let _ = write!(out, "\n⏱️ ~{:.1}h", hours);
        }
        if let Some(template) = &outcome.suggested_template {
            let _ = write!(out, "\n📋 template: {}", template);
        }
        if !outcome.subtasks.is_empty() {
            let _ = write!(out, "\n\n## {}\n", Msg::Subtasks.text(lang));
            for sub in &outcome.subtasks {
                let _ = write!(out, "\n{}", task_line(lang, sub));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{run, workspace};
    use gorev_core::service::NewTask;
    use gorev_core::TaskStatus;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_active_starts_task() {
        let (_dir, _registry, ws) = workspace();
        let task = ws.service.create_task(NewTask { title: "Focus".into(), ..Default::default() }).unwrap();

        let out = run(&GorevContext, &ws, json!({"action": "set_active", "task_id": task.id}))
            .await
            .unwrap();
        assert!(out.contains(&format!("ID: {}", task.id)));
        assert_eq!(ws.service.get_task(&task.id).unwrap().status, TaskStatus::InProgress);

        let active = run(&GorevContext, &ws, json!({"action": "get_active"})).await.unwrap();
        assert!(active.contains("Focus"));

        let recent = run(&GorevContext, &ws, json!({"action": "recent", "limit": 3})).await.unwrap();
        assert!(recent.contains("Focus"));

        let summary = run(&GorevContext, &ws, json!({"action": "summary"})).await.unwrap();
        assert!(summary.contains("⭐"));
    }

    #[tokio::test]
    async fn test_intelligent_create_reports_id_and_subtasks() {
        let (_dir, _registry, ws) = workspace();
        let out = run(
            &GorevIntelligentCreate,
            &ws,
            json!({
                "title": "Kritik login hatası",
                "description": "- reproduce\n- fix",
                "auto_split": true,
                "smart_priority": true
            }),
        )
        .await
        .unwrap();

        let parent = ws
            .service
            .list_tasks(&gorev_core::TaskFilter { all_projects: true, ..Default::default() })
            .unwrap()
            .into_iter()
            .find(|t| t.parent_id.is_none())
            .unwrap();
        assert!(out.contains(&format!("ID: {}", parent.id)));
        assert_eq!(parent.priority, gorev_core::Priority::High);
        assert_eq!(ws.service.children(&parent.id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_suggestions_on_empty_workspace() {
        let (_dir, _registry, ws) = workspace();
        let out = run(&GorevSuggestions, &ws, json!({})).await.unwrap();
        assert!(!out.is_empty());
    }
}

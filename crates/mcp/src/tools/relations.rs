// Dependency and parent/child tools

use crate::error::{ToolError, ToolResult};
use crate::protocol::ToolSchema;
use crate::tools::format::{created, task_line};
use crate::tools::registry::{
    json_schema_array, json_schema_enum, json_schema_object, json_schema_string, Tool,
    ToolContext, ToolName,
};
use crate::tools::tasks::PRIORITIES;
use crate::tools::Args;
use gorev_core::service::{parse_due_date, NewTask};
use gorev_core::{Msg, Priority};
use serde_json::json;
use std::fmt::Write;

pub struct GorevBagimlilikEkle;

#[async_trait::async_trait]
impl Tool for GorevBagimlilikEkle {
    fn name(&self) -> ToolName {
        ToolName::GorevBagimlilikEkle
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "İki görev arasında bağımlılık ekler: hedef görev, kaynak görev tamamlanana kadar bekler.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "kaynak_id": json_schema_string("Önce tamamlanması gereken görev"),
                    "hedef_id": json_schema_string("Bekleyen görev"),
                    "baglanti_tipi": json_schema_string("Bağlantı tipi, varsayılan 'onceki'")
                }),
                vec!["kaynak_id", "hedef_id"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let edge = ctx.service()?.add_dependency(
            args.required_str("kaynak_id")?,
            args.required_str("hedef_id")?,
            args.str("baglanti_tipi").unwrap_or_default(),
        )?;
        Ok(format!(
            "{}: {} -> {} ({})",
            Msg::DependencyAdded.text(ctx.lang()),
            edge.source_id,
            edge.target_id,
            edge.kind
        ))
    }
}

pub struct GorevHierarchy;

#[async_trait::async_trait]
impl Tool for GorevHierarchy {
    fn name(&self) -> ToolName {
        ToolName::GorevHierarchy
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Alt görev oluşturur, üst görevi değiştirir veya görev hiyerarşisini gösterir.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "action": json_schema_enum("İşlem", &["create_subtask", "change_parent", "show"]),
                    "parent_id": json_schema_string("create_subtask: üst görev ID"),
                    "gorev_id": json_schema_string("change_parent/show: görev ID"),
                    "new_parent_id": json_schema_string("change_parent: yeni üst görev, boş ise kök seviye"),
                    "baslik": json_schema_string("create_subtask: başlık"),
                    "aciklama": json_schema_string("create_subtask: açıklama"),
                    "oncelik": json_schema_enum("create_subtask: öncelik", PRIORITIES),
                    "son_tarih": json_schema_string("create_subtask: YYYY-MM-DD"),
                    "etiketler": json_schema_array(json_schema_string("Etiket"), "create_subtask: etiketler")
                }),
                vec!["action"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let service = ctx.service()?;
        let lang = ctx.lang();
        match args.required_str("action")? {
            "create_subtask" => {
                let new = NewTask {
                    title: args.required_str("baslik")?.to_string(),
                    description: args.raw_str("aciklama").unwrap_or_default().to_string(),
                    priority: args.parse::<Priority>("oncelik")?.unwrap_or_default(),
                    due_date: args.str("son_tarih").map(parse_due_date).transpose()?,
                    tags: args.string_list("etiketler"),
                    ..Default::default()
                };
                let task = service.create_subtask(args.required_str("parent_id")?, new)?;
                Ok(created(lang, Msg::SubtaskCreated, &task))
            }
            "change_parent" => {
                let id = args.required_str("gorev_id")?;
                match args.str("new_parent_id") {
                    Some(parent) => {
                        let task = service.change_parent(id, Some(parent))?;
                        Ok(format!(
                            "{}: {}\nID: {}",
                            Msg::TaskMovedToParent.text(lang),
                            parent,
                            task.id
                        ))
                    }
                    None => {
                        let task = service.change_parent(id, None)?;
                        Ok(format!("{}\nID: {}", Msg::TaskMovedToRoot.text(lang), task.id))
                    }
                }
            }
            "show" => {
                let h = service.hierarchy(args.required_str("gorev_id")?)?;
                let mut out = format!("# {}: {}\n\n", Msg::Hierarchy.text(lang), h.task.title);
                if !h.ancestors.is_empty() {
                    let path: Vec<&str> = h.ancestors.iter().rev().map(|t| t.title.as_str()).collect();
                    let _ = writeln!(out, "📂 {} > {}\n", path.join(" > "), h.task.title);
                }
                let _ = writeln!(
                    out,
                    "- {}/{} ({:.0}%) · {} devam ediyor · {} beklemede",
                    h.completed_descendants,
                    h.total_descendants,
                    h.progress_percent,
                    h.in_progress_descendants,
                    h.pending_descendants
                );
                if !h.children.is_empty() {
                    let _ = writeln!(out, "\n## {}\n", Msg::Subtasks.text(lang));
                    for child in &h.children {
                        let _ = writeln!(out, "{}", task_line(lang, child));
                    }
                }
                Ok(out)
            }
            other => Err(ToolError::invalid(format!(
                "invalid action '{}' (expected create_subtask, change_parent or show)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{run, workspace};
    use gorev_core::service::NewTask;
    use serde_json::json;

    #[tokio::test]
    async fn test_dependency_and_cycle() {
        let (_dir, _registry, ws) = workspace();
        let a = ws.service.create_task(NewTask { title: "A".into(), ..Default::default() }).unwrap();
        let b = ws.service.create_task(NewTask { title: "B".into(), ..Default::default() }).unwrap();

        let out = run(&GorevBagimlilikEkle, &ws, json!({"kaynak_id": a.id, "hedef_id": b.id}))
            .await
            .unwrap();
        assert!(out.contains("onceki"));

        let cycle = run(&GorevBagimlilikEkle, &ws, json!({"kaynak_id": b.id, "hedef_id": a.id})).await;
        assert!(matches!(cycle, Err(ToolError::Service(_))));
    }

    #[tokio::test]
    async fn test_subtask_move_and_show() {
        let (_dir, _registry, ws) = workspace();
        let parent = ws.service.create_task(NewTask { title: "Parent".into(), ..Default::default() }).unwrap();

        let out = run(
            &GorevHierarchy,
            &ws,
            json!({"action": "create_subtask", "parent_id": parent.id, "baslik": "Child"}),
        )
        .await
        .unwrap();
        let child = &ws.service.children(&parent.id).unwrap()[0];
        assert!(out.contains(&format!("ID: {}", child.id)));

        let shown = run(&GorevHierarchy, &ws, json!({"action": "show", "gorev_id": parent.id}))
            .await
            .unwrap();
        assert!(shown.contains("Child"));

        run(&GorevHierarchy, &ws, json!({"action": "change_parent", "gorev_id": child.id, "new_parent_id": ""}))
            .await
            .unwrap();
        assert!(ws.service.get_task(&child.id).unwrap().parent_id.is_none());
    }
}

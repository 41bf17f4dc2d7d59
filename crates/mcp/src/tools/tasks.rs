// Task tools: listing, detail, status changes, edits, deletion and the summary report

use crate::error::{ToolError, ToolResult};
use crate::protocol::ToolSchema;
use crate::tools::format::{task_line, task_list};
use crate::tools::registry::{
    json_schema_array, json_schema_boolean, json_schema_enum, json_schema_number,
    json_schema_object, json_schema_string, Tool, ToolContext, ToolName,
};
use crate::tools::Args;
use gorev_core::i18n::{priority_emoji, status_emoji, status_label};
use gorev_core::service::{parse_due_date, TaskUpdate};
use gorev_core::{Msg, Priority, TaskFilter, TaskSort, TaskStatus};
use serde_json::json;
use std::fmt::Write;

pub(crate) const STATUSES: &[&str] = &["beklemede", "devam_ediyor", "tamamlandi", "iptal"];
pub(crate) const PRIORITIES: &[&str] = &["dusuk", "orta", "yuksek"];

/// Editable fields shared by `gorev_duzenle` and bulk updates.
pub(crate) fn task_update_from(args: &Args) -> ToolResult<TaskUpdate> {
    Ok(TaskUpdate {
        title: args.str("baslik").map(str::to_string),
        description: args.raw_str("aciklama").map(str::to_string),
        status: args.parse::<TaskStatus>("durum")?,
        priority: args.parse::<Priority>("oncelik")?,
        project_id: args.str("proje_id").map(str::to_string),
        due_date: args.str("son_tarih").map(parse_due_date).transpose()?,
        tags: args.get("etiketler").map(|_| args.string_list("etiketler")),
    })
}

/// Listing filters shared by `gorev_listele` and filter profiles.
pub(crate) fn task_filter_from(args: &Args) -> ToolResult<TaskFilter> {
    Ok(TaskFilter {
        status: args.parse::<TaskStatus>("durum")?,
        priority: args.parse::<Priority>("oncelik")?,
        project_id: args.str("proje_id").map(str::to_string),
        tag: args.str("etiket").map(str::to_string),
        all_projects: args.flag("tum_projeler"),
        sort: args.parse::<TaskSort>("sirala")?,
        due_filter: args.str("filtre").map(str::to_string),
        limit: args.usize("limit")?,
        offset: args.usize("offset")?.unwrap_or(0),
    })
}

pub struct GorevListele;

#[async_trait::async_trait]
impl Tool for GorevListele {
    fn name(&self) -> ToolName {
        ToolName::GorevListele
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Görevleri listeler. Varsayılan olarak aktif projenin görevleri gösterilir.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "durum": json_schema_enum("Duruma göre filtrele", STATUSES),
                    "oncelik": json_schema_enum("Önceliğe göre filtrele", PRIORITIES),
                    "sirala": json_schema_enum("Sıralama", &["olusturma_artan", "olusturma_azalan", "son_tarih_artan", "son_tarih_azalan", "oncelik"]),
                    "filtre": json_schema_enum("acil: 7 gün içinde, gecmis: süresi geçmiş", &["acil", "gecmis"]),
                    "etiket": json_schema_string("Etikete göre filtrele"),
                    "proje_id": json_schema_string("Belirli bir projenin görevleri"),
                    "tum_projeler": json_schema_boolean("Tüm projelerin görevlerini göster"),
                    "limit": json_schema_number("En fazla kaç görev"),
                    "offset": json_schema_number("Atlanacak görev sayısı")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let filter = task_filter_from(args)?;
        let tasks = ctx.service()?.list_tasks(&filter)?;
        Ok(task_list(ctx.lang(), Msg::Tasks, &tasks))
    }
}

pub struct GorevDetay;

#[async_trait::async_trait]
impl Tool for GorevDetay {
    fn name(&self) -> ToolName {
        ToolName::GorevDetay
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Bir görevin tüm detaylarını markdown olarak gösterir.".to_string(),
            input_schema: json_schema_object(
                json!({ "id": json_schema_string("Görev ID") }),
                vec!["id"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let service = ctx.service()?;
        let lang = ctx.lang();
        let detail = service.task_detail(args.required_str("id")?)?;
        let task = &detail.task;

        let mut out = format!("# {}\n\n", task.title);
        let _ = writeln!(out, "- ID: {}", task.id);
        let _ = writeln!(
            out,
            "- {}: {} {}",
            Msg::Status.text(lang),
            status_emoji(task.status),
            status_label(lang, task.status)
        );
        let _ = writeln!(
            out,
            "- {}: {} {}",
            Msg::Priority.text(lang),
            priority_emoji(task.priority),
            task.priority
        );
        if let Some(project_id) = &task.project_id {
            let name = service
                .get_project(project_id)
                .map(|p| p.name)
                .unwrap_or_else(|_| project_id.clone());
            let _ = writeln!(out, "- {}: {}", Msg::Project.text(lang), name);
        }
        if let Some(parent) = &task.parent_id {
            let _ = writeln!(out, "- parent_id: {}", parent);
        }
        if let Some(due) = task.due_date {
            let _ = writeln!(out, "- 📅 {}", due);
        }
        if !task.tags.is_empty() {
            let _ = writeln!(out, "- 🏷️ {}", task.tags.join(", "));
        }
        if !task.description.is_empty() {
            let _ = write!(out, "\n{}\n", task.description);
        }

        if !detail.subtasks.is_empty() {
            let _ = write!(out, "\n## {}\n\n", Msg::Subtasks.text(lang));
            for sub in &detail.subtasks {
                let _ = writeln!(out, "{}", task_line(lang, sub));
            }
        }
        if !detail.dependencies.is_empty() {
            let _ = write!(
                out,
                "\n## {} ({} open)\n\n",
                Msg::Dependencies.text(lang),
                detail.open_dependency_count
            );
            for dep in &detail.dependencies {
                let _ = writeln!(out, "- {} ({})", dep.source_id, dep.kind);
            }
        }
        if detail.dependent_count > 0 {
            let _ = write!(out, "\n⬅️ {} task(s) depend on this one\n", detail.dependent_count);
        }
        Ok(out)
    }
}

pub struct GorevGuncelle;

#[async_trait::async_trait]
impl Tool for GorevGuncelle {
    fn name(&self) -> ToolName {
        ToolName::GorevGuncelle
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Görevin durumunu günceller.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "id": json_schema_string("Görev ID"),
                    "durum": json_schema_enum("Yeni durum", STATUSES)
                }),
                vec!["id", "durum"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let id = args.required_str("id")?;
        let status = args
            .parse::<TaskStatus>("durum")?
            .ok_or_else(|| ToolError::missing("durum"))?;
        let task = ctx.service()?.update_task(id, TaskUpdate::status(status))?;
        Ok(format!(
            "{}: {} → {}",
            Msg::TaskUpdated.text(ctx.lang()),
            task.title,
            status_label(ctx.lang(), task.status)
        ))
    }
}

pub struct GorevDuzenle;

#[async_trait::async_trait]
impl Tool for GorevDuzenle {
    fn name(&self) -> ToolName {
        ToolName::GorevDuzenle
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Görevin başlık, açıklama, öncelik, proje veya son tarih bilgisini düzenler.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "id": json_schema_string("Görev ID"),
                    "baslik": json_schema_string("Yeni başlık"),
                    "aciklama": json_schema_string("Yeni açıklama"),
                    "oncelik": json_schema_enum("Yeni öncelik", PRIORITIES),
                    "proje_id": json_schema_string("Yeni proje ID"),
                    "son_tarih": json_schema_string("Son tarih (YYYY-AA-GG)"),
                    "etiketler": json_schema_array(json!({"type": "string"}), "Etiketler")
                }),
                vec!["id"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let id = args.required_str("id")?;
        let mut update = task_update_from(args)?;
        // status changes go through gorev_guncelle
        update.status = None;
        if update.is_empty() {
            return Err(ToolError::invalid(
                "at least one of baslik, aciklama, oncelik, proje_id, son_tarih, etiketler is required",
            ));
        }
        let task = ctx.service()?.update_task(id, update)?;
        Ok(format!("{}: {}", Msg::TaskEdited.text(ctx.lang()), task.title))
    }
}

pub struct GorevSil;

#[async_trait::async_trait]
impl Tool for GorevSil {
    fn name(&self) -> ToolName {
        ToolName::GorevSil
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Görevi kalıcı olarak siler. Alt görevi olan görevler silinemez.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "id": json_schema_string("Görev ID"),
                    "onay": json_schema_boolean("Silme onayı (true olmalı)")
                }),
                vec!["id", "onay"],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let id = args.required_str("id")?;
        if !args.flag("onay") {
            return Err(ToolError::invalid(Msg::ConfirmationRequired.text(ctx.lang())));
        }
        let ws = ctx.workspace()?;
        let task = ws.service.delete_task(id)?;
        ws.sync_watches();
        Ok(format!("{}: {}", Msg::TaskDeleted.text(ctx.lang()), task.title))
    }
}

pub struct OzetGoster;

#[async_trait::async_trait]
impl Tool for OzetGoster {
    fn name(&self) -> ToolName {
        ToolName::OzetGoster
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Proje ve görev istatistiklerini özetler.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, _args: &Args) -> ToolResult<String> {
        let lang = ctx.lang();
        let s = ctx.service()?.summary()?;
        let mut out = format!("## {}\n\n", Msg::Summary.text(lang));
        let _ = writeln!(out, "- {}: {}", Msg::Projects.text(lang), s.total_projects);
        let _ = writeln!(out, "- {}: {}", Msg::Tasks.text(lang), s.total_tasks);
        for (status, count) in [
            (TaskStatus::Pending, s.pending),
            (TaskStatus::InProgress, s.in_progress),
            (TaskStatus::Completed, s.completed),
            (TaskStatus::Cancelled, s.cancelled),
        ] {
            let _ = writeln!(
                out,
                "  - {} {}: {}",
                status_emoji(status),
                status_label(lang, status),
                count
            );
        }
        let _ = writeln!(
            out,
            "- {}: 🔥 {} / ⚡ {} / ℹ️ {}",
            Msg::Priority.text(lang),
            s.high_priority,
            s.medium_priority,
            s.low_priority
        );
        if s.overdue > 0 {
            let _ = writeln!(out, "- ⚠️ overdue: {}", s.overdue);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{run, workspace};
    use gorev_core::service::NewTask;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_and_detail() {
        let (_dir, _registry, ws) = workspace();
        let task = ws
            .service
            .create_task(NewTask {
                title: "Write docs".to_string(),
                ..Default::default()
            })
            .unwrap();

        let listed = run(&GorevListele, &ws, json!({})).await.unwrap();
        assert!(listed.contains(&task.id));

        let detail = run(&GorevDetay, &ws, json!({"id": task.id})).await.unwrap();
        assert!(detail.starts_with("# Write docs"));
        assert!(run(&GorevDetay, &ws, json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_update_and_edit() {
        let (_dir, _registry, ws) = workspace();
        let task = ws
            .service
            .create_task(NewTask {
                title: "Old".to_string(),
                ..Default::default()
            })
            .unwrap();

        run(&GorevGuncelle, &ws, json!({"id": task.id, "durum": "devam_ediyor"}))
            .await
            .unwrap();
        assert_eq!(ws.service.get_task(&task.id).unwrap().status, TaskStatus::InProgress);

        let err = run(&GorevDuzenle, &ws, json!({"id": task.id})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));

        run(&GorevDuzenle, &ws, json!({"id": task.id, "baslik": "New", "oncelik": "yuksek"}))
            .await
            .unwrap();
        let edited = ws.service.get_task(&task.id).unwrap();
        assert_eq!(edited.title, "New");
        assert_eq!(edited.priority, Priority::High);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let (_dir, _registry, ws) = workspace();
        let task = ws
            .service
            .create_task(NewTask {
                title: "Doomed".to_string(),
                ..Default::default()
            })
            .unwrap();

        assert!(run(&GorevSil, &ws, json!({"id": task.id})).await.is_err());
        run(&GorevSil, &ws, json!({"id": task.id, "onay": true}))
            .await
            .unwrap();
        assert_eq!(ws.service.task_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_summary() {
        let (_dir, _registry, ws) = workspace();
        let out = run(&OzetGoster, &ws, json!({})).await.unwrap();
        assert!(out.contains("Özet Rapor"));
    }
}

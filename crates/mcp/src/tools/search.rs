// Task search

use crate::error::ToolResult;
use crate::protocol::ToolSchema;
use crate::tools::format::task_line;
use crate::tools::registry::{
    json_schema_enum, json_schema_number, json_schema_object, json_schema_string, Tool,
    ToolContext, ToolName,
};
use crate::tools::Args;
use gorev_core::service::SearchMode;
use gorev_core::Msg;
use serde_json::json;
use std::fmt::Write;

const DEFAULT_LIMIT: usize = 20;

pub struct GorevSearch;

#[async_trait::async_trait]
impl Tool for GorevSearch {
    fn name(&self) -> ToolName {
        ToolName::GorevSearch
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Görevlerde doğal dil veya alan:değer sözdizimi ile arama yapar; history modu geçmiş aramaları listeler.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "query": json_schema_string("Arama sorgusu, ör. 'acil #backend login' veya 'durum:devam_ediyor tag:api'"),
                    "mode": json_schema_enum("Arama modu", &["nlp", "advanced", "history"]),
                    "limit": json_schema_number("En fazla kaç sonuç")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let service = ctx.service()?;
        let lang = ctx.lang();
        let mode = args.parse::<SearchMode>("mode")?.unwrap_or(SearchMode::Nlp);
        let limit = args.usize("limit")?.unwrap_or(DEFAULT_LIMIT);

        if mode == SearchMode::History {
            let history = service.search_history(limit)?;
            if history.is_empty() {
                return Ok(Msg::NoResults.text(lang).to_string());
            }
            let mut out = String::new();
            for record in &history {
                let _ = writeln!(
                    out,
                    "- `{}` ({}, {}) {}",
                    record.query,
                    record.mode,
                    record.result_count,
                    record.at.format("%Y-%m-%d %H:%M")
                );
            }
            return Ok(out);
        }

        let query = args.required_str("query")?;
        let hits = service.search_tasks(query, mode)?;
        if hits.is_empty() {
            return Ok(Msg::NoResults.text(lang).to_string());
        }
        let mut out = format!("## `{}` ({})\n\n", query, hits.len());
        for hit in hits.iter().take(limit) {
            let _ = writeln!(out, "{} · {}", task_line(lang, &hit.task), hit.score);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{run, workspace};
    use gorev_core::service::NewTask;
    use gorev_core::Priority;
    use serde_json::json;

    #[tokio::test]
    async fn test_nlp_then_history() {
        let (_dir, _registry, ws) = workspace();
        ws.service
            .create_task(NewTask {
                title: "Fix login".into(),
                priority: Priority::High,
                tags: vec!["backend".into()],
                ..Default::default()
            })
            .unwrap();
        ws.service.create_task(NewTask { title: "Write docs".into(), ..Default::default() }).unwrap();

        let out = run(&GorevSearch, &ws, json!({"query": "login #backend"})).await.unwrap();
        assert!(out.contains("Fix login"));
        assert!(!out.contains("Write docs"));

        let history = run(&GorevSearch, &ws, json!({"mode": "history"})).await.unwrap();
        assert!(history.contains("`login #backend` (nlp, 1)"));
    }

    #[tokio::test]
    async fn test_query_required_outside_history() {
        let (_dir, _registry, ws) = workspace();
        assert!(run(&GorevSearch, &ws, json!({"mode": "advanced"})).await.is_err());
        assert!(run(&GorevSearch, &ws, json!({"query": "x", "mode": "fuzzy"})).await.is_err());
    }
}

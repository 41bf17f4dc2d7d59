// Markdown rendering shared by the tools

use gorev_core::i18n::{priority_emoji, status_emoji, status_label};
use gorev_core::{Lang, Msg, Task};
use std::fmt::Write;

/// One-line summary; the full id is always present so callers can act on it.
pub fn task_line(lang: Lang, task: &Task) -> String {
    let mut line = format!(
        "- {} [{}] {} {} (ID: {})",
        status_emoji(task.status),
        status_label(lang, task.status),
        priority_emoji(task.priority),
        task.title,
        task.id
    );
    if let Some(due) = task.due_date {
        let _ = write!(line, " 📅 {}", due);
    }
    if !task.tags.is_empty() {
        let _ = write!(line, " 🏷️ {}", task.tags.join(", "));
    }
    line
}

pub fn task_list(lang: Lang, heading: Msg, tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return Msg::NoTasks.text(lang).to_string();
    }
    let mut out = format!("## {} ({})\n\n", heading.text(lang), tasks.len());
    for task in tasks {
        out.push_str(&task_line(lang, task));
        out.push('\n');
    }
    out
}

/// Confirmation text for a newly created task; the `ID:` line is machine-read.
pub fn created(lang: Lang, msg: Msg, task: &Task) -> String {
    format!("{}: {}\nID: {}", msg.text(lang), task.title, task.id)
}

/// Pretty JSON block for payloads that are meant to be parsed back.
pub fn json_block(value: &impl serde::Serialize) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(json) => format!("```json\n{}\n```", json),
        Err(e) => format!("<unserializable: {}>", e),
    }
}

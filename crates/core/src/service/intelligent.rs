use serde::{Deserialize, Serialize};

use super::{NewTask, TaskService};
use crate::error::{ServiceError, ServiceResult};
use crate::types::{Priority, Task};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntelligentRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub auto_split: bool,
    #[serde(default)]
    pub estimate_time: bool,
    #[serde(default)]
    pub smart_priority: bool,
    #[serde(default)]
    pub suggest_template: bool,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntelligentOutcome {
    pub task: Task,
    pub subtasks: Vec<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_template: Option<String>,
}

const HIGH_KEYWORDS: &[&str] = &[
    "acil", "kritik", "urgent", "critical", "asap", "hemen", "blocker", "production",
];
const LOW_KEYWORDS: &[&str] = &["belki", "ileride", "someday", "nice to have", "minor", "kozmetik"];

const TEMPLATE_KEYWORDS: &[(&str, &[&str])] = &[
    ("bug", &["bug", "hata", "crash", "fix", "düzelt", "broken"]),
    ("feature", &["feature", "özellik", "ekle", "add", "implement", "yeni"]),
    ("research", &["araştır", "research", "investigate", "incele", "analiz"]),
    ("refactor", &["refactor", "cleanup", "temizle", "yeniden düzenle", "iyileştir"]),
];

/// Pick a priority from keywords in the text.
fn infer_priority(text: &str) -> (Priority, Option<String>) {
    let lower = text.to_lowercase();
    if let Some(word) = HIGH_KEYWORDS.iter().find(|k| lower.contains(*k)) {
        return (Priority::High, Some(format!("contains '{}'", word)));
    }
    if let Some(word) = LOW_KEYWORDS.iter().find(|k| lower.contains(*k)) {
        return (Priority::Low, Some(format!("contains '{}'", word)));
    }
    (Priority::Medium, None)
}

/// Bullet or numbered lines of the description become subtasks.
fn split_items(description: &str) -> Vec<String> {
    description
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let rest = line
                .strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .or_else(|| {
                    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
                    if digits == 0 {
                        return None;
                    }
                    line[digits..]
                        .strip_prefix(". ")
                        .or_else(|| line[digits..].strip_prefix(") "))
                })?;
            let rest = rest.trim_start_matches("[ ] ").trim();
            (!rest.is_empty()).then(|| rest.to_string())
        })
        .collect()
}

/// Rough effort estimate: one hour plus half an hour per 25 words, per subtask.
fn estimate_hours(text: &str, subtasks: usize) -> f64 {
    let words = text.split_whitespace().count() as f64;
    let base = 1.0 + (words / 25.0).floor() * 0.5;
    base + subtasks as f64 * 1.5
}

fn suggest_template(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    TEMPLATE_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(alias, _)| alias.to_string())
}

impl TaskService {
    pub fn intelligent_create(&self, request: IntelligentRequest) -> ServiceResult<IntelligentOutcome> {
        if request.title.trim().is_empty() {
            return Err(ServiceError::invalid("task title is required"));
        }
        let text = format!("{}\n{}", request.title, request.description);

        let (priority, priority_reason) = if request.smart_priority {
            infer_priority(&text)
        } else {
            (Priority::default(), None)
        };
        let project_id = match request.project_id.filter(|p| !p.is_empty()) {
            Some(p) => Some(p),
            None => self.active_project_id()?,
        };

        let task = self.create_task(NewTask {
            title: request.title.trim().to_string(),
            description: request.description.clone(),
            priority,
            project_id,
            ..Default::default()
        })?;

        let mut subtasks = Vec::new();
        if request.auto_split {
            for item in split_items(&request.description) {
                subtasks.push(self.create_subtask(
                    &task.id,
                    NewTask {
                        title: item,
                        priority,
                        ..Default::default()
                    },
                )?);
            }
        }

        Ok(IntelligentOutcome {
            estimated_hours: request
                .estimate_time
                .then(|| estimate_hours(&text, subtasks.len())),
            suggested_template: if request.suggest_template {
                suggest_template(&text)
            } else {
                None
            },
            task,
            subtasks,
            priority_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::service;

    #[test]
    fn test_split_items() {
        let items = split_items("Intro\n- first\n* second\n3. third\n4) fourth\n- \n12abc");
        assert_eq!(items, vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn test_priority_and_template_hints() {
        assert_eq!(infer_priority("Acil: login crash").0, Priority::High);
        assert_eq!(infer_priority("minor typo").0, Priority::Low);
        assert_eq!(infer_priority("write docs").0, Priority::Medium);
        assert_eq!(suggest_template("login crash on save").as_deref(), Some("bug"));
        assert_eq!(suggest_template("write docs"), None);
    }

    #[test]
    fn test_intelligent_create_with_split() {
        let (_dir, service) = service();
        let outcome = service
            .intelligent_create(IntelligentRequest {
                title: "Urgent release prep".to_string(),
                description: "- bump version\n- write changelog".to_string(),
                auto_split: true,
                estimate_time: true,
                smart_priority: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(outcome.task.priority, Priority::High);
        assert_eq!(outcome.subtasks.len(), 2);
        assert!(outcome
            .subtasks
            .iter()
            .all(|t| t.parent_id.as_deref() == Some(outcome.task.id.as_str())));
        assert!(outcome.estimated_hours.unwrap() >= 4.0);
        assert!(outcome.suggested_template.is_none());
    }
}

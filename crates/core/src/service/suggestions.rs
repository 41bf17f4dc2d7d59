use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use super::TaskService;
use crate::error::ServiceResult;
use crate::types::{Priority, Task, TaskStatus};

const STALE_AFTER_DAYS: i64 = 7;
const DUE_SOON_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    OverdueTask,
    DueSoon,
    ReadyToStart,
    StaleInProgress,
    Blocked,
    NextTask,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub priority: Priority,
    pub message: String,
    pub task_id: Option<String>,
}

impl Suggestion {
    fn for_task(kind: SuggestionKind, priority: Priority, task: &Task, message: String) -> Self {
        Self {
            kind,
            priority,
            message,
            task_id: Some(task.id.clone()),
        }
    }
}

impl TaskService {
    /// Actionable hints about the workspace, most important first.
    pub fn suggestions(&self, limit: usize) -> ServiceResult<Vec<Suggestion>> {
        let tasks = self.all_tasks()?;
        let now = Utc::now();
        let today = now.date_naive();
        let open: Vec<&Task> = tasks.iter().filter(|t| !t.status.is_done() && t.status != TaskStatus::Cancelled).collect();

        let mut out = Vec::new();
        for task in &open {
            if let Some(due) = task.due_date {
                let days = (due - today).num_days();
                if days < 0 {
                    out.push(Suggestion::for_task(
                        SuggestionKind::OverdueTask,
                        Priority::High,
                        task,
                        format!("'{}' is {} day(s) overdue", task.title, -days),
                    ));
                } else if days <= DUE_SOON_DAYS {
                    out.push(Suggestion::for_task(
                        SuggestionKind::DueSoon,
                        Priority::Medium,
                        task,
                        format!("'{}' is due in {} day(s)", task.title, days),
                    ));
                }
            }
        }

        let mut ready = Vec::new();
        for task in open.iter().filter(|t| t.status == TaskStatus::Pending) {
            let deps = self.dependencies_of(&task.id)?;
            let blocking = deps
                .iter()
                .filter(|d| tasks.iter().any(|t| t.id == d.source_id && !t.status.is_done()))
                .count();
            if blocking > 0 {
                out.push(Suggestion::for_task(
                    SuggestionKind::Blocked,
                    Priority::Low,
                    task,
                    format!("'{}' waits on {} unfinished task(s)", task.title, blocking),
                ));
            } else if !deps.is_empty() {
                out.push(Suggestion::for_task(
                    SuggestionKind::ReadyToStart,
                    Priority::Medium,
                    task,
                    format!("'{}' has all dependencies completed and can start", task.title),
                ));
                ready.push(*task);
            } else {
                ready.push(*task);
            }
        }

        for task in open.iter().filter(|t| t.status == TaskStatus::InProgress) {
            if now - task.updated_at > Duration::days(STALE_AFTER_DAYS) {
                out.push(Suggestion::for_task(
                    SuggestionKind::StaleInProgress,
                    Priority::Low,
                    task,
                    format!("'{}' has been in progress without updates for over a week", task.title),
                ));
            }
        }

        let in_progress = open.iter().any(|t| t.status == TaskStatus::InProgress);
        if !in_progress {
            if let Some(next) = ready
                .iter()
                .max_by(|a, b| a.priority.cmp(&b.priority).then_with(|| b.created_at.cmp(&a.created_at)))
            {
                out.push(Suggestion::for_task(
                    SuggestionKind::NextTask,
                    next.priority,
                    next,
                    format!("Nothing is in progress; start with '{}'", next.title),
                ));
            }
        }

        out.sort_by(|a, b| b.priority.cmp(&a.priority));
        out.truncate(limit);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{service, task};
    use crate::service::{NewTask, TaskUpdate};

    #[test]
    fn test_overdue_first_then_next_task() {
        let (_dir, service) = service();
        let yesterday = Utc::now().date_naive() - Duration::days(1);
        let late = service
            .create_task(NewTask {
                title: "Late".to_string(),
                due_date: Some(yesterday),
                ..Default::default()
            })
            .unwrap();

        let suggestions = service.suggestions(10).unwrap();
        assert_eq!(suggestions[0].kind, SuggestionKind::OverdueTask);
        assert_eq!(suggestions[0].task_id.as_deref(), Some(late.id.as_str()));
        assert!(suggestions.iter().any(|s| s.kind == SuggestionKind::NextTask));
    }

    #[test]
    fn test_ready_and_blocked() {
        let (_dir, service) = service();
        let a = task(&service, "A");
        let b = task(&service, "B");
        service.add_dependency(&a.id, &b.id, "onceki").unwrap();

        let kinds: Vec<_> = service.suggestions(10).unwrap().into_iter().map(|s| s.kind).collect();
        assert!(kinds.contains(&SuggestionKind::Blocked));

        service.update_task(&a.id, TaskUpdate::status(TaskStatus::Completed)).unwrap();
        let kinds: Vec<_> = service.suggestions(10).unwrap().into_iter().map(|s| s.kind).collect();
        assert!(kinds.contains(&SuggestionKind::ReadyToStart));
        assert!(!kinds.contains(&SuggestionKind::Blocked));
    }

    #[test]
    fn test_limit_applies() {
        let (_dir, service) = service();
        let yesterday = Utc::now().date_naive() - Duration::days(1);
        for i in 0..5 {
            service
                .create_task(NewTask {
                    title: format!("t{}", i),
                    due_date: Some(yesterday),
                    ..Default::default()
                })
                .unwrap();
        }
        assert_eq!(service.suggestions(2).unwrap().len(), 2);
    }
}

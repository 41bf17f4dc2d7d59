use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{TaskService, TaskUpdate};
use crate::error::ServiceResult;
use crate::storage::{INTERACTIONS, META, TASKS};
use crate::types::{Interaction, InteractionKind, Priority, Task, TaskStatus};

const ACTIVE_TASK_KEY: &str = "active_task";

/// Snapshot handed to AI assistants by `gorev_context action=summary`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSummary {
    pub active_task: Option<Task>,
    pub in_progress: Vec<Task>,
    pub high_priority_pending: Vec<Task>,
    /// Tasks with at least one unfinished dependency
    pub blocked: Vec<Task>,
    pub recent: Vec<Task>,
}

impl TaskService {
    pub(crate) fn record_interaction(&self, task_id: &str, kind: InteractionKind) -> ServiceResult<()> {
        let interaction = Interaction {
            task_id: task_id.to_string(),
            kind,
            at: Utc::now(),
        };
        self.store.put(INTERACTIONS, task_id, &interaction)?;
        Ok(())
    }

    /// Mark the task being worked on; a pending task is started.
    pub fn set_active_task(&self, id: &str) -> ServiceResult<Task> {
        let mut task = self.load_task(id)?;
        if task.status == TaskStatus::Pending {
            task = self.update_task(id, TaskUpdate::status(TaskStatus::InProgress))?;
        }
        self.store.put(META, ACTIVE_TASK_KEY, &task.id)?;
        self.record_interaction(&task.id, InteractionKind::SetActive)?;
        Ok(task)
    }

    pub(crate) fn active_task_id(&self) -> ServiceResult<Option<String>> {
        Ok(self.store.get(META, ACTIVE_TASK_KEY)?)
    }

    pub fn active_task(&self) -> ServiceResult<Option<Task>> {
        match self.active_task_id()? {
            Some(id) => Ok(self.store.get(TASKS, &id)?),
            None => Ok(None),
        }
    }

    pub fn clear_active_task(&self) -> ServiceResult<()> {
        self.store.remove(META, ACTIVE_TASK_KEY)?;
        Ok(())
    }

    /// Most recently touched tasks, newest first.
    pub fn recent_tasks(&self, limit: usize) -> ServiceResult<Vec<Task>> {
        let mut interactions: Vec<Interaction> = self.store.scan(INTERACTIONS, "")?;
        interactions.sort_by(|a, b| b.at.cmp(&a.at));

        let mut tasks = Vec::new();
        for interaction in interactions {
            if tasks.len() >= limit {
                break;
            }
            if let Some(task) = self.store.get::<Task>(TASKS, &interaction.task_id)? {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }

    pub fn context_summary(&self) -> ServiceResult<ContextSummary> {
        let tasks = self.all_tasks()?;

        let in_progress = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .cloned()
            .collect();
        let high_priority_pending = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending && t.priority == Priority::High)
            .cloned()
            .collect();

        let mut blocked = Vec::new();
        for task in tasks.iter().filter(|t| !t.status.is_done()) {
            let waiting = self.dependencies_of(&task.id)?.iter().any(|d| {
                tasks
                    .iter()
                    .find(|t| t.id == d.source_id)
                    .map_or(false, |t| !t.status.is_done())
            });
            if waiting {
                blocked.push(task.clone());
            }
        }

        Ok(ContextSummary {
            active_task: self.active_task()?,
            in_progress,
            high_priority_pending,
            blocked,
            recent: self.recent_tasks(5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{service, task};

    #[test]
    fn test_set_active_starts_pending_task() {
        let (_dir, service) = service();
        let a = task(&service, "A");

        let active = service.set_active_task(&a.id).unwrap();
        assert_eq!(active.status, TaskStatus::InProgress);
        assert_eq!(service.active_task().unwrap().unwrap().id, a.id);

        service.clear_active_task().unwrap();
        assert!(service.active_task().unwrap().is_none());
    }

    #[test]
    fn test_recent_tasks_newest_first() {
        let (_dir, service) = service();
        let a = task(&service, "A");
        let b = task(&service, "B");
        service.get_task(&a.id).unwrap();

        let recent = service.recent_tasks(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, a.id);
        assert_eq!(recent[1].id, b.id);
        assert_eq!(service.recent_tasks(1).unwrap().len(), 1);
    }

    #[test]
    fn test_context_summary_reports_blocked() {
        let (_dir, service) = service();
        let a = task(&service, "A");
        let b = task(&service, "B");
        service.add_dependency(&a.id, &b.id, "onceki").unwrap();

        let summary = service.context_summary().unwrap();
        assert_eq!(summary.blocked.len(), 1);
        assert_eq!(summary.blocked[0].id, b.id);
        assert!(summary.active_task.is_none());
    }
}

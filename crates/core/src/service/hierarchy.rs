use chrono::Utc;

use super::{NewTask, TaskService};
use crate::error::{ServiceError, ServiceResult};
use crate::storage::TASKS;
use crate::types::{Task, TaskHierarchy, TaskStatus};

impl TaskService {
    pub fn create_subtask(&self, parent_id: &str, mut new: NewTask) -> ServiceResult<Task> {
        self.load_task(parent_id)?;
        new.parent_id = Some(parent_id.to_string());
        self.create_task(new)
    }

    pub fn children(&self, id: &str) -> ServiceResult<Vec<Task>> {
        let mut children: Vec<Task> = self
            .all_tasks()?
            .into_iter()
            .filter(|t| t.parent_id.as_deref() == Some(id))
            .collect();
        children.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(children)
    }

    /// Move a task under `new_parent`, or to the root level with `None`.
    pub fn change_parent(&self, id: &str, new_parent: Option<&str>) -> ServiceResult<Task> {
        let mut task = self.load_task(id)?;

        if let Some(parent_id) = new_parent {
            if parent_id == id {
                return Err(ServiceError::invalid("a task cannot be its own parent"));
            }
            let parent = self.load_task(parent_id)?;
            if parent.project_id != task.project_id {
                return Err(ServiceError::invalid(
                    "parent task must belong to the same project",
                ));
            }
            let ancestors = self.ancestors(&parent)?;
            if ancestors.iter().any(|a| a.id == id) {
                return Err(ServiceError::conflict("moving the task there would create a cycle"));
            }
        }

        task.parent_id = new_parent.map(str::to_string);
        task.updated_at = Utc::now();
        self.store.put(TASKS, &task.id, &task)?;
        Ok(task)
    }

    /// Parents of `task` from the nearest up to the root.
    fn ancestors(&self, task: &Task) -> ServiceResult<Vec<Task>> {
        let mut chain = Vec::new();
        let mut next = task.parent_id.clone();
        while let Some(id) = next {
            if chain.iter().any(|t: &Task| t.id == id) {
                break;
            }
            let parent = self.load_task(&id)?;
            next = parent.parent_id.clone();
            chain.push(parent);
        }
        Ok(chain)
    }

    pub fn hierarchy(&self, id: &str) -> ServiceResult<TaskHierarchy> {
        let task = self.load_task(id)?;
        let ancestors = self.ancestors(&task)?;
        let all = self.all_tasks()?;

        let mut descendants = Vec::new();
        let mut frontier = vec![task.id.clone()];
        while let Some(current) = frontier.pop() {
            for child in all.iter().filter(|t| t.parent_id.as_deref() == Some(current.as_str())) {
                frontier.push(child.id.clone());
                descendants.push(child);
            }
        }

        let count = |status: TaskStatus| descendants.iter().filter(|t| t.status == status).count();
        let total = descendants.len();
        let completed = count(TaskStatus::Completed);
        let progress_percent = if total == 0 {
            0.0
        } else {
            completed as f64 * 100.0 / total as f64
        };

        Ok(TaskHierarchy {
            children: self.children(id)?,
            ancestors,
            total_descendants: total,
            completed_descendants: completed,
            in_progress_descendants: count(TaskStatus::InProgress),
            pending_descendants: count(TaskStatus::Pending),
            progress_percent,
            task,
        })
    }
}

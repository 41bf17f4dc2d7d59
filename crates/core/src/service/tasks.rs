use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::TaskService;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::{DEPENDENCIES, FILE_WATCHES, INTERACTIONS, PROJECTS, TASKS};
use crate::types::{
    Dependency, FileWatch, InteractionKind, Priority, Project, Summary, Task, TaskDetail,
    TaskFilter, TaskSort, TaskStatus,
};

/// Input for creating a task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub project_id: Option<String>,
    pub parent_id: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    #[serde(rename = "baslik", default)]
    pub title: Option<String>,
    #[serde(rename = "aciklama", default)]
    pub description: Option<String>,
    #[serde(rename = "durum", default)]
    pub status: Option<TaskStatus>,
    #[serde(rename = "oncelik", default)]
    pub priority: Option<Priority>,
    #[serde(rename = "proje_id", default)]
    pub project_id: Option<String>,
    #[serde(rename = "son_tarih", default)]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "etiketler", default)]
    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.project_id.is_none()
            && self.due_date.is_none()
            && self.tags.is_none()
    }

    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Parse `YYYY-MM-DD`, the only date format the tools accept.
pub fn parse_due_date(value: &str) -> ServiceResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::invalid(format!("invalid date '{}' (expected YYYY-MM-DD)", value)))
}

/// Split a comma separated tag list, dropping blanks.
pub fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

impl TaskService {
    pub(crate) fn all_tasks(&self) -> ServiceResult<Vec<Task>> {
        Ok(self.store.scan(TASKS, "")?)
    }

    pub(crate) fn load_task(&self, id: &str) -> ServiceResult<Task> {
        self.store
            .get(TASKS, id)?
            .ok_or_else(|| ServiceError::not_found("task", id))
    }

    pub fn get_task(&self, id: &str) -> ServiceResult<Task> {
        let task = self.load_task(id)?;
        self.record_interaction(&task.id, InteractionKind::Viewed)?;
        Ok(task)
    }

    pub fn task_detail(&self, id: &str) -> ServiceResult<TaskDetail> {
        let task = self.get_task(id)?;
        let all = self.all_tasks()?;

        let subtasks: Vec<Task> = all
            .iter()
            .filter(|t| t.parent_id.as_deref() == Some(id))
            .cloned()
            .collect();
        let dependencies = self.dependencies_of(id)?;
        let open_dependency_count = dependencies
            .iter()
            .filter(|d| {
                all.iter()
                    .find(|t| t.id == d.source_id)
                    .map_or(false, |t| !t.status.is_done())
            })
            .count();
        let dependent_count = self.dependents_of(id)?.len();

        Ok(TaskDetail {
            task,
            subtasks,
            dependencies,
            open_dependency_count,
            dependent_count,
        })
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> ServiceResult<Vec<Task>> {
        let project = match (&filter.project_id, filter.all_projects) {
            (Some(id), _) => Some(id.clone()),
            (None, true) => None,
            (None, false) => self.active_project_id()?,
        };
        let today = Utc::now().date_naive();

        let mut tasks: Vec<Task> = self
            .all_tasks()?
            .into_iter()
            .filter(|t| project.is_none() || t.project_id == project)
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .filter(|t| filter.priority.map_or(true, |p| t.priority == p))
            .filter(|t| {
                filter
                    .tag
                    .as_deref()
                    .map_or(true, |tag| t.tags.iter().any(|x| x.eq_ignore_ascii_case(tag)))
            })
            .filter(|t| match filter.due_filter.as_deref() {
                Some("acil") | Some("urgent") => t.due_date.map_or(false, |d| {
                    !t.status.is_done() && d >= today && (d - today).num_days() <= 7
                }),
                Some("gecmis") | Some("overdue") => {
                    t.due_date.map_or(false, |d| !t.status.is_done() && d < today)
                }
                _ => true,
            })
            .collect();

        sort_tasks(&mut tasks, filter.sort.unwrap_or(TaskSort::CreatedDesc));

        let tasks = tasks
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(tasks)
    }

    pub fn create_task(&self, new: NewTask) -> ServiceResult<Task> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(ServiceError::invalid("task title is required"));
        }

        let mut project_id = new.project_id.filter(|p| !p.is_empty());
        if let Some(parent_id) = new.parent_id.as_deref() {
            let parent = self.load_task(parent_id)?;
            if project_id.is_none() {
                project_id = parent.project_id;
            }
        }
        if let Some(id) = project_id.as_deref() {
            self.load_project(id)?;
        }

        let mut task = Task::new(title);
        task.description = new.description;
        task.priority = new.priority;
        task.project_id = project_id;
        task.parent_id = new.parent_id;
        task.due_date = new.due_date;
        task.tags = new.tags;

        self.store.put(TASKS, &task.id, &task)?;
        self.record_interaction(&task.id, InteractionKind::Created)?;

        tracing::debug!(task_id = %task.id, title = %task.title, "Created task");
        Ok(task)
    }

    pub fn update_task(&self, id: &str, update: TaskUpdate) -> ServiceResult<Task> {
        let mut task = self.load_task(id)?;

        if let Some(status) = update.status {
            if status != task.status {
                self.check_transition(&task, status)?;
            }
            task.status = status;
        }
        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(ServiceError::invalid("task title cannot be empty"));
            }
            task.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(project_id) = update.project_id {
            if project_id.is_empty() {
                task.project_id = None;
            } else {
                self.load_project(&project_id)?;
                task.project_id = Some(project_id);
            }
        }
        if let Some(due) = update.due_date {
            task.due_date = Some(due);
        }
        if let Some(tags) = update.tags {
            task.tags = tags;
        }

        task.updated_at = Utc::now();
        self.store.put(TASKS, &task.id, &task)?;
        self.record_interaction(&task.id, InteractionKind::Updated)?;
        Ok(task)
    }

    fn check_transition(&self, task: &Task, to: TaskStatus) -> ServiceResult<()> {
        match to {
            TaskStatus::InProgress => {
                let blocking: Vec<String> = self
                    .dependencies_of(&task.id)?
                    .into_iter()
                    .filter_map(|d| self.load_task(&d.source_id).ok())
                    .filter(|t| !t.status.is_done())
                    .map(|t| t.title)
                    .collect();
                if !blocking.is_empty() {
                    return Err(ServiceError::conflict(format!(
                        "task cannot start before its dependencies are completed: {}",
                        blocking.join(", ")
                    )));
                }
            }
            TaskStatus::Completed => {
                let open = self
                    .children(&task.id)?
                    .into_iter()
                    .filter(|t| !t.status.is_done())
                    .count();
                if open > 0 {
                    return Err(ServiceError::conflict(format!(
                        "task has {} unfinished subtask(s) and cannot be completed",
                        open
                    )));
                }
            }
            TaskStatus::Pending | TaskStatus::Cancelled => {}
        }
        Ok(())
    }

    pub fn delete_task(&self, id: &str) -> ServiceResult<Task> {
        let task = self.load_task(id)?;
        if !self.children(id)?.is_empty() {
            return Err(ServiceError::conflict(
                "a task with subtasks cannot be deleted; delete or move its subtasks first",
            ));
        }

        let edges: Vec<Dependency> = self.store.scan(DEPENDENCIES, "")?;
        let watches: Vec<FileWatch> = self.store.scan(FILE_WATCHES, &format!("{}/", id))?;

        self.store.write(|batch| {
            batch.remove(TASKS, id)?;
            batch.remove(INTERACTIONS, id)?;
            for edge in edges.iter().filter(|d| d.source_id == id || d.target_id == id) {
                batch.remove(DEPENDENCIES, &super::dependencies::edge_key(edge))?;
            }
            for watch in &watches {
                batch.remove(FILE_WATCHES, &format!("{}/{}", watch.task_id, watch.path))?;
            }
            Ok(())
        })?;

        if self.active_task_id()?.as_deref() == Some(id) {
            self.clear_active_task()?;
        }

        tracing::debug!(task_id = %id, "Deleted task");
        Ok(task)
    }

    pub fn task_count(&self) -> ServiceResult<usize> {
        Ok(self.all_tasks()?.len())
    }

    pub fn summary(&self) -> ServiceResult<Summary> {
        let tasks = self.all_tasks()?;
        let projects: Vec<Project> = self.store.scan(PROJECTS, "")?;
        let today = Utc::now().date_naive();

        let mut summary = Summary {
            total_projects: projects.len(),
            total_tasks: tasks.len(),
            ..Default::default()
        };
        for task in &tasks {
            match task.status {
                TaskStatus::Pending => summary.pending += 1,
                TaskStatus::InProgress => summary.in_progress += 1,
                TaskStatus::Completed => summary.completed += 1,
                TaskStatus::Cancelled => summary.cancelled += 1,
            }
            match task.priority {
                Priority::High => summary.high_priority += 1,
                Priority::Medium => summary.medium_priority += 1,
                Priority::Low => summary.low_priority += 1,
            }
            if task.due_date.map_or(false, |d| d < today) && !task.status.is_done() {
                summary.overdue += 1;
            }
        }
        Ok(summary)
    }
}

pub(crate) fn sort_tasks(tasks: &mut [Task], sort: TaskSort) {
    match sort {
        TaskSort::CreatedAsc => tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        TaskSort::CreatedDesc => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        TaskSort::DueAsc => tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.created_at.cmp(&b.created_at),
        }),
        TaskSort::DueDesc => tasks.sort_by(|a, b| b.due_date.cmp(&a.due_date)),
        TaskSort::Priority => tasks.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{service, task};

    #[test]
    fn test_create_requires_title() {
        let (_dir, service) = service();
        let err = service.create_task(NewTask::default()).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn test_update_and_summary() {
        let (_dir, service) = service();
        let a = task(&service, "A");
        let _b = task(&service, "B");

        service
            .update_task(
                &a.id,
                TaskUpdate {
                    status: Some(TaskStatus::InProgress),
                    priority: Some(Priority::High),
                    ..Default::default()
                },
            )
            .unwrap();

        let summary = service.summary().unwrap();
        assert_eq!(summary.total_tasks, 2);
        assert_eq!(summary.in_progress, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.high_priority, 1);
    }

    #[test]
    fn test_cannot_start_before_dependency_done() {
        let (_dir, service) = service();
        let first = task(&service, "First");
        let second = task(&service, "Second");
        service.add_dependency(&first.id, &second.id, "onceki").unwrap();

        let err = service
            .update_task(&second.id, TaskUpdate::status(TaskStatus::InProgress))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        service
            .update_task(&first.id, TaskUpdate::status(TaskStatus::Completed))
            .unwrap();
        service
            .update_task(&second.id, TaskUpdate::status(TaskStatus::InProgress))
            .unwrap();
    }

    #[test]
    fn test_delete_removes_edges_and_blocks_parents() {
        let (_dir, service) = service();
        let parent = task(&service, "Parent");
        let child = service
            .create_subtask(
                &parent.id,
                NewTask {
                    title: "Child".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        let other = task(&service, "Other");
        service.add_dependency(&child.id, &other.id, "onceki").unwrap();

        assert!(service.delete_task(&parent.id).is_err());

        service.delete_task(&child.id).unwrap();
        assert!(service.dependencies_of(&other.id).unwrap().is_empty());
        service.delete_task(&parent.id).unwrap();
        assert_eq!(service.task_count().unwrap(), 1);
    }

    #[test]
    fn test_list_filters_by_status_and_tag() {
        let (_dir, service) = service();
        let mut tagged = task(&service, "Tagged");
        tagged = service
            .update_task(
                &tagged.id,
                TaskUpdate {
                    tags: Some(vec!["backend".to_string()]),
                    ..Default::default()
                },
            )
            .unwrap();
        task(&service, "Plain");

        let filter = TaskFilter {
            tag: Some("backend".to_string()),
            ..Default::default()
        };
        let tasks = service.list_tasks(&filter).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, tagged.id);

        let filter = TaskFilter {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        assert!(service.list_tasks(&filter).unwrap().is_empty());
    }

    #[test]
    fn test_split_tags_and_dates() {
        assert_eq!(split_tags("a, b,,c "), vec!["a", "b", "c"]);
        assert!(parse_due_date("2025-02-30").is_err());
        assert_eq!(
            parse_due_date("2025-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
    }
}

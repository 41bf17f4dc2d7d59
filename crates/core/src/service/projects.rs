use chrono::Utc;

use super::TaskService;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::{META, PROJECTS};
use crate::types::{Project, ProjectOverview, Task, TaskFilter};

const ACTIVE_PROJECT_KEY: &str = "active_project";

impl TaskService {
    pub(crate) fn load_project(&self, id: &str) -> ServiceResult<Project> {
        self.store
            .get(PROJECTS, id)?
            .ok_or_else(|| ServiceError::not_found("project", id))
    }

    pub fn create_project(&self, name: &str, description: &str) -> ServiceResult<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid("project name is required"));
        }

        let now = Utc::now();
        let project = Project {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store.put(PROJECTS, &project.id, &project)?;

        tracing::debug!(project_id = %project.id, name = %project.name, "Created project");
        Ok(project)
    }

    pub fn get_project(&self, id: &str) -> ServiceResult<Project> {
        self.load_project(id)
    }

    pub fn list_projects(&self) -> ServiceResult<Vec<ProjectOverview>> {
        let projects: Vec<Project> = self.store.scan(PROJECTS, "")?;
        let tasks = self.all_tasks()?;
        let active = self.active_project_id()?;

        let mut overview: Vec<ProjectOverview> = projects
            .into_iter()
            .map(|project| {
                let task_count = tasks
                    .iter()
                    .filter(|t| t.project_id.as_deref() == Some(project.id.as_str()))
                    .count();
                let is_active = active.as_deref() == Some(project.id.as_str());
                ProjectOverview {
                    project,
                    task_count,
                    is_active,
                }
            })
            .collect();
        overview.sort_by(|a, b| a.project.created_at.cmp(&b.project.created_at));
        Ok(overview)
    }

    pub fn update_project(
        &self,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> ServiceResult<Project> {
        let mut project = self.load_project(id)?;
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(ServiceError::invalid("project name cannot be empty"));
            }
            project.name = name.trim().to_string();
        }
        if let Some(description) = description {
            project.description = description.to_string();
        }
        project.updated_at = Utc::now();
        self.store.put(PROJECTS, &project.id, &project)?;
        Ok(project)
    }

    pub fn delete_project(&self, id: &str) -> ServiceResult<Project> {
        let project = self.load_project(id)?;
        let task_count = self
            .all_tasks()?
            .iter()
            .filter(|t| t.project_id.as_deref() == Some(id))
            .count();
        if task_count > 0 {
            return Err(ServiceError::conflict(format!(
                "project '{}' still has {} task(s)",
                project.name, task_count
            )));
        }

        self.store.remove(PROJECTS, id)?;
        if self.active_project_id()?.as_deref() == Some(id) {
            self.clear_active_project()?;
        }
        Ok(project)
    }

    /// Tasks of one project, regardless of the active project.
    pub fn project_tasks(&self, id: &str, limit: Option<usize>, offset: usize) -> ServiceResult<Vec<Task>> {
        self.load_project(id)?;
        self.list_tasks(&TaskFilter {
            project_id: Some(id.to_string()),
            limit,
            offset,
            ..Default::default()
        })
    }

    pub fn set_active_project(&self, id: &str) -> ServiceResult<Project> {
        let project = self.load_project(id)?;
        self.store.put(META, ACTIVE_PROJECT_KEY, &project.id)?;
        Ok(project)
    }

    pub(crate) fn active_project_id(&self) -> ServiceResult<Option<String>> {
        Ok(self.store.get(META, ACTIVE_PROJECT_KEY)?)
    }

    pub fn active_project(&self) -> ServiceResult<Option<Project>> {
        match self.active_project_id()? {
            // A dangling id means the project was removed out from under us
            Some(id) => Ok(self.store.get(PROJECTS, &id)?),
            None => Ok(None),
        }
    }

    pub fn clear_active_project(&self) -> ServiceResult<()> {
        self.store.remove(META, ACTIVE_PROJECT_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::service;
    use crate::service::NewTask;

    #[test]
    fn test_active_project_scopes_listing() {
        let (_dir, service) = service();
        let alpha = service.create_project("Alpha", "").unwrap();
        let beta = service.create_project("Beta", "").unwrap();

        for (title, project) in [("a1", &alpha), ("b1", &beta)] {
            service
                .create_task(NewTask {
                    title: title.to_string(),
                    project_id: Some(project.id.clone()),
                    ..Default::default()
                })
                .unwrap();
        }

        assert_eq!(service.list_tasks(&TaskFilter::default()).unwrap().len(), 2);

        service.set_active_project(&alpha.id).unwrap();
        let tasks = service.list_tasks(&TaskFilter::default()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "a1");

        let all = TaskFilter {
            all_projects: true,
            ..Default::default()
        };
        assert_eq!(service.list_tasks(&all).unwrap().len(), 2);

        let overview = service.list_projects().unwrap();
        assert!(overview.iter().any(|p| p.project.id == alpha.id && p.is_active));
        assert!(overview.iter().all(|p| p.task_count == 1));

        service.clear_active_project().unwrap();
        assert!(service.active_project().unwrap().is_none());
    }

    #[test]
    fn test_delete_project_with_tasks_fails() {
        let (_dir, service) = service();
        let project = service.create_project("Busy", "").unwrap();
        service
            .create_task(NewTask {
                title: "t".to_string(),
                project_id: Some(project.id.clone()),
                ..Default::default()
            })
            .unwrap();

        let err = service.delete_project(&project.id).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let empty = service.create_project("Empty", "").unwrap();
        service.set_active_project(&empty.id).unwrap();
        service.delete_project(&empty.id).unwrap();
        assert!(service.active_project().unwrap().is_none());
    }

    #[test]
    fn test_unknown_project_rejected() {
        let (_dir, service) = service();
        let err = service
            .create_task(NewTask {
                title: "t".to_string(),
                project_id: Some("missing".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}

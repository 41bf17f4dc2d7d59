use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::dependencies::edge_key;
use super::TaskService;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::{DEPENDENCIES, PROJECTS, TASKS};
use crate::types::{Dependency, Project, Task, TaskStatus};

pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// Portable snapshot of a workspace's projects and tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportBundle {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_project_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportOptions {
    #[serde(default = "default_true")]
    pub include_completed: bool,
    /// Limit the export to these projects; empty exports everything
    #[serde(default)]
    pub project_ids: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_completed: true,
            project_ids: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// What to do when an imported row already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    #[default]
    Skip,
    Overwrite,
}

impl std::str::FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(Self::Skip),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(format!("invalid conflict resolution '{}' (expected skip or overwrite)", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub dry_run: bool,
    pub projects_imported: usize,
    pub tasks_imported: usize,
    pub dependencies_imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl TaskService {
    pub fn export(&self, options: &ExportOptions) -> ServiceResult<ExportBundle> {
        let wanted = |project_id: Option<&str>| {
            options.project_ids.is_empty()
                || project_id.map_or(false, |p| options.project_ids.iter().any(|id| id == p))
        };

        let projects: Vec<Project> = self
            .store
            .scan::<Project>(PROJECTS, "")?
            .into_iter()
            .filter(|p| wanted(Some(p.id.as_str())))
            .collect();
        let tasks: Vec<Task> = self
            .all_tasks()?
            .into_iter()
            .filter(|t| wanted(t.project_id.as_deref()))
            .filter(|t| options.include_completed || t.status != TaskStatus::Completed)
            .collect();

        let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        let dependencies = self
            .store
            .scan::<Dependency>(DEPENDENCIES, "")?
            .into_iter()
            .filter(|d| ids.contains(d.source_id.as_str()) && ids.contains(d.target_id.as_str()))
            .collect();

        Ok(ExportBundle {
            version: EXPORT_FORMAT_VERSION.to_string(),
            exported_at: Utc::now(),
            projects,
            tasks,
            dependencies,
            active_project_id: self.active_project_id()?,
        })
    }

    /// Load a bundle; with `dry_run` nothing is written but the report is the same.
    pub fn import(
        &self,
        bundle: &ExportBundle,
        policy: ConflictPolicy,
        dry_run: bool,
    ) -> ServiceResult<ImportReport> {
        if bundle.version != EXPORT_FORMAT_VERSION {
            return Err(ServiceError::invalid(format!(
                "unsupported export version '{}'",
                bundle.version
            )));
        }

        let mut report = ImportReport {
            dry_run,
            ..Default::default()
        };

        let existing_projects: HashSet<String> = self
            .store
            .scan::<Project>(PROJECTS, "")?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let existing_tasks: HashSet<String> = self.all_tasks()?.into_iter().map(|t| t.id).collect();

        let mut projects = Vec::new();
        for project in &bundle.projects {
            if existing_projects.contains(&project.id) && policy == ConflictPolicy::Skip {
                report.skipped += 1;
            } else {
                projects.push(project);
            }
        }

        let known_projects: HashSet<&str> = existing_projects
            .iter()
            .map(String::as_str)
            .chain(bundle.projects.iter().map(|p| p.id.as_str()))
            .collect();
        let mut tasks = Vec::new();
        for task in &bundle.tasks {
            if let Some(project_id) = task.project_id.as_deref() {
                if !known_projects.contains(project_id) {
                    report.errors.push(format!(
                        "task {} references unknown project {}",
                        task.id, project_id
                    ));
                    continue;
                }
            }
            if existing_tasks.contains(&task.id) && policy == ConflictPolicy::Skip {
                report.skipped += 1;
            } else {
                tasks.push(task);
            }
        }

        let known_tasks: HashSet<&str> = existing_tasks
            .iter()
            .map(String::as_str)
            .chain(tasks.iter().map(|t| t.id.as_str()))
            .collect();
        let dependencies: Vec<&Dependency> = bundle
            .dependencies
            .iter()
            .filter(|d| {
                known_tasks.contains(d.source_id.as_str()) && known_tasks.contains(d.target_id.as_str())
            })
            .collect();

        report.projects_imported = projects.len();
        report.tasks_imported = tasks.len();
        report.dependencies_imported = dependencies.len();

        if !dry_run {
            self.store.write(|batch| {
                for project in &projects {
                    batch.put(PROJECTS, &project.id, *project)?;
                }
                for task in &tasks {
                    batch.put(TASKS, &task.id, *task)?;
                }
                for edge in &dependencies {
                    batch.put(DEPENDENCIES, &edge_key(edge), *edge)?;
                }
                Ok(())
            })?;
            tracing::info!(
                projects = report.projects_imported,
                tasks = report.tasks_imported,
                skipped = report.skipped,
                "Imported bundle"
            );
        }
        Ok(report)
    }
}

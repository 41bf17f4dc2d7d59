use serde::{Deserialize, Serialize};

use super::{TaskService, TaskUpdate};
use crate::error::ServiceResult;
use crate::types::{Task, TaskStatus};

/// Per-id outcome of a bulk operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFailure {
    pub id: String,
    pub error: String,
}

impl BulkReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    fn record(&mut self, id: &str, result: ServiceResult<Task>) {
        match result {
            Ok(_) => self.succeeded.push(id.to_string()),
            Err(e) => self.failed.push(BulkFailure {
                id: id.to_string(),
                error: e.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    Add,
    Remove,
    Replace,
}

impl std::str::FromStr for TagMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" | "ekle" => Ok(Self::Add),
            "remove" | "kaldir" => Ok(Self::Remove),
            "replace" | "degistir" => Ok(Self::Replace),
            other => Err(format!("invalid tag operation '{}' (expected add, remove or replace)", other)),
        }
    }
}

impl TaskService {
    /// Move every task to `status`; each id succeeds or fails on its own.
    pub fn bulk_transition(&self, ids: &[String], status: TaskStatus) -> BulkReport {
        let mut report = BulkReport::default();
        for id in ids {
            report.record(id, self.update_task(id, TaskUpdate::status(status)));
        }
        report
    }

    pub fn bulk_tag(&self, ids: &[String], tags: &[String], mode: TagMode) -> BulkReport {
        let mut report = BulkReport::default();
        for id in ids {
            let result = self.load_task(id).and_then(|task| {
                let mut next = task.tags;
                match mode {
                    TagMode::Add => {
                        for tag in tags {
                            if !next.contains(tag) {
                                next.push(tag.clone());
                            }
                        }
                    }
                    TagMode::Remove => next.retain(|t| !tags.contains(t)),
                    TagMode::Replace => next = tags.to_vec(),
                }
                self.update_task(
                    id,
                    TaskUpdate {
                        tags: Some(next),
                        ..Default::default()
                    },
                )
            });
            report.record(id, result);
        }
        report
    }

    pub fn bulk_update(&self, ids: &[String], update: &TaskUpdate) -> BulkReport {
        let mut report = BulkReport::default();
        for id in ids {
            report.record(id, self.update_task(id, update.clone()));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{service, task};
    use crate::types::Priority;

    #[test]
    fn test_bulk_transition_reports_failures() {
        let (_dir, service) = service();
        let a = task(&service, "A");
        let b = task(&service, "B");
        let ids = vec![a.id.clone(), b.id.clone(), "missing".to_string()];

        let report = service.bulk_transition(&ids, TaskStatus::Completed);
        assert_eq!(report.succeeded, vec![a.id, b.id]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, "missing");
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_bulk_tag_modes() {
        let (_dir, service) = service();
        let a = task(&service, "A");
        let ids = vec![a.id.clone()];
        let tags = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        service.bulk_tag(&ids, &tags(&["x", "y"]), TagMode::Add);
        service.bulk_tag(&ids, &tags(&["x"]), TagMode::Remove);
        assert_eq!(service.load_task(&a.id).unwrap().tags, tags(&["y"]));

        service.bulk_tag(&ids, &tags(&["z"]), TagMode::Replace);
        assert_eq!(service.load_task(&a.id).unwrap().tags, tags(&["z"]));
    }

    #[test]
    fn test_bulk_update_priority() {
        let (_dir, service) = service();
        let a = task(&service, "A");
        let update = TaskUpdate {
            priority: Some(Priority::High),
            ..Default::default()
        };
        let report = service.bulk_update(&[a.id.clone()], &update);
        assert!(report.failed.is_empty());
        assert_eq!(service.load_task(&a.id).unwrap().priority, Priority::High);
    }
}

use std::collections::{HashMap, HashSet};

use super::TaskService;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::DEPENDENCIES;
use crate::types::Dependency;

/// Edges are keyed by the waiting task first so `dependencies_of` is a prefix scan.
pub(crate) fn edge_key(edge: &Dependency) -> String {
    format!("{}/{}", edge.target_id, edge.source_id)
}

impl TaskService {
    /// Make `target_id` wait for `source_id`.
    pub fn add_dependency(&self, source_id: &str, target_id: &str, kind: &str) -> ServiceResult<Dependency> {
        if source_id == target_id {
            return Err(ServiceError::invalid("a task cannot depend on itself"));
        }
        self.load_task(source_id)?;
        self.load_task(target_id)?;

        let edge = Dependency {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            kind: if kind.trim().is_empty() { "onceki".to_string() } else { kind.trim().to_string() },
        };
        let key = edge_key(&edge);

        if self.store.get::<Dependency>(DEPENDENCIES, &key)?.is_some() {
            return Err(ServiceError::conflict("dependency already exists"));
        }
        if self.waits_on(source_id, target_id)? {
            return Err(ServiceError::conflict("dependency would create a cycle"));
        }

        self.store.put(DEPENDENCIES, &key, &edge)?;
        Ok(edge)
    }

    pub fn remove_dependency(&self, target_id: &str, source_id: &str) -> ServiceResult<()> {
        let key = format!("{}/{}", target_id, source_id);
        if !self.store.remove(DEPENDENCIES, &key)? {
            return Err(ServiceError::not_found("dependency", &key));
        }
        Ok(())
    }

    /// Edges `target_id` waits on
    pub fn dependencies_of(&self, target_id: &str) -> ServiceResult<Vec<Dependency>> {
        Ok(self.store.scan(DEPENDENCIES, &format!("{}/", target_id))?)
    }

    /// Edges of tasks waiting on `source_id`
    pub fn dependents_of(&self, source_id: &str) -> ServiceResult<Vec<Dependency>> {
        let all: Vec<Dependency> = self.store.scan(DEPENDENCIES, "")?;
        Ok(all.into_iter().filter(|d| d.source_id == source_id).collect())
    }

    /// Whether `from` transitively waits on `to`.
    fn waits_on(&self, from: &str, to: &str) -> ServiceResult<bool> {
        let all: Vec<Dependency> = self.store.scan(DEPENDENCIES, "")?;
        let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &all {
            graph
                .entry(edge.target_id.as_str())
                .or_default()
                .push(edge.source_id.as_str());
        }

        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == to {
                return Ok(true);
            }
            if seen.insert(node) {
                if let Some(next) = graph.get(node) {
                    stack.extend(next.iter().copied());
                }
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{service, task};

    #[test]
    fn test_add_and_list() {
        let (_dir, service) = service();
        let a = task(&service, "A");
        let b = task(&service, "B");

        let edge = service.add_dependency(&a.id, &b.id, "").unwrap();
        assert_eq!(edge.kind, "onceki");
        assert_eq!(service.dependencies_of(&b.id).unwrap(), vec![edge.clone()]);
        assert_eq!(service.dependents_of(&a.id).unwrap(), vec![edge]);
        assert!(service.dependencies_of(&a.id).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_self_duplicate_and_cycle() {
        let (_dir, service) = service();
        let a = task(&service, "A");
        let b = task(&service, "B");
        let c = task(&service, "C");

        assert!(matches!(
            service.add_dependency(&a.id, &a.id, "onceki"),
            Err(ServiceError::InvalidInput(_))
        ));

        service.add_dependency(&a.id, &b.id, "onceki").unwrap();
        service.add_dependency(&b.id, &c.id, "onceki").unwrap();
        assert!(matches!(
            service.add_dependency(&a.id, &b.id, "onceki"),
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            service.add_dependency(&c.id, &a.id, "onceki"),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn test_remove_dependency() {
        let (_dir, service) = service();
        let a = task(&service, "A");
        let b = task(&service, "B");
        service.add_dependency(&a.id, &b.id, "onceki").unwrap();

        service.remove_dependency(&b.id, &a.id).unwrap();
        assert!(service.dependencies_of(&b.id).unwrap().is_empty());
        assert!(service.remove_dependency(&b.id, &a.id).is_err());
    }
}

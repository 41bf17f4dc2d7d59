use chrono::Utc;

use super::TaskService;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::FILTER_PROFILES;
use crate::types::{FilterProfile, Task, TaskFilter};

impl TaskService {
    /// Save (or overwrite) a named filter.
    pub fn save_filter_profile(
        &self,
        name: &str,
        description: &str,
        filters: TaskFilter,
    ) -> ServiceResult<FilterProfile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid("profile name is required"));
        }

        let profile = FilterProfile {
            name: name.to_string(),
            description: description.to_string(),
            filters,
            created_at: Utc::now(),
            use_count: 0,
        };
        self.store.put(FILTER_PROFILES, name, &profile)?;
        Ok(profile)
    }

    /// Run a saved filter and count the use.
    pub fn load_filter_profile(&self, name: &str) -> ServiceResult<(FilterProfile, Vec<Task>)> {
        let mut profile: FilterProfile = self
            .store
            .get(FILTER_PROFILES, name)?
            .ok_or_else(|| ServiceError::not_found("filter profile", name))?;

        let tasks = self.list_tasks(&profile.filters)?;
        profile.use_count += 1;
        self.store.put(FILTER_PROFILES, name, &profile)?;
        Ok((profile, tasks))
    }

    pub fn list_filter_profiles(&self) -> ServiceResult<Vec<FilterProfile>> {
        let mut profiles: Vec<FilterProfile> = self.store.scan(FILTER_PROFILES, "")?;
        profiles.sort_by(|a, b| b.use_count.cmp(&a.use_count).then_with(|| a.name.cmp(&b.name)));
        Ok(profiles)
    }

    pub fn delete_filter_profile(&self, name: &str) -> ServiceResult<()> {
        if !self.store.remove(FILTER_PROFILES, name)? {
            return Err(ServiceError::not_found("filter profile", name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{service, task};
    use crate::types::Priority;
    use crate::service::TaskUpdate;

    #[test]
    fn test_profile_lifecycle() {
        let (_dir, service) = service();
        let urgent = task(&service, "Urgent");
        task(&service, "Later");
        service
            .update_task(
                &urgent.id,
                TaskUpdate {
                    priority: Some(Priority::High),
                    ..Default::default()
                },
            )
            .unwrap();

        let filters = TaskFilter {
            priority: Some(Priority::High),
            ..Default::default()
        };
        service.save_filter_profile("hot", "high priority", filters).unwrap();

        let (profile, tasks) = service.load_filter_profile("hot").unwrap();
        assert_eq!(profile.use_count, 1);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, urgent.id);

        assert_eq!(service.list_filter_profiles().unwrap().len(), 1);
        service.delete_filter_profile("hot").unwrap();
        assert!(service.load_filter_profile("hot").is_err());
        assert!(service.delete_filter_profile("hot").is_err());
    }
}

use std::collections::BTreeMap;

use super::tasks::{parse_due_date, split_tags};
use super::{NewTask, TaskService};
use crate::error::{ServiceError, ServiceResult};
use crate::types::{FieldKind, Priority, Task, Template};

impl TaskService {
    /// Active templates, optionally limited to one category.
    pub fn list_templates(&self, category: Option<&str>) -> ServiceResult<Vec<Template>> {
        let mut templates: Vec<Template> = self
            .store
            .templates()?
            .into_iter()
            .filter(|t| t.active)
            .filter(|t| category.map_or(true, |c| t.category.eq_ignore_ascii_case(c)))
            .collect();
        templates.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        Ok(templates)
    }

    pub fn get_template(&self, id_or_alias: &str) -> ServiceResult<Template> {
        self.store
            .templates()?
            .into_iter()
            .find(|t| t.matches(id_or_alias))
            .ok_or_else(|| ServiceError::not_found("template", id_or_alias))
    }

    /// Instantiate a template with the caller's field values.
    pub fn create_from_template(
        &self,
        id_or_alias: &str,
        values: &BTreeMap<String, String>,
    ) -> ServiceResult<(Template, Task)> {
        let template = self.get_template(id_or_alias)?;
        let values = resolve_values(&template, values)?;

        let title = render(&template.title_template, &values);
        let description = render(&template.body_template, &values);

        let priority = match values.get("priority").or_else(|| values.get("oncelik")) {
            Some(p) => p.parse::<Priority>().map_err(ServiceError::invalid)?,
            None => Priority::default(),
        };
        let due_date = match values.get("due_date").or_else(|| values.get("son_tarih")) {
            Some(d) if !d.trim().is_empty() => Some(parse_due_date(d)?),
            _ => None,
        };
        let tags = values.get("tags").map(|t| split_tags(t)).unwrap_or_default();
        let project_id = match values.get("proje_id").filter(|p| !p.is_empty()) {
            Some(p) => Some(p.clone()),
            None => self.active_project_id()?,
        };

        let task = self.create_task(NewTask {
            title,
            description,
            priority,
            project_id,
            parent_id: None,
            due_date,
            tags,
        })?;
        Ok((template, task))
    }
}

/// Check required and select fields, then fill in defaults.
fn resolve_values(
    template: &Template,
    values: &BTreeMap<String, String>,
) -> ServiceResult<BTreeMap<String, String>> {
    let missing: Vec<&str> = template
        .fields
        .iter()
        .filter(|f| f.required && f.default.is_none())
        .filter(|f| values.get(&f.name).map_or(true, |v| v.trim().is_empty()))
        .map(|f| f.name.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(ServiceError::invalid(format!(
            "missing required template fields: {}",
            missing.join(", ")
        )));
    }

    let mut resolved = values.clone();
    for field in &template.fields {
        match resolved.get(&field.name) {
            Some(value) if !value.trim().is_empty() => {
                if field.kind == FieldKind::Select && !field.options.iter().any(|o| o == value) {
                    return Err(ServiceError::invalid(format!(
                        "invalid value '{}' for field '{}' (expected one of: {})",
                        value,
                        field.name,
                        field.options.join(", ")
                    )));
                }
            }
            _ => {
                if let Some(default) = &field.default {
                    resolved.insert(field.name.clone(), default.clone());
                }
            }
        }
    }
    Ok(resolved)
}

/// Replace every `{{name}}` placeholder; unknown names render empty.
fn render(pattern: &str, values: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                if let Some(value) = values.get(name) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::service;

    fn bug_values() -> BTreeMap<String, String> {
        [
            ("title", "Login fails"),
            ("description", "Button does nothing"),
            ("module", "auth"),
            ("environment", "production"),
            ("steps", "1. click login"),
            ("expected", "logged in"),
            ("actual", "nothing"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_render_placeholders() {
        let mut values = BTreeMap::new();
        values.insert("a".to_string(), "1".to_string());
        assert_eq!(render("x {{a}} {{ b }} {{a", &values), "x 1  {{a");
    }

    #[test]
    fn test_create_from_bug_template() {
        let (_dir, service) = service();
        let (template, task) = service.create_from_template("bug", &bug_values()).unwrap();

        assert_eq!(template.alias.as_deref(), Some("bug"));
        assert_eq!(task.title, "🐛 [auth] Login fails");
        assert!(task.description.contains("1. click login"));
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.tags, vec!["bug".to_string()]);
    }

    #[test]
    fn test_missing_and_invalid_fields() {
        let (_dir, service) = service();

        let mut values = bug_values();
        values.remove("module");
        values.remove("steps");
        match service.create_from_template("bug", &values) {
            Err(ServiceError::InvalidInput(msg)) => {
                assert!(msg.contains("module"));
                assert!(msg.contains("steps"));
            }
            other => panic!("unexpected result: {:?}", other.map(|(_, t)| t)),
        }

        let mut values = bug_values();
        values.insert("environment".to_string(), "moon".to_string());
        assert!(matches!(
            service.create_from_template("bug", &values),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_list_templates_by_category() {
        let (_dir, service) = service();
        let all = service.list_templates(None).unwrap();
        assert!(all.len() >= 4);
        let technical = service.list_templates(Some("Teknik")).unwrap();
        assert!(technical.iter().all(|t| t.category == "Teknik"));
        assert!(service.get_template("nope").is_err());
    }
}

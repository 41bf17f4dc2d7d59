use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "beklemede")]
    Pending,
    #[serde(rename = "devam_ediyor")]
    InProgress,
    #[serde(rename = "tamamlandi")]
    Completed,
    #[serde(rename = "iptal")]
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "beklemede",
            Self::InProgress => "devam_ediyor",
            Self::Completed => "tamamlandi",
            Self::Cancelled => "iptal",
        }
    }

    /// Finished tasks no longer block dependents or parents.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "beklemede" | "pending" => Ok(Self::Pending),
            "devam_ediyor" | "in_progress" => Ok(Self::InProgress),
            "tamamlandi" | "completed" => Ok(Self::Completed),
            "iptal" | "cancelled" => Ok(Self::Cancelled),
            other => Err(format!(
                "invalid status '{}' (expected one of: beklemede, devam_ediyor, tamamlandi, iptal)",
                other
            )),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "dusuk")]
    Low,
    #[serde(rename = "orta")]
    Medium,
    #[serde(rename = "yuksek")]
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "dusuk",
            Self::Medium => "orta",
            Self::High => "yuksek",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dusuk" | "low" => Ok(Self::Low),
            "orta" | "medium" => Ok(Self::Medium),
            "yuksek" | "high" => Ok(Self::High),
            other => Err(format!(
                "invalid priority '{}' (expected one of: dusuk, orta, yuksek)",
                other
            )),
        }
    }
}

/// A unit of work tracked in a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "baslik")]
    pub title: String,
    #[serde(rename = "aciklama", default)]
    pub description: String,
    #[serde(rename = "durum")]
    pub status: TaskStatus,
    #[serde(rename = "oncelik")]
    pub priority: Priority,
    #[serde(rename = "proje_id", default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(rename = "son_tarih", default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "etiketler", default)]
    pub tags: Vec<String>,
    #[serde(rename = "olusturma_tarih")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "guncelleme_tarih")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Pending,
            priority: Priority::Medium,
            project_id: None,
            parent_id: None,
            due_date: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

/// Task enriched with relationship counters for detail views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    #[serde(rename = "alt_gorevler", default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Task>,
    #[serde(rename = "bagimliliklar", default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(rename = "tamamlanmamis_bagimlilik_sayisi")]
    pub open_dependency_count: usize,
    #[serde(rename = "bu_goreve_bagimli_sayisi")]
    pub dependent_count: usize,
}

/// A group of tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(rename = "isim")]
    pub name: String,
    #[serde(rename = "tanim", default)]
    pub description: String,
    #[serde(rename = "olusturma_tarih")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "guncelleme_tarih")]
    pub updated_at: DateTime<Utc>,
}

/// Project row as listed to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectOverview {
    #[serde(flatten)]
    pub project: Project,
    #[serde(rename = "gorev_sayisi")]
    pub task_count: usize,
    pub is_active: bool,
}

/// Directed edge between two tasks: `target_id` waits for `source_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "kaynak_id")]
    pub source_id: String,
    #[serde(rename = "hedef_id")]
    pub target_id: String,
    #[serde(rename = "baglanti_tipi")]
    pub kind: String,
}

/// Aggregated counts for a workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "toplam_proje")]
    pub total_projects: usize,
    #[serde(rename = "toplam_gorev")]
    pub total_tasks: usize,
    #[serde(rename = "beklemede_gorev")]
    pub pending: usize,
    #[serde(rename = "devam_eden_gorev")]
    pub in_progress: usize,
    #[serde(rename = "tamamlanan_gorev")]
    pub completed: usize,
    #[serde(rename = "iptal_gorev")]
    pub cancelled: usize,
    #[serde(rename = "yuksek_oncelik")]
    pub high_priority: usize,
    #[serde(rename = "orta_oncelik")]
    pub medium_priority: usize,
    #[serde(rename = "dusuk_oncelik")]
    pub low_priority: usize,
    #[serde(rename = "geciken_gorev")]
    pub overdue: usize,
}

/// Kind of a template field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Select,
    Date,
    Number,
}

/// A placeholder filled in when a template is instantiated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateField {
    #[serde(rename = "isim")]
    pub name: String,
    #[serde(rename = "tip")]
    pub kind: FieldKind,
    #[serde(rename = "zorunlu", default)]
    pub required: bool,
    #[serde(rename = "varsayilan", default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(rename = "secenekler", default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Task blueprint used by `templateden_gorev_olustur`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(rename = "isim")]
    pub name: String,
    #[serde(rename = "tanim", default)]
    pub description: String,
    #[serde(rename = "varsayilan_baslik")]
    pub title_template: String,
    #[serde(rename = "aciklama_template")]
    pub body_template: String,
    #[serde(rename = "alanlar", default)]
    pub fields: Vec<TemplateField>,
    #[serde(rename = "ornek_degerler", default)]
    pub sample_values: BTreeMap<String, String>,
    #[serde(rename = "kategori")]
    pub category: String,
    #[serde(rename = "aktif", default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Template {
    pub fn matches(&self, id_or_alias: &str) -> bool {
        self.id == id_or_alias || self.alias.as_deref() == Some(id_or_alias)
    }

    pub fn field(&self, name: &str) -> Option<&TemplateField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Progress statistics around one task in the tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHierarchy {
    #[serde(rename = "gorev")]
    pub task: Task,
    /// Ancestors from the direct parent up to the root
    #[serde(rename = "ust_gorevler")]
    pub ancestors: Vec<Task>,
    #[serde(rename = "alt_gorevler")]
    pub children: Vec<Task>,
    #[serde(rename = "toplam_alt_gorev")]
    pub total_descendants: usize,
    #[serde(rename = "tamamlanan_alt")]
    pub completed_descendants: usize,
    #[serde(rename = "devam_eden_alt")]
    pub in_progress_descendants: usize,
    #[serde(rename = "beklemede_alt")]
    pub pending_descendants: usize,
    #[serde(rename = "ilerleme_yuzdesi")]
    pub progress_percent: f64,
}

/// Sort order for task listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    CreatedAsc,
    CreatedDesc,
    DueAsc,
    DueDesc,
    Priority,
}

impl FromStr for TaskSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "olusturma_artan" | "created_asc" => Ok(Self::CreatedAsc),
            "olusturma_azalan" | "created_desc" => Ok(Self::CreatedDesc),
            "son_tarih_artan" | "due_asc" => Ok(Self::DueAsc),
            "son_tarih_azalan" | "due_desc" => Ok(Self::DueDesc),
            "oncelik" | "priority" => Ok(Self::Priority),
            other => Err(format!("invalid sort order '{}'", other)),
        }
    }
}

/// Filters accepted by task listings and saved in filter profiles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(rename = "durum", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(rename = "oncelik", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(rename = "proje_id", default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(rename = "etiket", default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(rename = "tum_projeler", default)]
    pub all_projects: bool,
    #[serde(rename = "sirala", default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<TaskSort>,
    /// `acil` keeps tasks due within a week, `gecmis` keeps overdue tasks
    #[serde(rename = "filtre", default, skip_serializing_if = "Option::is_none")]
    pub due_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// Named, reusable task filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterProfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub filters: TaskFilter,
    pub created_at: DateTime<Utc>,
    pub use_count: u32,
}

/// File path associated with a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileWatch {
    pub task_id: String,
    pub path: String,
    pub added_at: DateTime<Utc>,
}

/// What happened to a task, used by the AI context views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Viewed,
    Created,
    Updated,
    SetActive,
    FileChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub task_id: String,
    pub kind: InteractionKind,
    pub at: DateTime<Utc>,
}

/// A search that was executed, kept for `gorev_search mode=history`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub query: String,
    pub mode: String,
    pub result_count: usize,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"devam_ediyor\"");
        assert_eq!("tamamlandi".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert_eq!("completed".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_task_serializes_with_wire_names() {
        let mut task = Task::new("Fix login");
        task.tags = vec!["bug".to_string()];
        let value = serde_json::to_value(&task).unwrap();

        assert_eq!(value["baslik"], "Fix login");
        assert_eq!(value["durum"], "beklemede");
        assert_eq!(value["oncelik"], "orta");
        assert_eq!(value["etiketler"][0], "bug");
        assert!(value.get("proje_id").is_none());
    }

    #[test]
    fn test_template_matches_alias() {
        let template = Template {
            id: "tpl-1".to_string(),
            alias: Some("bug".to_string()),
            name: "Bug".to_string(),
            description: String::new(),
            title_template: "{{title}}".to_string(),
            body_template: String::new(),
            fields: vec![],
            sample_values: BTreeMap::new(),
            category: "Teknik".to_string(),
            active: true,
        };

        assert!(template.matches("bug"));
        assert!(template.matches("tpl-1"));
        assert!(!template.matches("feature"));
    }
}

//! Language selection and the user-facing strings of tool responses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Tr,
    En,
}

impl Lang {
    /// Reads `GOREV_LANG`; anything unrecognised falls back to Turkish.
    pub fn from_env() -> Self {
        std::env::var("GOREV_LANG")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Tr => "tr",
            Self::En => "en",
        }
    }
}

impl Default for Lang {
    fn default() -> Self {
        Self::Tr
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tr" | "tr_tr" | "tr-tr" => Ok(Self::Tr),
            "en" | "en_us" | "en-us" | "en_gb" => Ok(Self::En),
            other => Err(format!("unsupported language '{}' (expected tr or en)", other)),
        }
    }
}

/// Process-wide language switch shared by every workspace service
#[derive(Debug)]
pub struct LanguageSetting(AtomicU8);

impl LanguageSetting {
    pub fn new(lang: Lang) -> Self {
        Self(AtomicU8::new(lang as u8))
    }

    pub fn get(&self) -> Lang {
        match self.0.load(Ordering::Relaxed) {
            1 => Lang::En,
            _ => Lang::Tr,
        }
    }

    pub fn set(&self, lang: Lang) {
        self.0.store(lang as u8, Ordering::Relaxed);
    }
}

impl Default for LanguageSetting {
    fn default() -> Self {
        Self::new(Lang::from_env())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    TaskCreated,
    TaskUpdated,
    TaskEdited,
    TaskDeleted,
    SubtaskCreated,
    TaskMovedToRoot,
    TaskMovedToParent,
    TemplateTaskCreated,
    ProjectCreated,
    ActiveProjectSet,
    ActiveProjectCleared,
    NoActiveProject,
    DependencyAdded,
    NoTasks,
    NoProjects,
    NoTemplates,
    Tasks,
    Projects,
    Templates,
    Summary,
    Hierarchy,
    Title,
    Status,
    Priority,
    Project,
    Details,
    Subtasks,
    Dependencies,
    NoResults,
    ActiveTaskSet,
    NoActiveTask,
    RecentTasks,
    Suggestions,
    NoSuggestions,
    ImportCompleted,
    BulkCompleted,
    ProfileSaved,
    ProfileDeleted,
    WatchAdded,
    WatchRemoved,
    ConfirmationRequired,
}

impl Msg {
    pub fn text(self, lang: Lang) -> &'static str {
        use Msg::*;
        match (lang, self) {
            (Lang::Tr, TaskCreated) => "✓ Görev oluşturuldu",
            (Lang::En, TaskCreated) => "✓ Task created",
            (Lang::Tr, TaskUpdated) => "✓ Görev güncellendi",
            (Lang::En, TaskUpdated) => "✓ Task updated",
            (Lang::Tr, TaskEdited) => "✓ Görev düzenlendi",
            (Lang::En, TaskEdited) => "✓ Task edited",
            (Lang::Tr, TaskDeleted) => "✓ Görev silindi",
            (Lang::En, TaskDeleted) => "✓ Task deleted",
            (Lang::Tr, SubtaskCreated) => "✓ Alt görev oluşturuldu",
            (Lang::En, SubtaskCreated) => "✓ Subtask created",
            (Lang::Tr, TaskMovedToRoot) => "✓ Görev kök seviyeye taşındı",
            (Lang::En, TaskMovedToRoot) => "✓ Task moved to root level",
            (Lang::Tr, TaskMovedToParent) => "✓ Görev yeni üst göreve taşındı",
            (Lang::En, TaskMovedToParent) => "✓ Task moved under new parent",
            (Lang::Tr, TemplateTaskCreated) => "✓ Template kullanılarak görev oluşturuldu!",
            (Lang::En, TemplateTaskCreated) => "✓ Task created from template!",
            (Lang::Tr, ProjectCreated) => "✓ Proje oluşturuldu",
            (Lang::En, ProjectCreated) => "✓ Project created",
            (Lang::Tr, ActiveProjectSet) => "✓ Aktif proje ayarlandı",
            (Lang::En, ActiveProjectSet) => "✓ Active project set",
            (Lang::Tr, ActiveProjectCleared) => "✓ Aktif proje kaldırıldı",
            (Lang::En, ActiveProjectCleared) => "✓ Active project cleared",
            (Lang::Tr, NoActiveProject) => "Aktif proje yok",
            (Lang::En, NoActiveProject) => "No active project",
            (Lang::Tr, DependencyAdded) => "✓ Bağımlılık eklendi",
            (Lang::En, DependencyAdded) => "✓ Dependency added",
            (Lang::Tr, NoTasks) => "Görev bulunamadı.",
            (Lang::En, NoTasks) => "No tasks found.",
            (Lang::Tr, NoProjects) => "Henüz proje yok.",
            (Lang::En, NoProjects) => "No projects yet.",
            (Lang::Tr, NoTemplates) => "Template bulunamadı.",
            (Lang::En, NoTemplates) => "No templates found.",
            (Lang::Tr, Tasks) => "Görevler",
            (Lang::En, Tasks) => "Tasks",
            (Lang::Tr, Projects) => "Projeler",
            (Lang::En, Projects) => "Projects",
            (Lang::Tr, Templates) => "Görev Template'leri",
            (Lang::En, Templates) => "Task Templates",
            (Lang::Tr, Summary) => "Özet Rapor",
            (Lang::En, Summary) => "Summary Report",
            (Lang::Tr, Hierarchy) => "Görev Hiyerarşisi",
            (Lang::En, Hierarchy) => "Task Hierarchy",
            (Lang::Tr, Title) => "Başlık",
            (Lang::En, Title) => "Title",
            (Lang::Tr, Status) => "Durum",
            (Lang::En, Status) => "Status",
            (Lang::Tr, Priority) => "Öncelik",
            (Lang::En, Priority) => "Priority",
            (Lang::Tr, Project) => "Proje",
            (Lang::En, Project) => "Project",
            (Lang::Tr, Details) => "Detaylar için",
            (Lang::En, Details) => "For details",
            (Lang::Tr, Subtasks) => "Alt Görevler",
            (Lang::En, Subtasks) => "Subtasks",
            (Lang::Tr, Dependencies) => "Bağımlılıklar",
            (Lang::En, Dependencies) => "Dependencies",
            (Lang::Tr, NoResults) => "Sonuç bulunamadı.",
            (Lang::En, NoResults) => "No results found.",
            (Lang::Tr, ActiveTaskSet) => "✓ Aktif görev ayarlandı",
            (Lang::En, ActiveTaskSet) => "✓ Active task set",
            (Lang::Tr, NoActiveTask) => "Aktif görev yok",
            (Lang::En, NoActiveTask) => "No active task",
            (Lang::Tr, RecentTasks) => "Son Etkileşilen Görevler",
            (Lang::En, RecentTasks) => "Recently Touched Tasks",
            (Lang::Tr, Suggestions) => "Öneriler",
            (Lang::En, Suggestions) => "Suggestions",
            (Lang::Tr, NoSuggestions) => "Şu an için öneri yok.",
            (Lang::En, NoSuggestions) => "No suggestions right now.",
            (Lang::Tr, ImportCompleted) => "✓ İçe aktarma tamamlandı",
            (Lang::En, ImportCompleted) => "✓ Import completed",
            (Lang::Tr, BulkCompleted) => "✓ Toplu işlem tamamlandı",
            (Lang::En, BulkCompleted) => "✓ Bulk operation completed",
            (Lang::Tr, ProfileSaved) => "✓ Filtre profili kaydedildi",
            (Lang::En, ProfileSaved) => "✓ Filter profile saved",
            (Lang::Tr, ProfileDeleted) => "✓ Filtre profili silindi",
            (Lang::En, ProfileDeleted) => "✓ Filter profile deleted",
            (Lang::Tr, WatchAdded) => "✓ Dosya izlemeye eklendi",
            (Lang::En, WatchAdded) => "✓ File added to watch list",
            (Lang::Tr, WatchRemoved) => "✓ Dosya izlemeden kaldırıldı",
            (Lang::En, WatchRemoved) => "✓ File removed from watch list",
            (Lang::Tr, ConfirmationRequired) => "Görevi silmek için onay: true parametresi gerekli",
            (Lang::En, ConfirmationRequired) => "Deleting a task requires onay: true",
        }
    }
}

pub fn status_label(lang: Lang, status: crate::types::TaskStatus) -> &'static str {
    use crate::types::TaskStatus::*;
    match (lang, status) {
        (Lang::Tr, Pending) => "Beklemede",
        (Lang::Tr, InProgress) => "Devam Ediyor",
        (Lang::Tr, Completed) => "Tamamlandı",
        (Lang::Tr, Cancelled) => "İptal",
        (Lang::En, Pending) => "Pending",
        (Lang::En, InProgress) => "In Progress",
        (Lang::En, Completed) => "Completed",
        (Lang::En, Cancelled) => "Cancelled",
    }
}

pub fn status_emoji(status: crate::types::TaskStatus) -> &'static str {
    use crate::types::TaskStatus::*;
    match status {
        Pending => "⏳",
        InProgress => "🔄",
        Completed => "✅",
        Cancelled => "❌",
    }
}

pub fn priority_emoji(priority: crate::types::Priority) -> &'static str {
    use crate::types::Priority::*;
    match priority {
        High => "🔥",
        Medium => "⚡",
        Low => "ℹ️",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lang() {
        assert_eq!("en".parse::<Lang>().unwrap(), Lang::En);
        assert_eq!("TR".parse::<Lang>().unwrap(), Lang::Tr);
        assert!("de".parse::<Lang>().is_err());
    }

    #[test]
    fn test_language_setting_switches() {
        let setting = LanguageSetting::new(Lang::Tr);
        assert_eq!(setting.get(), Lang::Tr);
        setting.set(Lang::En);
        assert_eq!(setting.get(), Lang::En);
        assert_eq!(Msg::TaskDeleted.text(setting.get()), "✓ Task deleted");
    }
}

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::TaskService;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::{Batch, SEARCH_HISTORY};
use crate::types::{Priority, SearchRecord, Task, TaskStatus};

const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Nlp,
    Advanced,
    History,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nlp => "nlp",
            Self::Advanced => "advanced",
            Self::History => "history",
        }
    }
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nlp" => Ok(Self::Nlp),
            "advanced" => Ok(Self::Advanced),
            "history" => Ok(Self::History),
            other => Err(format!("invalid search mode '{}' (expected nlp, advanced or history)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub task: Task,
    pub score: u32,
}

/// Structured constraints extracted from a query string
#[derive(Debug, Default, PartialEq)]
struct Criteria {
    status: Option<TaskStatus>,
    priority: Option<Priority>,
    tags: Vec<String>,
    project: Option<String>,
    overdue: bool,
    words: Vec<String>,
}

impl Criteria {
    /// Natural-language query: recognise status, priority and `#tag` words in Turkish or English.
    fn from_nlp(query: &str) -> Self {
        let mut criteria = Criteria::default();
        for raw in query.split_whitespace() {
            let word = raw.to_lowercase();
            let word = word.trim_matches(|c: char| c.is_ascii_punctuation() && c != '#');
            match word {
                "beklemede" | "bekleyen" | "pending" | "todo" => {
                    criteria.status = Some(TaskStatus::Pending)
                }
                "devam" | "aktif" | "active" | "ongoing" => {
                    criteria.status = Some(TaskStatus::InProgress)
                }
                "tamamlanan" | "tamamlandi" | "bitti" | "done" | "completed" => {
                    criteria.status = Some(TaskStatus::Completed)
                }
                "iptal" | "cancelled" => criteria.status = Some(TaskStatus::Cancelled),
                "acil" | "yuksek" | "urgent" | "high" | "critical" => {
                    criteria.priority = Some(Priority::High)
                }
                "orta" | "medium" | "normal" => criteria.priority = Some(Priority::Medium),
                "dusuk" | "low" => criteria.priority = Some(Priority::Low),
                "geciken" | "gecikmis" | "overdue" | "late" => criteria.overdue = true,
                tag if tag.starts_with('#') && tag.len() > 1 => {
                    criteria.tags.push(tag[1..].to_string())
                }
                "" => {}
                other => criteria.words.push(other.to_string()),
            }
        }
        criteria
    }

    /// `key:value` tokens; anything else is free text.
    fn from_advanced(query: &str) -> ServiceResult<Self> {
        let mut criteria = Criteria::default();
        for token in query.split_whitespace() {
            match token.split_once(':') {
                Some(("durum", v)) | Some(("status", v)) => {
                    criteria.status = Some(v.parse::<TaskStatus>().map_err(ServiceError::invalid)?)
                }
                Some(("oncelik", v)) | Some(("priority", v)) => {
                    criteria.priority = Some(v.parse::<Priority>().map_err(ServiceError::invalid)?)
                }
                Some(("etiket", v)) | Some(("tag", v)) => criteria.tags.push(v.to_lowercase()),
                Some(("proje", v)) | Some(("project", v)) => criteria.project = Some(v.to_string()),
                Some(("gecikmis", "true")) | Some(("overdue", "true")) => criteria.overdue = true,
                _ => criteria.words.push(token.to_lowercase()),
            }
        }
        Ok(criteria)
    }

    fn score(&self, task: &Task) -> Option<u32> {
        if self.status.map_or(false, |s| s != task.status)
            || self.priority.map_or(false, |p| p != task.priority)
            || self.project.as_deref().map_or(false, |p| task.project_id.as_deref() != Some(p))
        {
            return None;
        }
        let lower_tags: Vec<String> = task.tags.iter().map(|t| t.to_lowercase()).collect();
        if !self.tags.iter().all(|t| lower_tags.contains(t)) {
            return None;
        }
        if self.overdue {
            let today = Utc::now().date_naive();
            if !task.due_date.map_or(false, |d| d < today) || task.status.is_done() {
                return None;
            }
        }

        if self.words.is_empty() {
            return Some(1);
        }
        let title = task.title.to_lowercase();
        let description = task.description.to_lowercase();
        let score: u32 = self
            .words
            .iter()
            .map(|w| {
                let mut s = 0u32;
                if title.contains(w.as_str()) {
                    s += 2;
                }
                if description.contains(w.as_str()) {
                    s += 1;
                }
                s
            })
            .sum();
        (score > 0).then_some(score)
    }
}

impl TaskService {
    /// Search tasks of the whole workspace, best match first.
    pub fn search_tasks(&self, query: &str, mode: SearchMode) -> ServiceResult<Vec<SearchHit>> {
        let criteria = match mode {
            SearchMode::Nlp => Criteria::from_nlp(query),
            SearchMode::Advanced => Criteria::from_advanced(query)?,
            SearchMode::History => {
                return Err(ServiceError::invalid("history mode lists past searches; use search_history"))
            }
        };

        let mut hits: Vec<SearchHit> = self
            .all_tasks()?
            .into_iter()
            .filter_map(|task| criteria.score(&task).map(|score| SearchHit { task, score }))
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.task.priority.cmp(&a.task.priority))
                .then_with(|| b.task.created_at.cmp(&a.task.created_at))
        });

        self.record_search(query, mode, hits.len())?;
        Ok(hits)
    }

    fn record_search(&self, query: &str, mode: SearchMode, result_count: usize) -> ServiceResult<()> {
        let now = Utc::now();
        let record = SearchRecord {
            query: query.to_string(),
            mode: mode.as_str().to_string(),
            result_count,
            at: now,
        };
        let key = format!("{:020}", now.timestamp_nanos_opt().unwrap_or_default());
        let history: Vec<SearchRecord> = self.store.scan(SEARCH_HISTORY, "")?;

        self.store.write(|batch: &Batch<'_>| {
            batch.put(SEARCH_HISTORY, &key, &record)?;
            let excess = (history.len() + 1).saturating_sub(HISTORY_LIMIT);
            for old in history.iter().take(excess) {
                let old_key = format!("{:020}", old.at.timestamp_nanos_opt().unwrap_or_default());
                batch.remove(SEARCH_HISTORY, &old_key)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    /// Past searches, newest first.
    pub fn search_history(&self, limit: usize) -> ServiceResult<Vec<SearchRecord>> {
        let history: Vec<SearchRecord> = self.store.scan(SEARCH_HISTORY, "")?;
        Ok(history.into_iter().rev().take(limit).collect())
    }
}

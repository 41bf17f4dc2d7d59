//! Business façade over one workspace's task store.
//!
//! Every operation is synchronous; redb transactions are short and callers on
//! the async side simply invoke them from the request task.

mod bulk;
mod context;
mod dependencies;
mod hierarchy;
mod intelligent;
mod profiles;
mod projects;
mod search;
mod suggestions;
mod tasks;
mod templates;
mod transfer;
mod watches;

pub use bulk::{BulkFailure, BulkReport, TagMode};
pub use context::ContextSummary;
pub use intelligent::{IntelligentOutcome, IntelligentRequest};
pub use search::{SearchHit, SearchMode};
pub use suggestions::{Suggestion, SuggestionKind};
pub use tasks::{parse_due_date, split_tags, NewTask, TaskUpdate};
pub use transfer::{ConflictPolicy, ExportBundle, ExportOptions, ImportReport};
pub use watches::{resolve_watch_path, FileOp, WatchStats};

use crate::error::ServiceResult;
use crate::i18n::{Lang, LanguageSetting};
use crate::storage::TaskStore;
use std::sync::Arc;

pub struct TaskService {
    store: TaskStore,
    lang: Arc<LanguageSetting>,
}

impl TaskService {
    pub fn new(store: TaskStore, lang: Arc<LanguageSetting>) -> Self {
        Self { store, lang }
    }

    pub fn lang(&self) -> Lang {
        self.lang.get()
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Release the database handle. Only the workspace registry calls this.
    pub fn close(&self) -> ServiceResult<()> {
        Ok(self.store.close()?)
    }

    pub fn is_closed(&self) -> bool {
        self.store.is_closed()
    }
}

use anyhow::{bail, Context, Result};
use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use super::migrations::{self, MigrationSource};
use crate::types::Template;

pub(crate) type Table = TableDefinition<'static, &'static str, &'static [u8]>;

pub(crate) const TASKS: Table = TableDefinition::new("tasks");
pub(crate) const PROJECTS: Table = TableDefinition::new("projects");
pub(crate) const DEPENDENCIES: Table = TableDefinition::new("dependencies");
pub(crate) const TEMPLATES: Table = TableDefinition::new("templates");
pub(crate) const META: Table = TableDefinition::new("meta");
pub(crate) const FILTER_PROFILES: Table = TableDefinition::new("filter_profiles");
pub(crate) const FILE_WATCHES: Table = TableDefinition::new("file_watches");
pub(crate) const INTERACTIONS: Table = TableDefinition::new("interactions");
pub(crate) const SEARCH_HISTORY: Table = TableDefinition::new("search_history");

/// Partition used when a database file belongs to a single workspace
pub const LOCAL_PARTITION: &str = "_";

/// Open (or create) a database file and bring its schema up to date.
pub fn open_database(path: &Path, source: &MigrationSource) -> Result<Arc<Database>> {
    let extra_templates = source.load_templates()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let db = Database::create(path)
        .with_context(|| format!("Failed to open redb database at {}", path.display()))?;

    migrations::apply(&db, &extra_templates)?;

    Ok(Arc::new(db))
}

/// Partitioned view over a task database.
///
/// Every row is stored under `"{partition}/{key}"` so several workspaces can
/// share one file in centralized mode. Templates and schema metadata are
/// global and live outside any partition.
pub struct TaskStore {
    db: RwLock<Option<Arc<Database>>>,
    partition: String,
}

impl TaskStore {
    pub fn new(db: Arc<Database>, partition: impl Into<String>) -> Self {
        Self {
            db: RwLock::new(Some(db)),
            partition: partition.into(),
        }
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    pub fn is_closed(&self) -> bool {
        self.db
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Release this store's database handle. A second call fails.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.db.write().unwrap_or_else(PoisonError::into_inner);
        match guard.take() {
            Some(db) => {
                drop(db);
                Ok(())
            }
            None => bail!("database already closed"),
        }
    }

    fn handle(&self) -> Result<Arc<Database>> {
        self.db
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .context("database is closed")
    }

    fn key(&self, id: &str) -> String {
        format!("{}/{}", self.partition, id)
    }

    pub(crate) fn get<T: DeserializeOwned>(&self, table: Table, id: &str) -> Result<Option<T>> {
        let key = self.key(id);
        self.get_raw(table, &key)
    }

    fn get_raw<T: DeserializeOwned>(&self, table: Table, key: &str) -> Result<Option<T>> {
        let db = self.handle()?;
        let read_txn = db.begin_read().context("Failed to begin read")?;
        let table = read_txn.open_table(table).context("Failed to open table")?;

        match table.get(key).context("Failed to get row")? {
            Some(guard) => {
                let value = serde_json::from_slice(guard.value())
                    .with_context(|| format!("Failed to deserialize row {}", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// List rows of this partition whose key starts with `prefix`.
    ///
    /// `prefix` is either empty or ends with `/`.
    pub(crate) fn scan<T: DeserializeOwned>(&self, table: Table, prefix: &str) -> Result<Vec<T>> {
        debug_assert!(prefix.is_empty() || prefix.ends_with('/'));
        let start = self.key(prefix);
        let end = format!("{}0", &start[..start.len() - 1]);

        let db = self.handle()?;
        let read_txn = db.begin_read().context("Failed to begin read")?;
        let table = read_txn.open_table(table).context("Failed to open table")?;

        let mut rows = Vec::new();
        for item in table
            .range(start.as_str()..end.as_str())
            .context("Failed to scan table")?
        {
            let (_key, value) = item.context("Failed to read row")?;
            rows.push(serde_json::from_slice(value.value()).context("Failed to deserialize row")?);
        }
        Ok(rows)
    }

    pub(crate) fn scan_global<T: DeserializeOwned>(&self, table: Table) -> Result<Vec<T>> {
        let db = self.handle()?;
        let read_txn = db.begin_read().context("Failed to begin read")?;
        let table = read_txn.open_table(table).context("Failed to open table")?;

        let mut rows = Vec::new();
        for item in table.iter().context("Failed to iterate table")? {
            let (_key, value) = item.context("Failed to read row")?;
            rows.push(serde_json::from_slice(value.value()).context("Failed to deserialize row")?);
        }
        Ok(rows)
    }

    pub(crate) fn put<T: Serialize>(&self, table: Table, id: &str, value: &T) -> Result<()> {
        self.write(|batch| batch.put(table, id, value))
    }

    pub(crate) fn remove(&self, table: Table, id: &str) -> Result<bool> {
        self.write(|batch| batch.remove(table, id))
    }

    /// Run several mutations in one write transaction.
    pub(crate) fn write<R>(&self, f: impl FnOnce(&Batch<'_>) -> Result<R>) -> Result<R> {
        let db = self.handle()?;
        let write_txn = db.begin_write().context("Failed to begin write")?;
        let result = {
            let batch = Batch {
                txn: &write_txn,
                partition: &self.partition,
            };
            f(&batch)?
        };
        write_txn.commit().context("Failed to commit")?;
        Ok(result)
    }

    pub fn templates(&self) -> Result<Vec<Template>> {
        self.scan_global(TEMPLATES)
    }
}

/// Mutations scoped to one write transaction and one partition
pub(crate) struct Batch<'a> {
    txn: &'a WriteTransaction,
    partition: &'a str,
}

impl Batch<'_> {
    fn key(&self, id: &str) -> String {
        format!("{}/{}", self.partition, id)
    }

    pub(crate) fn put<T: Serialize>(&self, table: Table, id: &str, value: &T) -> Result<()> {
        let key = self.key(id);
        let bytes = serde_json::to_vec(value).context("Failed to serialize row")?;
        let mut table = self.txn.open_table(table).context("Failed to open table")?;
        table
            .insert(key.as_str(), bytes.as_slice())
            .context("Failed to insert row")?;
        Ok(())
    }

    pub(crate) fn remove(&self, table: Table, id: &str) -> Result<bool> {
        let key = self.key(id);
        let mut table = self.txn.open_table(table).context("Failed to open table")?;
        let removed = table.remove(key.as_str()).context("Failed to remove row")?;
        Ok(removed.is_some())
    }
}

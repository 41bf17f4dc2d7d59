use anyhow::{Context, Result};
use redb::{Database, TableHandle, WriteTransaction};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::seeds;
use super::store::{
    Table, DEPENDENCIES, FILE_WATCHES, FILTER_PROFILES, INTERACTIONS, META, PROJECTS,
    SEARCH_HISTORY, TASKS, TEMPLATES,
};
use crate::types::Template;

const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Latest schema version known to this build
pub const SCHEMA_VERSION: u32 = 3;

struct Migration {
    version: u32,
    name: &'static str,
    apply: fn(&WriteTransaction) -> Result<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_core_tables",
        apply: create_core_tables,
    },
    Migration {
        version: 2,
        name: "seed_default_templates",
        apply: seed_default_templates,
    },
    Migration {
        version: 3,
        name: "create_search_history",
        apply: create_search_history,
    },
];

/// Where schema steps and template seeds come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationSource {
    /// Steps compiled into the binary
    Embedded,
    /// Embedded steps plus `*.toml` template seeds from a directory
    Directory(PathBuf),
}

impl MigrationSource {
    /// `$GOREV_ROOT/migrations` when `GOREV_ROOT` is set, embedded otherwise.
    pub fn from_env() -> Self {
        match std::env::var_os("GOREV_ROOT") {
            Some(root) if !root.is_empty() => Self::Directory(PathBuf::from(root).join("migrations")),
            _ => Self::Embedded,
        }
    }

    /// Returns the missing directory when the source cannot be used.
    pub fn missing_path(&self) -> Option<&Path> {
        match self {
            Self::Embedded => None,
            Self::Directory(dir) if dir.is_dir() => None,
            Self::Directory(dir) => Some(dir),
        }
    }

    pub(crate) fn load_templates(&self) -> Result<Vec<Template>> {
        let dir = match self {
            Self::Embedded => return Ok(Vec::new()),
            Self::Directory(dir) => dir,
        };

        let mut templates = Vec::new();
        for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
            let entry = entry.context("Failed to read migrations directory")?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }

            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template seed {}", path.display()))?;
            let template: Template = toml::from_str(&content)
                .with_context(|| format!("Failed to parse template seed {}", path.display()))?;
            templates.push(template);
        }

        tracing::debug!(count = templates.len(), dir = %dir.display(), "Loaded template seeds");
        Ok(templates)
    }
}

/// Apply every step newer than the recorded version, then upsert extra seeds.
pub(crate) fn apply(db: &Database, extra_templates: &[Template]) -> Result<()> {
    let current = current_version(db)?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let write_txn = db.begin_write().context("Failed to begin write transaction")?;
        (migration.apply)(&write_txn)
            .with_context(|| format!("Migration {} ({}) failed", migration.version, migration.name))?;
        {
            let mut meta = write_txn.open_table(META).context("Failed to open meta table")?;
            let version = serde_json::to_vec(&migration.version)?;
            meta.insert(SCHEMA_VERSION_KEY, version.as_slice())
                .context("Failed to record schema version")?;
        }
        write_txn.commit().context("Failed to commit migration")?;

        tracing::info!(version = migration.version, name = migration.name, "Applied migration");
    }

    if !extra_templates.is_empty() {
        let write_txn = db.begin_write().context("Failed to begin write transaction")?;
        insert_templates(&write_txn, extra_templates)?;
        write_txn.commit().context("Failed to commit template seeds")?;
    }

    Ok(())
}

fn current_version(db: &Database) -> Result<u32> {
    let read_txn = db.begin_read().context("Failed to begin read")?;
    let meta = match read_txn.open_table(META) {
        Ok(table) => table,
        Err(redb::TableError::TableDoesNotExist(_)) => return Ok(0),
        Err(e) => return Err(e).context("Failed to open meta table"),
    };

    match meta.get(SCHEMA_VERSION_KEY).context("Failed to read schema version")? {
        Some(value) => Ok(serde_json::from_slice(value.value())?),
        None => Ok(0),
    }
}

fn open_tables(txn: &WriteTransaction, tables: &[Table]) -> Result<()> {
    for table in tables {
        txn.open_table(*table)
            .with_context(|| format!("Failed to create table {}", table.name()))?;
    }
    Ok(())
}

fn create_core_tables(txn: &WriteTransaction) -> Result<()> {
    open_tables(
        txn,
        &[
            TASKS,
            PROJECTS,
            DEPENDENCIES,
            TEMPLATES,
            META,
            FILTER_PROFILES,
            FILE_WATCHES,
            INTERACTIONS,
        ],
    )
}

fn seed_default_templates(txn: &WriteTransaction) -> Result<()> {
    insert_templates(txn, &seeds::default_templates())
}

fn create_search_history(txn: &WriteTransaction) -> Result<()> {
    open_tables(txn, &[SEARCH_HISTORY])
}

fn insert_templates(txn: &WriteTransaction, templates: &[Template]) -> Result<()> {
    let mut table = txn.open_table(TEMPLATES).context("Failed to open templates table")?;
    for template in templates {
        let bytes = serde_json::to_vec(template).context("Failed to serialize template")?;
        table
            .insert(template.id.as_str(), bytes.as_slice())
            .context("Failed to insert template")?;
    }
    Ok(())
}

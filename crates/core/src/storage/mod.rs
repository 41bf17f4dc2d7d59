mod migrations;
mod seeds;
mod store;

pub use migrations::{MigrationSource, SCHEMA_VERSION};
pub use store::{open_database, TaskStore, LOCAL_PARTITION};

pub(crate) use store::{
    Batch, DEPENDENCIES, FILE_WATCHES, FILTER_PROFILES, INTERACTIONS, META, PROJECTS,
    SEARCH_HISTORY, TASKS,
};

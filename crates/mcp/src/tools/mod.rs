//! The closed tool set exposed over MCP.
//!
//! Each tool is a unit struct implementing [`Tool`]; [`ToolRegistry::with_defaults`]
//! wires all of them up.

mod args;
mod bulk;
mod context;
pub mod format;
mod ide;
mod profiles;
mod projects;
mod registry;
mod relations;
mod search;
mod tasks;
mod templates;
mod transfer;
mod watch;

pub use args::Args;
pub use ide::IdeManage;
pub use registry::{
    json_schema_array, json_schema_boolean, json_schema_enum, json_schema_number,
    json_schema_object, json_schema_string, Tool, ToolContext, ToolName, ToolRegistry,
};

use std::path::PathBuf;
use std::sync::Arc;

impl ToolRegistry {
    /// Registry holding every tool. `ide_home` overrides where editors are looked up.
    pub fn with_defaults(ide_home: Option<PathBuf>) -> Self {
        let mut registry = Self::new();
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(tasks::GorevListele),
            Arc::new(tasks::GorevDetay),
            Arc::new(tasks::GorevGuncelle),
            Arc::new(tasks::GorevDuzenle),
            Arc::new(tasks::GorevSil),
            Arc::new(tasks::OzetGoster),
            Arc::new(templates::TemplateListele),
            Arc::new(templates::TemplatedenGorevOlustur),
            Arc::new(projects::ProjeListele),
            Arc::new(projects::ProjeOlustur),
            Arc::new(projects::ProjeGorevleri),
            Arc::new(projects::AktifProje),
            Arc::new(relations::GorevBagimlilikEkle),
            Arc::new(relations::GorevHierarchy),
            Arc::new(bulk::GorevBulk),
            Arc::new(profiles::GorevFilterProfile),
            Arc::new(watch::GorevFileWatch),
            Arc::new(IdeManage::new(ide_home)),
            Arc::new(context::GorevContext),
            Arc::new(context::GorevSuggestions),
            Arc::new(context::GorevIntelligentCreate),
            Arc::new(search::GorevSearch),
            Arc::new(transfer::GorevExport),
            Arc::new(transfer::GorevImport),
        ];
        for tool in tools {
            registry.register(tool);
        }
        registry
    }
}

// Tool trait, the closed tool set and the registry that maps one onto the other

use crate::error::{ToolError, ToolResult};
use crate::protocol::ToolSchema;
use crate::tools::Args;
use gorev_core::{Lang, TaskService, WorkspaceContext};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Every tool the daemon knows. Dispatch never reaches beyond this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolName {
    GorevListele,
    GorevDetay,
    GorevGuncelle,
    GorevDuzenle,
    GorevSil,
    TemplateListele,
    TemplatedenGorevOlustur,
    ProjeListele,
    ProjeOlustur,
    ProjeGorevleri,
    GorevBagimlilikEkle,
    AktifProje,
    GorevHierarchy,
    GorevBulk,
    GorevFilterProfile,
    GorevFileWatch,
    IdeManage,
    GorevContext,
    GorevSearch,
    OzetGoster,
    GorevExport,
    GorevImport,
    GorevSuggestions,
    GorevIntelligentCreate,
}

impl ToolName {
    pub const ALL: [ToolName; 24] = [
        Self::GorevListele,
        Self::GorevDetay,
        Self::GorevGuncelle,
        Self::GorevDuzenle,
        Self::GorevSil,
        Self::TemplateListele,
        Self::TemplatedenGorevOlustur,
        Self::ProjeListele,
        Self::ProjeOlustur,
        Self::ProjeGorevleri,
        Self::GorevBagimlilikEkle,
        Self::AktifProje,
        Self::GorevHierarchy,
        Self::GorevBulk,
        Self::GorevFilterProfile,
        Self::GorevFileWatch,
        Self::IdeManage,
        Self::GorevContext,
        Self::GorevSearch,
        Self::OzetGoster,
        Self::GorevExport,
        Self::GorevImport,
        Self::GorevSuggestions,
        Self::GorevIntelligentCreate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GorevListele => "gorev_listele",
            Self::GorevDetay => "gorev_detay",
            Self::GorevGuncelle => "gorev_guncelle",
            Self::GorevDuzenle => "gorev_duzenle",
            Self::GorevSil => "gorev_sil",
            Self::TemplateListele => "template_listele",
            Self::TemplatedenGorevOlustur => "templateden_gorev_olustur",
            Self::ProjeListele => "proje_listele",
            Self::ProjeOlustur => "proje_olustur",
            Self::ProjeGorevleri => "proje_gorevleri",
            Self::GorevBagimlilikEkle => "gorev_bagimlilik_ekle",
            Self::AktifProje => "aktif_proje",
            Self::GorevHierarchy => "gorev_hierarchy",
            Self::GorevBulk => "gorev_bulk",
            Self::GorevFilterProfile => "gorev_filter_profile",
            Self::GorevFileWatch => "gorev_file_watch",
            Self::IdeManage => "ide_manage",
            Self::GorevContext => "gorev_context",
            Self::GorevSearch => "gorev_search",
            Self::OzetGoster => "ozet_goster",
            Self::GorevExport => "gorev_export",
            Self::GorevImport => "gorev_import",
            Self::GorevSuggestions => "gorev_suggestions",
            Self::GorevIntelligentCreate => "gorev_intelligent_create",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    /// Exact match only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ToolError::Unknown(s.to_string()))
    }
}

/// What a tool gets to work with for one call.
#[derive(Clone, Copy)]
pub struct ToolContext<'a> {
    workspace: Option<&'a WorkspaceContext>,
    lang: Lang,
}

impl<'a> ToolContext<'a> {
    pub fn new(workspace: Option<&'a WorkspaceContext>, lang: Lang) -> Self {
        Self { workspace, lang }
    }

    pub fn workspace(&self) -> ToolResult<&'a WorkspaceContext> {
        self.workspace.ok_or(ToolError::MissingWorkspace)
    }

    pub fn service(&self) -> ToolResult<&'a TaskService> {
        Ok(&self.workspace()?.service)
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }
}

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> ToolName;

    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Run the tool; the returned text becomes the result content.
    async fn execute(&self, ctx: ToolContext<'_>, args: &Args) -> ToolResult<String>;
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: HashMap<ToolName, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn get(&self, name: ToolName) -> Option<Arc<dyn Tool>> {
        self.tools.get(&name).cloned()
    }

    /// Schemas in the canonical tool order.
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        ToolName::ALL
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.schema())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_enum(description: &str, values: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description,
        "enum": values
    })
}

pub fn json_schema_number(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_array(items: serde_json::Value, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_roundtrip() {
        for name in ToolName::ALL {
            assert_eq!(name.as_str().parse::<ToolName>().unwrap(), name);
        }
        assert!("gorev_listele ".parse::<ToolName>().is_err());
        assert!("GOREV_LISTELE".parse::<ToolName>().is_err());
    }

    #[test]
    fn test_context_without_workspace() {
        let ctx = ToolContext::new(None, Lang::En);
        assert!(matches!(ctx.service(), Err(ToolError::MissingWorkspace)));
        assert_eq!(ctx.lang(), Lang::En);
    }
}

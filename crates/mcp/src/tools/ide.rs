// Editor extension management

use crate::error::{ToolError, ToolResult};
use crate::protocol::ToolSchema;
use crate::tools::format::json_block;
use crate::tools::registry::{
    json_schema_enum, json_schema_object, Tool, ToolContext, ToolName,
};
use crate::tools::Args;
use gorev_core::ide::{IdeDetector, IdeKind, EXTENSION_ID};
use serde_json::json;
use std::fmt::Write;
use std::path::PathBuf;

pub struct IdeManage {
    home: Option<PathBuf>,
}

impl IdeManage {
    /// `None` resolves the user's home directory per call.
    pub fn new(home: Option<PathBuf>) -> Self {
        Self { home }
    }

    fn detector(&self) -> ToolResult<IdeDetector> {
        match &self.home {
            Some(home) => Ok(IdeDetector::new(home)),
            None => Ok(IdeDetector::from_home()?),
        }
    }
}

#[async_trait::async_trait]
impl Tool for IdeManage {
    fn name(&self) -> ToolName {
        ToolName::IdeManage
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: "Yüklü editörleri tespit eder ve gorev eklentisinin durumunu yönetir.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "action": json_schema_enum("İşlem", &["detect", "install", "uninstall", "status", "update"]),
                    "ide_type": json_schema_enum("Editör", &["vscode", "cursor", "windsurf", "vscodium", "all"])
                }),
                vec!["action"],
            ),
        }
    }

    async fn execute(&self, _ctx: ToolContext<'_>, args: &Args) -> ToolResult<String> {
        let detector = self.detector()?;
        let only = match args.str("ide_type") {
            None | Some("all") => None,
            Some(kind) => Some(kind.parse::<IdeKind>().map_err(ToolError::InvalidArgument)?),
        };

        match args.required_str("action")? {
            "detect" => {
                let found = detector.detect();
                if found.is_empty() {
                    return Ok("Desteklenen editör bulunamadı.".to_string());
                }
                let mut out = String::new();
                for ide in &found {
                    let _ = writeln!(out, "- {} ({})", ide.name, ide.extensions_path.display());
                }
                Ok(out)
            }
            "status" => Ok(json_block(&detector.status(only))),
            "uninstall" => {
                let kind = only.ok_or_else(|| ToolError::invalid("uninstall needs a single ide_type"))?;
                let removed = detector.uninstall(kind)?;
                Ok(format!("🗑️ {}: {}", kind.display_name(), removed.display()))
            }
            action @ ("install" | "update") => Err(ToolError::invalid(format!(
                "{} is not supported by the daemon; install {} from the editor marketplace",
                action, EXTENSION_ID
            ))),
            other => Err(ToolError::invalid(format!(
                "invalid action '{}' (expected detect, install, uninstall, status or update)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolContext;
    use gorev_core::Lang;
    use serde_json::json;
    use tempfile::TempDir;

    async fn call(tool: &IdeManage, value: serde_json::Value) -> ToolResult<String> {
        let args = Args::from_value(value).unwrap();
        tool.execute(ToolContext::new(None, Lang::Tr), &args).await
    }

    #[tokio::test]
    async fn test_detect_status_and_uninstall() {
        let home = TempDir::new().unwrap();
        let ext = home.path().join(".cursor/extensions/mehmetsenol.gorev-vscode-0.2.0");
        std::fs::create_dir_all(&ext).unwrap();
        let tool = IdeManage::new(Some(home.path().to_path_buf()));

        let detected = call(&tool, json!({"action": "detect"})).await.unwrap();
        assert!(detected.contains("Cursor"));

        let status = call(&tool, json!({"action": "status", "ide_type": "cursor"})).await.unwrap();
        assert!(status.contains("0.2.0"));

        call(&tool, json!({"action": "uninstall", "ide_type": "cursor"})).await.unwrap();
        assert!(!ext.exists());
    }

    #[tokio::test]
    async fn test_install_is_rejected() {
        let home = TempDir::new().unwrap();
        let tool = IdeManage::new(Some(home.path().to_path_buf()));
        assert!(call(&tool, json!({"action": "install"})).await.is_err());
        assert!(call(&tool, json!({"action": "detect", "ide_type": "emacs"})).await.is_err());
    }
}

//! Best-effort detection of editors that can host the gorev extension.
//!
//! Nothing here touches workspace data; failures surface as tool errors only.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Marketplace id of the editor extension
pub const EXTENSION_ID: &str = "mehmetsenol.gorev-vscode";
const EXTENSION_DIR_MARKER: &str = "gorev-vscode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeKind {
    VsCode,
    Cursor,
    Windsurf,
    VsCodium,
}

impl IdeKind {
    pub const ALL: [IdeKind; 4] = [Self::VsCode, Self::Cursor, Self::Windsurf, Self::VsCodium];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::VsCode => "Visual Studio Code",
            Self::Cursor => "Cursor",
            Self::Windsurf => "Windsurf",
            Self::VsCodium => "VSCodium",
        }
    }

    /// Extensions directory relative to the home directory
    fn extensions_dir(&self) -> &'static str {
        match self {
            Self::VsCode => ".vscode/extensions",
            Self::Cursor => ".cursor/extensions",
            Self::Windsurf => ".windsurf/extensions",
            Self::VsCodium => ".vscode-oss/extensions",
        }
    }
}

impl std::str::FromStr for IdeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vscode" | "code" => Ok(Self::VsCode),
            "cursor" => Ok(Self::Cursor),
            "windsurf" => Ok(Self::Windsurf),
            "vscodium" | "codium" => Ok(Self::VsCodium),
            other => Err(format!(
                "unknown IDE '{}' (expected vscode, cursor, windsurf or vscodium)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeInfo {
    #[serde(rename = "type")]
    pub kind: IdeKind,
    pub name: String,
    pub extensions_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionStatus {
    pub ide: IdeInfo,
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

pub struct IdeDetector {
    home: PathBuf,
}

impl IdeDetector {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(Self::new(home))
    }

    /// Editors whose extensions directory exists.
    pub fn detect(&self) -> Vec<IdeInfo> {
        IdeKind::ALL
            .iter()
            .filter_map(|kind| {
                let path = self.home.join(kind.extensions_dir());
                path.is_dir().then(|| IdeInfo {
                    kind: *kind,
                    name: kind.display_name().to_string(),
                    extensions_path: path,
                })
            })
            .collect()
    }

    pub fn status(&self, only: Option<IdeKind>) -> Vec<ExtensionStatus> {
        self.detect()
            .into_iter()
            .filter(|ide| only.map_or(true, |k| k == ide.kind))
            .map(|ide| {
                let found = find_extension(&ide.extensions_path);
                ExtensionStatus {
                    installed: found.is_some(),
                    version: found.as_deref().and_then(extension_version),
                    path: found,
                    ide,
                }
            })
            .collect()
    }

    /// Remove the extension directory from one editor; returns the removed path.
    pub fn uninstall(&self, kind: IdeKind) -> Result<PathBuf> {
        let ide = self
            .detect()
            .into_iter()
            .find(|ide| ide.kind == kind)
            .with_context(|| format!("{} is not installed", kind.display_name()))?;
        let Some(dir) = find_extension(&ide.extensions_path) else {
            bail!("gorev extension is not installed in {}", ide.name);
        };
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to remove {}", dir.display()))?;
        tracing::info!(ide = %ide.name, path = %dir.display(), "Removed editor extension");
        Ok(dir)
    }
}

fn find_extension(extensions: &Path) -> Option<PathBuf> {
    WalkDir::new(extensions)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter(|e| e.file_name().to_string_lossy().contains(EXTENSION_DIR_MARKER))
        .last()
        .map(|e| e.into_path())
}

/// `mehmetsenol.gorev-vscode-0.16.2` -> `0.16.2`
fn extension_version(dir: &Path) -> Option<String> {
    let name = dir.file_name()?.to_string_lossy().into_owned();
    let (_, version) = name.rsplit_once('-')?;
    version
        .chars()
        .next()
        .filter(char::is_ascii_digit)
        .map(|_| version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_detect_and_status() {
        let home = TempDir::new().unwrap();
        let vscode = home.path().join(".vscode/extensions");
        std::fs::create_dir_all(vscode.join("mehmetsenol.gorev-vscode-0.16.2")).unwrap();
        std::fs::create_dir_all(home.path().join(".cursor/extensions")).unwrap();

        let detector = IdeDetector::new(home.path());
        let kinds: Vec<IdeKind> = detector.detect().iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IdeKind::VsCode, IdeKind::Cursor]);

        let status = detector.status(None);
        assert!(status[0].installed);
        assert_eq!(status[0].version.as_deref(), Some("0.16.2"));
        assert!(!status[1].installed);
    }

    #[test]
    fn test_uninstall_removes_directory() {
        let home = TempDir::new().unwrap();
        let ext = home.path().join(".windsurf/extensions/mehmetsenol.gorev-vscode-1.0.0");
        std::fs::create_dir_all(&ext).unwrap();

        let detector = IdeDetector::new(home.path());
        assert_eq!(detector.uninstall(IdeKind::Windsurf).unwrap(), ext);
        assert!(!ext.exists());
        assert!(detector.uninstall(IdeKind::Windsurf).is_err());
        assert!(detector.uninstall(IdeKind::VsCodium).is_err());
    }
}

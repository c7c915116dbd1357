//! Project metadata read from package.json.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// The slice of package.json the dev tooling cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMetadata {
    /// Display name shown in status output
    #[serde(default = "default_name")]
    pub name: String,

    /// Backend URL to proxy API requests to
    #[serde(default)]
    pub proxy: Option<String>,
}

fn default_name() -> String {
    "app".to_string()
}

impl ProjectMetadata {
    /// Load metadata, falling back to defaults when package.json is absent.
    /// A malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                name: default_name(),
                proxy: None,
            });
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_name_and_proxy() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("package.json");
        fs::write(
            &path,
            r#"{"name": "my-app", "proxy": "http://localhost:4000"}"#,
        )
        .unwrap();

        let meta = ProjectMetadata::load(&path).unwrap();

        assert_eq!(meta.name, "my-app");
        assert_eq!(meta.proxy.as_deref(), Some("http://localhost:4000"));
    }

    #[test]
    fn defaults_when_fields_absent() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("package.json");
        fs::write(&path, "{}").unwrap();

        let meta = ProjectMetadata::load(&path).unwrap();

        assert_eq!(meta.name, "app");
        assert!(meta.proxy.is_none());
    }

    #[test]
    fn defaults_when_file_absent() {
        let temp = tempdir().unwrap();
        let meta = ProjectMetadata::load(&temp.path().join("package.json")).unwrap();
        assert_eq!(meta.name, "app");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("package.json");
        fs::write(&path, "{not json").unwrap();

        assert!(ProjectMetadata::load(&path).is_err());
    }
}

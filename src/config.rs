use crate::error::{Result, StoreError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Record store configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// Validate table and column names before building SQL
    #[serde(default)]
    pub strict_identifiers: bool,
}

#[derive(Deserialize)]
struct ConfigFile {
    db: StoreConfig,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            strict_identifiers: false,
        }
    }

    pub fn with_strict_identifiers(mut self, strict: bool) -> Self {
        self.strict_identifiers = strict;
        self
    }

    /// Parse the `[db]` section of a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.db)
    }

    /// Read and parse a TOML config file.
    ///
    /// A relative database path is kept as written; it resolves against the
    /// process working directory when the store is opened.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_db_section() {
        let config = StoreConfig::from_toml_str(
            r#"
            [db]
            path = "data/site.sqlite"
            "#,
        )
        .unwrap();
        assert_eq!(config, StoreConfig::new("data/site.sqlite"));
    }

    #[test]
    fn strict_identifiers_flag() {
        let config = StoreConfig::from_toml_str(
            "[db]\npath = \"x.db\"\nstrict_identifiers = true\n",
        )
        .unwrap();
        assert!(config.strict_identifiers);
    }

    #[test]
    fn missing_section_is_parse_error() {
        let err = StoreConfig::from_toml_str("path = \"x.db\"").unwrap_err();
        assert!(matches!(err, StoreError::ConfigParse(_)));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StoreConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, StoreError::ConfigRead { .. }));
    }
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Environment variable consulted for the table name when the config file has none.
#[cfg(feature = "dynamodb")]
pub const TABLE_NAME_ENV: &str = "TABLE_NAME";

/// Default config file, read only if present.
pub const DEFAULT_CONFIG_FILE: &str = "pasteportal.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub storage: Storage,
    pub limits: Limits,
    /// Attach a random programming joke to response bodies.
    pub banter: bool,
}

impl Config {
    /// Load from an explicit path, or from [`DEFAULT_CONFIG_FILE`] when it exists.
    /// With no file at all every setting takes its default.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Config::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            storage: Storage::default(),
            limits: Limits::default(),
            banter: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub kind: StorageKind,
    #[cfg(feature = "dynamodb")]
    pub dynamodb: DynamoDbStorage,
    pub file: FileStorage,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[cfg(feature = "dynamodb")]
pub struct DynamoDbStorage {
    /// Falls back to `TABLE_NAME`, read on every invocation.
    pub table: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileStorage {
    pub dir: PathBuf,
}

impl Default for FileStorage {
    fn default() -> Self {
        FileStorage {
            dir: PathBuf::from("pastes"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[cfg(feature = "dynamodb")]
    DynamoDb,
    File,
    Memory,
}

impl Default for StorageKind {
    #[cfg(feature = "dynamodb")]
    fn default() -> Self {
        StorageKind::DynamoDb
    }

    #[cfg(not(feature = "dynamodb"))]
    fn default() -> Self {
        StorageKind::Memory
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest accepted paste text, in bytes.
    pub max_paste_size: usize,
    /// Largest HTTP request body accepted by `serve`, in bytes.
    pub max_upload_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_paste_size: 400 * 1024,
            max_upload_size: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.banter);
        assert_eq!(config.limits.max_paste_size, 400 * 1024);
        assert_eq!(config.storage.kind, StorageKind::default());
    }

    #[test]
    fn parses_nested_sections() {
        let config = Config::parse(
            r#"
            port = 8080
            banter = false

            [storage]
            kind = "file"
            file.dir = "/var/lib/pasteportal"

            [limits]
            max_paste_size = 16
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert!(!config.banter);
        assert_eq!(config.storage.kind, StorageKind::File);
        assert_eq!(config.storage.file.dir, PathBuf::from("/var/lib/pasteportal"));
        assert_eq!(config.limits.max_paste_size, 16);
        assert_eq!(config.limits.max_upload_size, 1024 * 1024);
    }

    #[cfg(feature = "dynamodb")]
    #[test]
    fn parses_dynamodb_table() {
        let config = Config::parse(
            r#"
            [storage]
            kind = "dynamodb"
            dynamodb.table = "pasteportal"
            dynamodb.endpoint = "http://localhost:8000"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.kind, StorageKind::DynamoDb);
        assert_eq!(config.storage.dynamodb.table.as_deref(), Some("pasteportal"));
        assert_eq!(config.storage.dynamodb.region, None);
    }

    #[test]
    fn rejects_unknown_storage_kind() {
        assert!(Config::parse("[storage]\nkind = \"postgres\"").is_err());
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("EDP_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else if let Some(global) = Self::load_global()? {
            config.merge_patch(global);
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Resolved path of the SQLite database file.
    pub fn db_path(&self) -> Result<PathBuf> {
        let data_dir = match &self.storage.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .ok_or_else(|| PortalError::Config("data directory not found".to_string()))?
                .join("edp"),
        };
        Ok(data_dir.join(&self.storage.db_file))
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&config_dir.join("edp/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| PortalError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| PortalError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.storage {
            self.storage.merge(patch);
        }
        if let Some(patch) = patch.output {
            self.output.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_string("EDP_DATA_DIR") {
            self.storage.data_dir = Some(value);
        }
        if let Some(value) = env_string("EDP_DB_FILE") {
            self.storage.db_file = value;
        }
        if let Some(value) = env_bool("EDP_COLOR") {
            self.output.color = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the database; platform data dir when unset.
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub db_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_file: "portal.db".to_string(),
        }
    }
}

impl StorageConfig {
    fn merge(&mut self, patch: StoragePatch) {
        if let Some(value) = patch.data_dir {
            self.data_dir = Some(value);
        }
        if let Some(value) = patch.db_file {
            self.db_file = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

impl OutputConfig {
    fn merge(&mut self, patch: OutputPatch) {
        if let Some(value) = patch.color {
            self.color = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub storage: Option<StoragePatch>,
    pub output: Option<OutputPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StoragePatch {
    pub data_dir: Option<String>,
    pub db_file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OutputPatch {
    pub color: Option<bool>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_default_has_sensible_values() {
        let config = Config::default();
        assert!(config.storage.data_dir.is_none());
        assert_eq!(config.storage.db_file, "portal.db");
        assert!(config.output.color);
    }

    #[test]
    fn db_path_honours_explicit_data_dir() {
        let mut config = Config::default();
        config.storage.data_dir = Some("/tmp/edp-test".to_string());
        let path = config.db_path().unwrap();
        assert_eq!(path, PathBuf::from("/tmp/edp-test/portal.db"));
    }

    #[test]
    fn load_patch_nonexistent_file() {
        let result = Config::load_patch(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_patch_valid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[storage]
data_dir = "/srv/edp"
db_file = "catalog.db"
"#,
        )
        .unwrap();

        let patch = Config::load_patch(&path).unwrap().unwrap();
        let storage = patch.storage.unwrap();
        assert_eq!(storage.data_dir.as_deref(), Some("/srv/edp"));
        assert_eq!(storage.db_file.as_deref(), Some("catalog.db"));
    }

    #[test]
    fn load_patch_partial_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[output]
color = false
"#,
        )
        .unwrap();

        let patch = Config::load_patch(&path).unwrap().unwrap();
        assert!(patch.output.is_some());
        assert!(patch.storage.is_none());
    }

    #[test]
    fn load_patch_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml [[[").unwrap();

        let result = Config::load_patch(&path);
        assert!(result.is_err());
    }

    #[test]
    fn merge_patch_updates_only_given_values() {
        let mut config = Config::default();
        config.merge_patch(ConfigPatch {
            storage: Some(StoragePatch {
                data_dir: Some("/data".to_string()),
                db_file: None,
            }),
            output: None,
        });

        assert_eq!(config.storage.data_dir.as_deref(), Some("/data"));
        assert_eq!(config.storage.db_file, "portal.db");
        assert!(config.output.color);
    }

    #[test]
    fn config_load_from_explicit_path() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("custom_config.toml");
        std::fs::write(
            &config_path,
            r#"
[output]
color = false
"#,
        )
        .unwrap();

        let config = Config::load(Some(&config_path)).unwrap();
        assert!(!config.output.color);
    }
}

//! Configuration management for the CLI
//!
//! Configuration is read from the first file found:
//! - `--config` / `BOUNCER_CONFIG`
//! - `.bouncer.{yaml,json,toml}` or `bouncer.{yaml,json,toml}` in the working directory
//! - `<config dir>/bouncer/config.{yaml,json,toml}`
//!
//! Without a file the defaults apply.

use crate::cli::OutputFormat;
use crate::error::{Error, ErrorContext, Result};
use bouncer_core::CallMetadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const CONFIG_EXTENSIONS: [&str; 3] = ["yaml", "json", "toml"];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,

    pub logging: LoggingSettings,

    /// Call metadata sent with every call; `--header` entries replace keys
    pub metadata: BTreeMap<String, MetadataValues>,

    /// File the configuration was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used when `--output` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    /// Use colored output when the terminal supports it
    pub color: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter; the `-v` count decides when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// compact, full or json
    pub format: String,

    /// Also write logs to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// One value or a list of values for a metadata key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValues {
    One(String),
    Many(Vec<String>),
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: None,
            format: "compact".to_string(),
            file: None,
        }
    }
}

impl MetadataValues {
    fn values(&self) -> &[String] {
        match self {
            MetadataValues::One(value) => std::slice::from_ref(value),
            MetadataValues::Many(values) => values,
        }
    }
}

impl Config {
    /// Load configuration from a file, choosing the parser by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        let mut config: Config = match extension(path) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        config.source = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load from an explicit file, else the first default location that exists
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            return Self::from_file(path);
        }

        match Self::default_config_paths().into_iter().find(|p| p.exists()) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Default configuration file paths, in search order
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        for stem in [".bouncer", "bouncer"] {
            for ext in CONFIG_EXTENSIONS {
                paths.push(PathBuf::from(format!("{}.{}", stem, ext)));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let bouncer_dir = config_dir.join("bouncer");
            for ext in CONFIG_EXTENSIONS {
                paths.push(bouncer_dir.join(format!("config.{}", ext)));
            }
        }

        paths
    }

    /// Where `config init` writes when no path is given
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bouncer").join("config.yaml"))
    }

    /// Configured metadata, then `headers` on top
    pub fn call_metadata(&self, headers: &[(String, String)]) -> CallMetadata {
        let mut metadata = CallMetadata::new();
        for (key, values) in &self.metadata {
            for value in values.values() {
                metadata.insert(key, value.clone());
            }
        }

        let mut overrides = CallMetadata::new();
        for (key, value) in headers {
            overrides.insert(key, value.clone());
        }
        metadata.merge(overrides);

        metadata
    }

    /// Serialize in the format matching the file extension
    pub fn to_string_for(&self, path: &Path) -> Result<String> {
        Ok(match extension(path) {
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            _ => serde_json::to_string_pretty(self)?,
        })
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_string_for(path)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bouncer.yaml");
        std::fs::write(
            &path,
            "output:\n  format: json-pretty\nmetadata:\n  x-env: staging\n  x-multi: [a, b]\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.output.format, Some(OutputFormat::JsonPretty));
        assert!(config.output.color);
        assert_eq!(config.logging.format, "compact");
        assert_eq!(config.source.as_deref(), Some(path.as_path()));

        let metadata = config.call_metadata(&[]);
        assert_eq!(metadata.get("x-env").unwrap(), ["staging".to_string()]);
        assert_eq!(metadata.get("x-multi").unwrap().len(), 2);
    }

    #[test]
    fn test_toml_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\nformat = \"json\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_headers_replace_configured_metadata() {
        let mut config = Config::default();
        config.metadata.insert(
            "x-env".to_string(),
            MetadataValues::One("staging".to_string()),
        );
        config.metadata.insert(
            "x-keep".to_string(),
            MetadataValues::One("yes".to_string()),
        );

        let metadata = config.call_metadata(&[
            ("X-Env".to_string(), "prod".to_string()),
            ("x-new".to_string(), "1".to_string()),
        ]);

        assert_eq!(metadata.get("x-env").unwrap(), ["prod".to_string()]);
        assert_eq!(metadata.get("x-keep").unwrap(), ["yes".to_string()]);
        assert_eq!(metadata.len(), 3);
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["config.yaml", "config.json", "config.toml"] {
            let path = temp_dir.path().join("nested").join(name);
            let mut config = Config::default();
            config.output.format = Some(OutputFormat::Yaml);
            config.save(&path).unwrap();

            let mut loaded = Config::from_file(&path).unwrap();
            loaded.source = None;
            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load_with_file(Some(Path::new("/nonexistent/bouncer.yaml"))).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}

// hourtree-config - configuration for the export runner
//
// Supports configuration from multiple sources:
// 1. Environment variables (HOURTREE_* prefix, highest priority)
// 2. Config file path from HOURTREE_CONFIG
// 3. Default config file locations (./hourtree.toml, ./.hourtree.toml)
// 4. Built-in defaults (lowest priority)
//
// The assembly engine itself takes no environment variables; everything
// environment-driven stays in this crate and the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

mod env_overrides;

pub use env_overrides::{EnvSource, ENV_PREFIX};

/// Main runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub export: ExportSection,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// What gets published and under which namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSection {
    /// Top-level directory name of the published tree.
    pub namespace: String,

    /// Category of records this runner publishes.
    pub category: String,

    /// Region allow-list. Empty means every region the store reports.
    #[serde(default)]
    pub regions: Vec<String>,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            namespace: "export".to_string(),
            category: "default".to_string(),
            regions: Vec::new(),
        }
    }
}

/// Storage backend configuration for the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Fs,
            fs: Some(FsConfig::default()),
            s3: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Fs,
    S3,
    /// In-memory sink, for tests and dry runs.
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Fs => write!(f, "fs"),
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    /// Root of the published tree on the local filesystem.
    pub path: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            path: "./out".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl ExportConfig {
    /// Load from discovery locations with env overrides, falling back to
    /// defaults when no file is present.
    pub fn load() -> Result<Self> {
        let mut config = match Self::discover_file()? {
            Some(config) => config,
            None => {
                tracing::debug!("no config file found, using built-in defaults");
                Self::default_config()
            }
        };
        env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file path (CLI --config flag), then apply
    /// env overrides.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: ExportConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
        config.validate()?;
        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            export: ExportSection::default(),
            storage: StorageConfig::default(),
        }
    }

    fn discover_file() -> Result<Option<Self>> {
        if let Ok(path) = env::var("HOURTREE_CONFIG") {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            let config: ExportConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?;
            return Ok(Some(config));
        }

        for path in &["./hourtree.toml", "./.hourtree.toml"] {
            if Path::new(path).exists() {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path))?;
                let config: ExportConfig = toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {}", path))?;
                return Ok(Some(config));
            }
        }

        Ok(None)
    }

    pub fn validate(&self) -> Result<()> {
        validate_path_segment("export.namespace", &self.export.namespace)?;
        validate_path_segment("export.category", &self.export.category)?;
        for region in &self.export.regions {
            validate_path_segment("export.regions", region)?;
        }

        match self.storage.backend {
            StorageBackend::Fs => {
                if self.storage.fs.is_none() {
                    anyhow::bail!("filesystem backend requires a [storage.fs] section");
                }
            }
            StorageBackend::S3 => {
                let s3 = self
                    .storage
                    .s3
                    .as_ref()
                    .context("s3 backend requires a [storage.s3] section")?;
                if s3.bucket.is_empty() {
                    anyhow::bail!("storage.s3.bucket must not be empty");
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }
}

fn validate_path_segment(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        anyhow::bail!("{field} must not be empty");
    }
    if value.contains('/') {
        anyhow::bail!("{field} must not contain '/': got '{value}'");
    }
    Ok(())
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }
}

// Environment variable overrides, highest priority config source.
//
// Keys are prefixed with HOURTREE_; the EnvSource seam keeps the
// override logic testable without touching the process environment.

use crate::{ExportConfig, FsConfig, S3Config, StorageBackend};
use anyhow::Result;

pub const ENV_PREFIX: &str = "HOURTREE_";

/// Source of environment values. `get` receives the key without the
/// prefix.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

pub(crate) fn apply_env_overrides(
    config: &mut ExportConfig,
    env: &dyn EnvSource,
) -> Result<()> {
    if let Some(namespace) = env.get("NAMESPACE") {
        config.export.namespace = namespace;
    }
    if let Some(category) = env.get("CATEGORY") {
        config.export.category = category;
    }
    if let Some(regions) = env.get("REGIONS") {
        config.export.regions = regions
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(backend) = env.get("STORAGE_BACKEND") {
        config.storage.backend = match backend.as_str() {
            "fs" => StorageBackend::Fs,
            "s3" => StorageBackend::S3,
            "memory" => StorageBackend::Memory,
            other => anyhow::bail!(
                "Invalid {}STORAGE_BACKEND '{}': expected fs, s3 or memory",
                ENV_PREFIX,
                other
            ),
        };
    }

    if let Some(path) = env.get("FS_PATH") {
        config
            .storage
            .fs
            .get_or_insert_with(FsConfig::default)
            .path = path;
    }

    if let Some(bucket) = env.get("S3_BUCKET") {
        s3_config(config).bucket = bucket;
    }
    if let Some(region) = env.get("S3_REGION") {
        s3_config(config).region = region;
    }
    if let Some(endpoint) = env.get("S3_ENDPOINT") {
        s3_config(config).endpoint = Some(endpoint);
    }

    Ok(())
}

fn s3_config(config: &mut ExportConfig) -> &mut S3Config {
    config.storage.s3.get_or_insert_with(|| S3Config {
        bucket: String::new(),
        region: "us-east-1".to_string(),
        endpoint: None,
    })
}

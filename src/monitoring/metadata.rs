//! Instance metadata lookup

use crate::monitoring::error::BackendError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Metadata key holding the instance identifier
pub const INSTANCE_ID_KEY: &str = "instance/id";

/// Resolves environment metadata values by key (e.g. `instance/id`).
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn get(&self, key: &str) -> Result<String, BackendError>;
}

/// Reads metadata from environment variables.
///
/// `instance/id` maps to `METADATA_INSTANCE_ID`: the key is upper-cased,
/// `/` and `-` become `_`, and the prefix is prepended.
#[derive(Debug, Clone)]
pub struct EnvMetadataProvider {
    prefix: String,
}

impl EnvMetadataProvider {
    pub fn new() -> Self {
        Self::with_prefix("METADATA_")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn variable_for(&self, key: &str) -> String {
        let suffix: String = key
            .chars()
            .map(|c| match c {
                '/' | '-' | '.' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{}", self.prefix, suffix)
    }
}

impl Default for EnvMetadataProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataProvider for EnvMetadataProvider {
    async fn get(&self, key: &str) -> Result<String, BackendError> {
        let variable = self.variable_for(key);
        match std::env::var(&variable) {
            Ok(value) if !value.is_empty() => Ok(value),
            _ => Err(BackendError::new(format!("{variable} is not set"))),
        }
    }
}

/// Fixed metadata values.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadataProvider {
    values: HashMap<String, String>,
}

impl StaticMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl MetadataProvider for StaticMetadataProvider {
    async fn get(&self, key: &str) -> Result<String, BackendError> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| BackendError::new(format!("no metadata for {key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_mapping() {
        let provider = EnvMetadataProvider::new();
        assert_eq!(provider.variable_for(INSTANCE_ID_KEY), "METADATA_INSTANCE_ID");
        assert_eq!(provider.variable_for("instance/machine-type"), "METADATA_INSTANCE_MACHINE_TYPE");
    }

    #[tokio::test]
    async fn test_env_lookup() {
        let provider = EnvMetadataProvider::with_prefix("GOODPUT_TEST_META_");
        std::env::set_var("GOODPUT_TEST_META_INSTANCE_ID", "1234");

        assert_eq!(provider.get(INSTANCE_ID_KEY).await.unwrap(), "1234");
        assert!(provider.get("instance/zone").await.is_err());
    }

    #[tokio::test]
    async fn test_static_lookup() {
        let provider = StaticMetadataProvider::new().with(INSTANCE_ID_KEY, "vm-1");
        assert_eq!(provider.get(INSTANCE_ID_KEY).await.unwrap(), "vm-1");
        assert!(provider.get("instance/zone").await.is_err());
    }
}

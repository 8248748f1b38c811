//! Configuration management for rax-fs
//!
//! Settings come from an optional `rax-fs` file (any format the `config`
//! crate recognises by extension) and are overridden by `RAX_FS_*`
//! environment variables, with `__` separating nested keys
//! (`RAX_FS_NAMING__MAX_ATTEMPTS=20`).

use config::{Config, ConfigError, Environment, File, FileFormat};
use log::debug;
use serde::Deserialize;
use std::sync::Arc;

use crate::collision::CollisionPolicy;
use crate::entry::Volume;
use crate::naming::{UniqueNaming, is_valid_timestamp_format};
use crate::storage::{MemoryStorage, NativeStorage, SharedStorage};

/// Default configuration file name, without extension.
pub const DEFAULT_CONFIG_NAME: &str = "rax-fs";

/// Which storage provider backs the volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Host file system.
    #[default]
    Native,
    /// Process-local in-memory tree.
    Memory,
}

/// Default collision policies used when the caller names none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct CollisionDefaults {
    pub file: CollisionPolicy,
    pub directory: CollisionPolicy,
}

/// Complete rax-fs configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    pub backend: Backend,
    pub naming: UniqueNaming,
    pub collisions: CollisionDefaults,
}

impl FsConfig {
    /// Load from `rax-fs.*` in the working directory with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_NAME)
    }

    /// Load from the named file (missing files are fine) with environment overrides
    pub fn load_from(name: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(name).required(false))
            .add_source(
                Environment::with_prefix("RAX_FS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::finish(settings)
    }

    /// Parse a TOML document, without environment overrides.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Self::finish(settings)
    }

    fn finish(settings: Config) -> Result<Self, ConfigError> {
        let config: FsConfig = settings.try_deserialize()?;
        config.validate()?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.naming.max_attempts == 0 {
            return Err(ConfigError::Message(
                "naming.max_attempts must be greater than 0".into(),
            ));
        }

        if !is_valid_timestamp_format(&self.naming.timestamp_format) {
            return Err(ConfigError::Message(format!(
                "naming.timestamp_format is not a valid pattern: {:?}",
                self.naming.timestamp_format
            )));
        }

        Ok(())
    }

    /// Build the volume described by this configuration.
    pub fn build_volume(&self) -> Volume {
        let storage: SharedStorage = match self.backend {
            Backend::Native => Arc::new(NativeStorage::new()),
            Backend::Memory => Arc::new(MemoryStorage::new()),
        };
        Volume::new(storage, self.naming.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMESTAMP_FORMAT, NamingStrategy};
    use std::path::Path;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = FsConfig::from_toml_str("").unwrap();
        assert_eq!(config.backend, Backend::Native);
        assert_eq!(config.naming.strategy, NamingStrategy::Integer);
        assert_eq!(config.naming.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.naming.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(config.collisions.file, CollisionPolicy::FailIfExists);
        assert_eq!(config.collisions.directory, CollisionPolicy::FailIfExists);
    }

    #[test]
    fn test_full_document() {
        let config = FsConfig::from_toml_str(
            r#"
            backend = "memory"

            [naming]
            strategy = "timestamp_utc"
            max_attempts = 3
            timestamp_format = "%H%M%S"

            [collisions]
            file = "generate_unique_name"
            directory = "open_if_exists"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.naming.strategy, NamingStrategy::TimestampUtc);
        assert_eq!(config.naming.max_attempts, 3);
        assert_eq!(config.naming.timestamp_format, "%H%M%S");
        assert_eq!(config.collisions.file, CollisionPolicy::GenerateUniqueName);
        assert_eq!(config.collisions.directory, CollisionPolicy::OpenIfExists);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = FsConfig::from_toml_str("[naming]\nmax_attempts = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_bad_timestamp_format_rejected() {
        let err = FsConfig::from_toml_str("[naming]\ntimestamp_format = \"%Q%\"\n").unwrap_err();
        assert!(err.to_string().contains("timestamp_format"));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(FsConfig::from_toml_str("[collisions]\nfile = \"overwrite\"\n").is_err());
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let config = FsConfig::load_from("definitely-not-a-config-file").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_memory_volume() {
        let config = FsConfig {
            backend: Backend::Memory,
            ..FsConfig::default()
        };
        let volume = config.build_volume();
        volume
            .create_directory(Path::new("/d"), config.collisions.directory)
            .unwrap();
        assert!(volume.exists(Path::new("/d")).has_folder());
    }
}

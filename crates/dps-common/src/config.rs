//! Process configuration, loaded from a TOML file the way
//! `gamecore::config::GameConfig` loads `game_config.toml` in the teacher
//! repo: a plain `serde`-derived struct with a `Default` impl, read via
//! `serdeconv::from_toml_file`.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Soft warn threshold for a per-flow assembler buffer (spec §3: 10 MiB).
pub const DEFAULT_ASSEMBLER_WARN_BYTES: usize = 10 * 1024 * 1024;
/// Hard cap for a per-flow assembler buffer (spec §3: 20 MiB).
pub const DEFAULT_ASSEMBLER_MAX_BYTES: usize = 20 * 1024 * 1024;
/// Default aggregator tick interval (spec §4.6).
pub const DEFAULT_UPDATE_DELAY_MS: u64 = 100;
/// Default bounded channel capacity between the capture thread and the
/// dispatcher. The spec allows unbounded; a bounded default keeps memory use
/// predictable under sustained packet loss on the consumer side.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 65536;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub channel_capacity: usize,
    pub update_delay_ms: u64,
    pub assembler_warn_bytes: usize,
    pub assembler_max_bytes: usize,
    /// Optional path to the skill-code catalog JSON document (spec §6).
    /// Absent means `Catalog::empty()` — accepted events with unset
    /// `actor_class` (error kind 7).
    pub skill_catalog_path: Option<String>,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            update_delay_ms: DEFAULT_UPDATE_DELAY_MS,
            assembler_warn_bytes: DEFAULT_ASSEMBLER_WARN_BYTES,
            assembler_max_bytes: DEFAULT_ASSEMBLER_MAX_BYTES,
            skill_catalog_path: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        serdeconv::from_toml_file(path).map_err(ConfigError::Parse)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        serdeconv::to_toml_string(self).map_err(ConfigError::Parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roundtrips_through_toml() {
        let cfg = EngineConfig::default();
        let toml = cfg.to_toml_string().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, toml).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.channel_capacity, cfg.channel_capacity);
        assert_eq!(loaded.update_delay_ms, cfg.update_delay_ms);
        assert_eq!(loaded.assembler_max_bytes, cfg.assembler_max_bytes);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = EngineConfig::load("/nonexistent/path/engine.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

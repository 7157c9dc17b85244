//! Configuration file loading.
//!
//! Reads a [`SimConfig`] from a RON file. Any field left out keeps its
//! default, so a file only needs the values it changes.

use std::fs;
use std::path::Path;

use skirmish_core::config::SimConfig;
use skirmish_core::error::SimError;
use thiserror::Error;

/// Error loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No file at the given path.
    #[error("Config file not found: {0}")]
    NotFound(String),
    /// Failed to read the file.
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },
    /// Failed to parse RON.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    /// Parsed, but rejected by validation.
    #[error("Invalid config {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: SimError,
    },
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<SimConfig, ConfigError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(ConfigError::NotFound(display));
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: display.clone(),
        message: e.to_string(),
    })?;

    let config: SimConfig = ron::from_str(&content).map_err(|e| ConfigError::Parse {
        path: display.clone(),
        message: e.to_string(),
    })?;

    config.validate().map_err(|source| ConfigError::Invalid {
        path: display.clone(),
        source,
    })?;

    tracing::info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Load `path` if given, defaults otherwise.
pub fn resolve_config(path: Option<&Path>) -> Result<SimConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(SimConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_partial_config() {
        let file = write_config("(wave_size: 2, ticks_per_oracle_step: 1)");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.wave_size, 2);
        assert_eq!(config.ticks_per_oracle_step, 1);
        assert_eq!(config.max_health, SimConfig::default().max_health);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_parse_error() {
        let file = write_config("(wave_size: \"six\")");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_invalid_config() {
        let file = write_config("(tick_duration: 0.0)");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Invalid {
                source: SimError::InvalidConfig(_),
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_defaults_without_path() {
        assert_eq!(resolve_config(None).unwrap(), SimConfig::default());
    }
}

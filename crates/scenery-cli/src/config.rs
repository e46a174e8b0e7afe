//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use scenery::config::AppConfig;

use crate::error::CliError;

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Passed with `--config`; must exist.
    Explicit,
    /// `scenery/config.toml` under the working directory.
    Local,
    /// The platform configuration directory.
    System,
}

impl ConfigSource {
    fn name(self) -> &'static str {
        match self {
            ConfigSource::Explicit => "explicit",
            ConfigSource::Local => "local",
            ConfigSource::System => "system",
        }
    }
}

/// Candidate configuration files, highest priority first.
///
/// An explicit path shadows every other location.
fn candidates(explicit_path: Option<&Path>) -> Vec<(ConfigSource, PathBuf)> {
    if let Some(path) = explicit_path {
        return vec![(ConfigSource::Explicit, path.to_path_buf())];
    }

    let mut candidates = vec![(ConfigSource::Local, PathBuf::from("scenery/config.toml"))];
    match ProjectDirs::from("com", "scenery", "scenery") {
        Some(dirs) => candidates.push((ConfigSource::System, dirs.config_dir().join("config.toml"))),
        None => debug!("Could not determine platform-specific config directory"),
    }
    candidates
}

/// Find and load the model configuration for a replay
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (scenery/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, CliError> {
    let explicit_path: Option<&Path> = explicit_path.as_ref().map(|path| path.as_ref());

    for (source, path) in candidates(explicit_path) {
        if source == ConfigSource::Explicit || path.exists() {
            info!(source = source.name(), path = path.display().to_string(); "Loading configuration");
            return load_config_file(&path);
        }
        debug!(source = source.name(), path = path.display().to_string(); "Configuration file not found");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load configuration from a TOML file
fn load_config_file(path: &Path) -> Result<AppConfig, CliError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    debug!(
        history_size = config.history().size(),
        maintain_edge_parent = config.model().maintain_edge_parent();
        "Configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::MissingFile(p)) if p == path));
    }

    #[test]
    fn test_explicit_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[model]\nid_prefix = \"n\"\n\n[history]\nsize = 3\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.model().id_prefix(), "n");
        assert_eq!(config.history().size(), 3);
    }

    #[test]
    fn test_explicit_path_shadows_other_locations() {
        let path = Path::new("custom.toml");
        assert_eq!(
            candidates(Some(path)),
            vec![(ConfigSource::Explicit, path.to_path_buf())]
        );
    }

    #[test]
    fn test_local_location_comes_first() {
        let found = candidates(None);
        assert_eq!(
            found.first(),
            Some(&(ConfigSource::Local, PathBuf::from("scenery/config.toml")))
        );
        assert!(found.iter().skip(1).all(|(source, _)| *source == ConfigSource::System));
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[history]\nsize = \"many\"\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::Parse(_))));
    }
}

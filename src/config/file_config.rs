//! Writing configuration files.
//!
//! # Configuration File Format
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:8000"
//! timeout_seconds = 30
//!
//! [overview]
//! max_attempts = 3
//! base_delay_ms = 5000
//! max_delay_ms = 10000
//!
//! [relay]
//! bind = "127.0.0.1:3000"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use std::path::Path;

use super::Config;

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Refusing to overwrite existing file {0}")]
    Exists(String),
}

/// Write `config` as TOML to `path`, creating parent directories.
///
/// An existing file is only replaced when `overwrite` is set.
pub fn save_config(config: &Config, path: &Path, overwrite: bool) -> Result<(), ConfigFileError> {
    if path.exists() && !overwrite {
        return Err(ConfigFileError::Exists(path.display().to_string()));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }

    let content = config.to_toml()?;
    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))?;

    tracing::info!("Wrote configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.backend.base_url = "http://saved:8000".to_string();
        config.overview.max_attempts = 1;

        save_config(&config, &path, false).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.backend.base_url, "http://saved:8000");
        assert_eq!(loaded.overview.max_attempts, 1);
    }

    #[test]
    fn test_no_silent_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let result = save_config(&Config::default(), &path, false);
        assert!(matches!(result, Err(ConfigFileError::Exists(_))));
        assert!(save_config(&Config::default(), &path, true).is_ok());
    }
}

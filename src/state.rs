use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::AdvisorError;
use crate::types::Config;

/// Get the canonical config file path (~/.dbadvisor/config.json)
pub fn config_path() -> Result<PathBuf, AdvisorError> {
    let home = dirs::home_dir().ok_or(AdvisorError::HomeDirNotFound)?;
    Ok(home.join(".dbadvisor").join("config.json"))
}

/// Load configuration from ~/.dbadvisor/config.json.
///
/// A missing file is not an error: the engine runs on defaults.
pub fn load_config() -> Result<Config, AdvisorError> {
    let path = config_path()?;
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    load_config_from(&path)
}

/// Load configuration from an explicit path. The file must exist.
pub fn load_config_from(path: &Path) -> Result<Config, AdvisorError> {
    if !path.exists() {
        return Err(AdvisorError::ConfigNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| AdvisorError::IoError(format!("Failed to read config: {}", e)))?;

    let config: Config = serde_json::from_str(&content).map_err(|e| {
        AdvisorError::ConfigurationError(format!("Failed to parse {}: {}", path.display(), e))
    })?;

    if !(0.0..=1.0).contains(&config.extraction.fallback_confidence) {
        log::warn!(
            "fallbackConfidence {} is outside [0, 1]; it will be passed through unchanged",
            config.extraction.fallback_confidence
        );
    }

    Ok(config)
}

/// Read the raw advisory text from `path`, or from stdin when `None`.
pub fn read_input(path: Option<&Path>) -> Result<String, AdvisorError> {
    let Some(path) = path else {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| AdvisorError::InputError(format!("stdin: {}", e)))?;
        return Ok(text);
    };

    if !path.exists() {
        return Err(AdvisorError::InputNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path)
        .map_err(|e| AdvisorError::InputError(format!("{}: {}", path.display(), e)))
}

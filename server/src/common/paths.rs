//! Locations under `~/.briefing/`

use std::path::PathBuf;

use briefing_protocol::BASE_DIR;

pub fn briefing_dir() -> Result<PathBuf, String> {
    dirs::home_dir()
        .map(|home| home.join(BASE_DIR))
        .ok_or_else(|| "Could not determine home directory".to_string())
}

/// Default daemon socket, overridable in config. Same path the CLI dials.
pub fn socket_path() -> Result<PathBuf, String> {
    briefing_protocol::default_socket_path().ok_or_else(|| "Could not determine home directory".to_string())
}

pub fn config_path() -> Result<PathBuf, String> {
    Ok(briefing_dir()?.join("config.json"))
}

/// Default home of model artifacts such as the stop-word list
pub fn models_dir() -> Result<PathBuf, String> {
    Ok(briefing_dir()?.join("models"))
}

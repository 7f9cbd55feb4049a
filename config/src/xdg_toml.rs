//! Load `$XDG_CONFIG_HOME/<app>/config.toml`: the `[env]` table and the optional `[swr]` table.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::settings::SwrSettings;
use crate::LoadError;

/// `$XDG_CONFIG_HOME` when set and non-empty, else the platform config dir.
fn config_home() -> Result<PathBuf, LoadError> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => dirs::config_dir()
            .ok_or_else(|| LoadError::XdgPath("no config directory for this platform".into())),
    }
}

fn config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let path = config_home()?.join(app_name).join("config.toml");
    Ok(path.is_file().then_some(path))
}

#[derive(Deserialize, Default)]
pub(crate) struct ConfigFile {
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub swr: SwrSettings,
}

/// Parsed config file. A missing file yields the defaults (empty `[env]`, default `[swr]`).
pub(crate) fn load(app_name: &str) -> Result<ConfigFile, LoadError> {
    let Some(path) = config_path(app_name)? else {
        return Ok(ConfigFile::default());
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    Ok(toml::from_str(&content)?)
}

/// Returns env key-value pairs from the `[env]` section.
pub(crate) fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    Ok(load(app_name)?.env)
}

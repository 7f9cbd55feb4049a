//! Load configuration from XDG `config.toml` and project `.env`, then apply to the process
//! environment with priority: **existing env > .env > XDG**.
//!
//! Typed settings (API base URL, `[swr]` fetch policy) are read through [`Settings::load`].

mod dotenv_file;
mod settings;
#[cfg(feature = "tracing-init")]
mod tracing_init;
mod xdg_toml;

use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

pub use settings::{
    ApiSettings, Settings, SwrSettings, API_PREFIX, API_URL_ENV, DEFAULT_API_HOST,
};
#[cfg(feature = "tracing-init")]
pub use tracing_init::{init_tracing, log_dir, LOG_DIR_ENV};

/// Application name used for the XDG config directory.
pub const APP_NAME: &str = "statboard";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    Dotenv(#[from] dotenv::Error),
}

/// Loads `[env]` from `$XDG_CONFIG_HOME/<app_name>/config.toml` and the optional project `.env`,
/// then sets only the variables that are **not** already set.
///
/// For a key missing from the process environment the `.env` value wins over the XDG one.
/// `override_dir` replaces the current directory as the place to look for `.env`.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv_file::load_env_map(override_dir)?;

    let keys: HashSet<&String> = xdg_map.keys().chain(dotenv_map.keys()).collect();
    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        if let Some(v) = dotenv_map.get(key).or_else(|| xdg_map.get(key)) {
            std::env::set_var(key, v);
        }
    }

    Ok(())
}

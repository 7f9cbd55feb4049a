//! Typed settings: API base URL (from env) and the `[swr]` fetch policy table.

use serde::{Deserialize, Serialize};

use crate::LoadError;

/// Env var holding the API host, e.g. `https://api.example.org`.
pub const API_URL_ENV: &str = "STATBOARD_API_URL";
/// Host used when [`API_URL_ENV`] is unset.
pub const DEFAULT_API_HOST: &str = "http://localhost:8000";
/// Version prefix appended to the host.
pub const API_PREFIX: &str = "/api/v1";

/// Where the JSON API lives. Resolved once at start-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiSettings {
    /// Full base URL including the version prefix, without a trailing slash.
    pub base_url: String,
}

impl ApiSettings {
    /// Builds the base URL from a host: trailing `/` is stripped and [`API_PREFIX`] appended.
    pub fn from_host(host: &str) -> Self {
        Self {
            base_url: format!("{}{}", host.trim_end_matches('/'), API_PREFIX),
        }
    }

    /// Reads [`API_URL_ENV`], falling back to [`DEFAULT_API_HOST`]. Empty values count as unset.
    pub fn from_env() -> Self {
        let host = std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_HOST.to_string());
        Self::from_host(host.trim())
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self::from_host(DEFAULT_API_HOST)
    }
}

/// `[swr]` table of `config.toml`. Every field is optional in the file.
///
/// Defaults favour few requests: the data changes at most daily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwrSettings {
    /// Requests for the same key within this window share one network call.
    pub deduping_interval_ms: u64,
    /// Refetch mounted resources when the host regains focus.
    pub revalidate_on_focus: bool,
    /// Serve a stale cached value immediately and refresh it in the background.
    pub revalidate_if_stale: bool,
    /// Retries after the first failed attempt.
    pub error_retry_count: u32,
    /// Fixed delay between attempts.
    pub error_retry_interval_ms: u64,
    /// Keep showing the previous key's data while a new key loads.
    pub keep_previous_data: bool,
}

impl Default for SwrSettings {
    fn default() -> Self {
        Self {
            deduping_interval_ms: 60_000,
            revalidate_on_focus: false,
            revalidate_if_stale: true,
            error_retry_count: 3,
            error_retry_interval_ms: 5_000,
            keep_previous_data: true,
        }
    }
}

/// Everything the data layer needs at start-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub swr: SwrSettings,
}

impl Settings {
    /// Reads `[swr]` from `$XDG_CONFIG_HOME/<app_name>/config.toml` and the API URL from env.
    ///
    /// Call [`crate::load_and_apply`] first so `.env` and `[env]` values are visible.
    pub fn load(app_name: &str) -> Result<Self, LoadError> {
        let file = crate::xdg_toml::load(app_name)?;
        Ok(Self {
            api: ApiSettings::from_env(),
            swr: file.swr,
        })
    }
}

//! Library side of the `statboard` binary: argument helpers and the subcommand runners.
//!
//! `main.rs` only parses arguments, sets up config and logging, and maps [`CliError`] to an
//! exit code.

use std::path::{Path, PathBuf};

use config::{LoadError, Settings};
use serde_json::{json, Value};
use statboard::{
    DataEndpoint, ExportError, FetchError, Fetcher, RawDataExporter, RequestKey, Resource,
    SwrCache, SwrPolicy,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("invalid parameter `{0}`: expected key=value")]
    InvalidParam(String),
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Export(#[from] ExportError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config: {0}")]
    Config(#[from] LoadError),
}

/// Splits `key=value` pairs. The value may itself contain `=`; the key may not be empty.
pub fn parse_params(raw: &[String]) -> Result<Vec<(String, String)>, CliError> {
    raw.iter()
        .map(|p| match p.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
            _ => Err(CliError::InvalidParam(p.clone())),
        })
        .collect()
}

/// Request key for an API path given on the command line; a leading `/` is added if missing.
pub fn request_key(path: &str, raw_params: &[String]) -> Result<RequestKey, CliError> {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    let key = parse_params(raw_params)?
        .into_iter()
        .fold(RequestKey::new(path), |key, (k, v)| key.param(k, v));
    Ok(key)
}

/// Policy from settings, with an optional retry-count override.
pub fn policy(settings: &Settings, retries: Option<u32>) -> SwrPolicy {
    let mut policy = SwrPolicy::from(&settings.swr);
    if let Some(n) = retries {
        policy.error_retry_count = n;
    }
    policy
}

/// Mounts `key` as a resource on `cache` and waits for it to settle.
pub async fn get(cache: &SwrCache, key: RequestKey) -> Result<Value, CliError> {
    let resource = Resource::<Value>::mount(cache, key);
    let state = resource.settled().await;
    match (state.error, state.data) {
        (Some(e), _) => Err(e.into()),
        (None, Some(data)) => Ok(Value::clone(&data)),
        (None, None) => Err(FetchError::Transport("resource settled without data".into()).into()),
    }
}

pub fn render_json(value: &Value, pretty: bool) -> Result<String, CliError> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

/// Saves the raw payload of `key` under `out_dir`, returning the written path.
pub async fn download(
    fetcher: Fetcher,
    label: &str,
    key: RequestKey,
    out_dir: &Path,
    filename: Option<String>,
) -> Result<PathBuf, CliError> {
    let mut endpoint = DataEndpoint::new(label, key);
    if let Some(name) = filename {
        endpoint = endpoint.with_filename(name);
    }
    Ok(RawDataExporter::new(fetcher).download(&endpoint, out_dir).await?)
}

/// Effective base URL and fetch policy, as printed by `statboard config`.
pub fn effective_config(settings: &Settings) -> Value {
    json!({
        "base_url": settings.api.base_url,
        "swr": settings.swr,
    })
}

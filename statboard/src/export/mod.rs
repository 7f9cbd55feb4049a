//! Raw-data export: fetch an endpoint fresh and save the JSON as a pretty-printed file.
//!
//! Exports bypass the [`crate::swr::SwrCache`]: each download is a user action and always
//! goes to the network.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::FetchError;
use crate::fetcher::{Fetcher, RequestKey};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A downloadable dataset offered on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEndpoint {
    pub label: String,
    pub key: RequestKey,
    pub filename: Option<String>,
}

impl DataEndpoint {
    pub fn new(label: impl Into<String>, key: RequestKey) -> Self {
        Self {
            label: label.into(),
            key,
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Explicit filename, else the label lower-cased with whitespace runs turned into `_`
    /// and a `.json` suffix. Path separators never survive.
    pub fn file_name(&self) -> String {
        let name = match &self.filename {
            Some(f) => f.clone(),
            None => format!(
                "{}.json",
                self.label
                    .to_lowercase()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join("_")
            ),
        };
        name.replace(['/', '\\'], "_")
    }
}

pub struct RawDataExporter {
    fetcher: Fetcher,
}

impl RawDataExporter {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Fetches the endpoint and returns its JSON pretty-printed with two-space indent.
    pub async fn fetch_pretty(&self, endpoint: &DataEndpoint) -> Result<String, ExportError> {
        let value = self.fetcher.fetch_json(&endpoint.key).await?;
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Downloads the endpoint into `dir` and returns the written path.
    pub async fn download(
        &self,
        endpoint: &DataEndpoint,
        dir: &Path,
    ) -> Result<PathBuf, ExportError> {
        let body = self.fetch_pretty(endpoint).await.inspect_err(|e| {
            tracing::warn!(label = %endpoint.label, error = %e, "download failed");
        })?;
        let path = dir.join(endpoint.file_name());
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| ExportError::Write {
                path: path.clone(),
                source,
            })?;
        tracing::info!(label = %endpoint.label, path = %path.display(), "raw data saved");
        Ok(path)
    }
}

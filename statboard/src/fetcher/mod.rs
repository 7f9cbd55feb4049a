//! Fetcher: one GET against the configured API base, JSON out, typed failure otherwise.
//!
//! Retries and caching live above this layer (see [`crate::swr`]); every call here is
//! exactly one request on the [`HttpClient`].

mod request_key;

pub use request_key::RequestKey;

use std::sync::Arc;

use async_trait::async_trait;
use env_config::ApiSettings;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FetchError;

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs GET requests. Abstraction for testing.
///
/// Implementations return `Err` only for transport failures; any response the server
/// produced (including 4xx/5xx) comes back as `Ok`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// Reqwest-based HTTP client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (timeouts, proxies, TLS settings).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

/// GETs JSON resources relative to a fixed base URL.
#[derive(Clone)]
pub struct Fetcher {
    base_url: Arc<str>,
    client: Arc<dyn HttpClient>,
}

impl Fetcher {
    /// Production fetcher: reqwest against the configured base URL.
    pub fn new(api: &ApiSettings) -> Self {
        Self::with_client(api.base_url.clone(), Arc::new(ReqwestHttpClient::new()))
    }

    /// Custom base URL and HTTP client. A trailing `/` on the base is ignored.
    pub fn with_client(base_url: impl Into<String>, client: Arc<dyn HttpClient>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `key`.
    pub fn url_for(&self, key: &RequestKey) -> String {
        format!("{}{}", self.base_url, key)
    }

    /// One GET; non-2xx becomes [`FetchError::Status`], a non-JSON body [`FetchError::Decode`].
    pub async fn fetch_json(&self, key: &RequestKey) -> Result<Value, FetchError> {
        let url = self.url_for(key);
        tracing::debug!(%url, "GET");
        let response = self.client.get(&url).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                status: response.status,
                body: response.body,
            });
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    /// [`Self::fetch_json`] decoded into `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, key: &RequestKey) -> Result<T, FetchError> {
        let value = self.fetch_json(key).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingClient {
        response: Result<HttpResponse, FetchError>,
        urls: Mutex<Vec<String>>,
    }

    impl RecordingClient {
        fn new(response: Result<HttpResponse, FetchError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                urls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpClient for RecordingClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            self.urls.lock().unwrap().push(url.to_string());
            self.response.clone()
        }
    }

    #[tokio::test]
    async fn builds_url_from_base_path_and_present_params() {
        let client = RecordingClient::new(Ok(HttpResponse::ok(r#"{"ok":true}"#)));
        let fetcher = Fetcher::with_client("http://localhost:8000/api/v1/", client.clone());
        let key = RequestKey::new("/debt/")
            .opt_param("days", Some(30))
            .opt_param::<u32>("limit", None);

        let value = fetcher.fetch_json(&key).await.unwrap();

        assert_eq!(value["ok"], Value::Bool(true));
        assert_eq!(
            client.urls.lock().unwrap().as_slice(),
            ["http://localhost:8000/api/v1/debt/?days=30"]
        );
    }

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let client = RecordingClient::new(Ok(HttpResponse::new(404, "not found")));
        let fetcher = Fetcher::with_client("http://api", client);
        let err = fetcher
            .fetch_json(&RequestKey::new("/missing"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                status: 404,
                body: "not found".into()
            }
        );
    }

    #[tokio::test]
    async fn transport_error_passes_through() {
        let client = RecordingClient::new(Err(FetchError::Transport("connection refused".into())));
        let fetcher = Fetcher::with_client("http://api", client.clone());
        let err = fetcher.fetch_json(&RequestKey::new("/x")).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert_eq!(client.urls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_json_is_decode_error() {
        let client = RecordingClient::new(Ok(HttpResponse::ok("<html>")));
        let fetcher = Fetcher::with_client("http://api", client);
        let err = fetcher.fetch_json(&RequestKey::new("/x")).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn typed_fetch_decodes() {
        #[derive(serde::Deserialize)]
        struct Latest {
            total_debt: f64,
        }
        let client = RecordingClient::new(Ok(HttpResponse::ok(
            r#"{"date":"2024-01-02","total_debt":34000000000000.0}"#,
        )));
        let fetcher = Fetcher::with_client("http://api", client);
        let latest: Latest = fetcher.fetch(&RequestKey::new("/debt/latest")).await.unwrap();
        assert_eq!(latest.total_debt, 34_000_000_000_000.0);
    }
}

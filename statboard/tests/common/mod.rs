//! Scripted fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use statboard::{
    FetchError, Fetcher, HttpClient, HttpResponse, ModuleIdentity, ModuleLoadError, ModuleLoader,
    SwrCache, SwrPolicy,
};

/// One scripted HTTP exchange: wait `delay`, then answer.
#[derive(Clone)]
pub struct Step {
    pub delay: Duration,
    pub response: Result<HttpResponse, FetchError>,
}

impl Step {
    pub fn ok(body: &str, delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            response: Ok(HttpResponse::ok(body)),
        }
    }

    pub fn status(status: u16, body: &str, delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            response: Ok(HttpResponse::new(status, body)),
        }
    }

    pub fn transport(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            response: Err(FetchError::Transport("connection refused".into())),
        }
    }
}

/// Answers calls from a script in order; once exhausted, repeats `fallback`.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        })
    }

    /// Always answers `body` after `delay_ms`.
    pub fn always(body: &str, delay_ms: u64) -> Arc<Self> {
        Self::new(Vec::new(), Step::ok(body, delay_ms))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        tokio::time::sleep(step.delay).await;
        step.response
    }
}

pub const BASE_URL: &str = "http://localhost:8000/api/v1";

pub fn cache_with(client: Arc<ScriptedClient>, policy: SwrPolicy) -> SwrCache {
    SwrCache::new(Fetcher::with_client(BASE_URL, client), policy)
}

/// Loader that sleeps, counts imports, and fails the first `failures` of them.
pub struct CountingLoader {
    pub imports: AtomicUsize,
    pub delay: Duration,
    pub failures: usize,
}

impl CountingLoader {
    pub fn new(delay_ms: u64, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            imports: AtomicUsize::new(0),
            delay: Duration::from_millis(delay_ms),
            failures,
        })
    }

    pub fn imports(&self) -> usize {
        self.imports.load(Ordering::SeqCst)
    }
}

/// Stand-in for a heavy module; the id tells instances apart.
#[derive(Debug)]
pub struct FakeToolkit {
    pub id: usize,
}

#[async_trait]
impl ModuleLoader<FakeToolkit> for CountingLoader {
    async fn import(&self, identity: &ModuleIdentity) -> Result<FakeToolkit, ModuleLoadError> {
        let n = self.imports.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if n <= self.failures {
            return Err(ModuleLoadError::new(identity.as_str(), "network error"));
        }
        Ok(FakeToolkit { id: n })
    }
}

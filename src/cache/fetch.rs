use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use super::request::{Request, Response};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    Unreachable(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("request failed: {0}")]
    Other(String),
}

/// Shared online/offline flag, updated by the fetcher and read by the engine.
#[derive(Debug, Clone)]
pub struct OnlineStatus(Arc<AtomicBool>);

impl OnlineStatus {
    pub fn new(online: bool) -> Self {
        Self(Arc::new(AtomicBool::new(online)))
    }

    pub fn is_online(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, online: bool) {
        let was = self.0.swap(online, Ordering::Relaxed);
        if was != online {
            info!(online, "network status changed");
        }
    }
}

impl Default for OnlineStatus {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Network access for the cache worker. HTTP error statuses are responses,
/// not errors; only transport failures are `Err`.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    online: OnlineStatus,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, online: OnlineStatus) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("lebronify/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Other(e.to_string()))?;
        Ok(Self { client, online })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| FetchError::Other(e.to_string()))?;
        let mut builder = self.client.request(method, request.url.clone());
        if let Some(accept) = &request.accept {
            builder = builder.header(reqwest::header::ACCEPT, accept);
        }

        let response = match builder.send() {
            Ok(r) => r,
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    self.online.set(false);
                }
                return Err(classify(e));
            }
        };
        self.online.set(true);

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response.bytes().map_err(classify)?.to_vec();
        debug!(url = %request.url, status, bytes = body.len(), "fetched");

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(e.to_string())
    } else if e.is_connect() {
        FetchError::Unreachable(e.to_string())
    } else {
        FetchError::Other(e.to_string())
    }
}

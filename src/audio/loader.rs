use reqwest::Url;

use crate::cache::{CacheClient, Request, resolve};
use crate::engine::MediaError;

/// Produces the encoded bytes behind a track's source path.
pub trait SourceLoader: Send + Sync {
    fn load(&self, src: &str) -> Result<Vec<u8>, MediaError>;
}

/// Loads sources through the offline cache.
pub struct CachedLoader {
    client: CacheClient,
    origin: Url,
}

impl CachedLoader {
    pub fn new(client: CacheClient, origin: Url) -> Self {
        Self { client, origin }
    }
}

impl SourceLoader for CachedLoader {
    fn load(&self, src: &str) -> Result<Vec<u8>, MediaError> {
        let network = |reason: String| MediaError::Network {
            src: src.to_string(),
            reason,
        };
        let url = resolve(&self.origin, src).map_err(|e| network(e.to_string()))?;
        let response = self
            .client
            .fetch(&Request::get(url))
            .map_err(|e| network(e.to_string()))?;
        if !response.ok() {
            return Err(network(format!("status {}", response.status)));
        }
        if response.body.is_empty() {
            return Err(MediaError::Decode {
                src: src.to_string(),
                reason: "empty body".into(),
            });
        }
        Ok(response.body)
    }
}

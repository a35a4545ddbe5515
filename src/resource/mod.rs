//! The injected fetch capability.
//!
//! Everything this crate reads from a dataset goes through [`ResourceClient`]:
//! whole resources, byte ranges (hierarchy chunks, point payloads) and JSON
//! documents (metadata, enumerated tables). Transport policy - retries,
//! caching, timeouts - belongs to the client implementation, not to this
//! crate.

pub mod ehttp;
pub mod memory;

#[cfg(feature = "fs")]
pub mod file;

#[cfg(feature = "reqwest")]
pub mod reqwest;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: Option<BTreeMap<String, String>>,
    ) -> Result<Vec<u8>, ResourceError>;

    /// Fetch `length` bytes starting at `offset`. The default goes through
    /// `get` with a `Range` header; clients with native range support
    /// (files, object stores) should override it.
    async fn get_range(
        &self,
        url: &str,
        offset: u64,
        length: usize,
        headers: Option<BTreeMap<String, String>>,
    ) -> Result<Vec<u8>, ResourceError> {
        let end = offset
            .checked_add(length as u64)
            .map(|v| v - 1)
            .ok_or_else(|| ResourceError::Other("Range overflow".into()))?;
        let range_value = format!("bytes={}-{}", offset, end);

        let mut all_headers = headers.unwrap_or_default();
        all_headers.insert("Range".to_string(), range_value);

        self.get(url, Some(all_headers)).await
    }

    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        url: &str,
        headers: Option<BTreeMap<String, String>>,
    ) -> Result<T, ResourceError> {
        let bytes = self.get(url, headers).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl<C: ResourceClient> ResourceClient for Arc<C> {
    async fn get(
        &self,
        url: &str,
        headers: Option<BTreeMap<String, String>>,
    ) -> Result<Vec<u8>, ResourceError> {
        (**self).get(url, headers).await
    }

    async fn get_range(
        &self,
        url: &str,
        offset: u64,
        length: usize,
        headers: Option<BTreeMap<String, String>>,
    ) -> Result<Vec<u8>, ResourceError> {
        (**self).get_range(url, offset, length, headers).await
    }

    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        url: &str,
        headers: Option<BTreeMap<String, String>>,
    ) -> Result<T, ResourceError> {
        (**self).get_json(url, headers).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected HTTP status code: {0}")]
    Status(u16),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),

    #[error("Unsupported scheme: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingClient {
        last_headers: Mutex<Option<BTreeMap<String, String>>>,
    }

    #[async_trait]
    impl ResourceClient for RecordingClient {
        async fn get(
            &self,
            _url: &str,
            headers: Option<BTreeMap<String, String>>,
        ) -> Result<Vec<u8>, ResourceError> {
            *self.last_headers.lock().unwrap() = headers;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn default_get_range_sends_inclusive_range_header() {
        let client = RecordingClient {
            last_headers: Mutex::new(None),
        };
        client
            .get_range("http://example/octree.bin", 10, 10, None)
            .await
            .unwrap();
        let headers = client.last_headers.lock().unwrap().clone().unwrap();
        assert_eq!(headers.get("Range").map(String::as_str), Some("bytes=10-19"));
    }
}

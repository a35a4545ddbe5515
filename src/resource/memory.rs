//! In-memory resource client.
//!
//! Serves preloaded byte buffers by URL, with native range support and a
//! fetch counter. Used by tests to assert how many round trips a resolution
//! performs; also handy for fully offline datasets.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ResourceClient, ResourceError};

#[derive(Default)]
pub struct MemoryClient {
    resources: BTreeMap<String, Vec<u8>>,
    fetches: AtomicUsize,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.resources.insert(url.into(), bytes.into());
        self
    }

    /// Number of `get`/`get_range` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn lookup(&self, url: &str) -> Result<&[u8], ResourceError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.resources
            .get(url)
            .map(Vec::as_slice)
            .ok_or_else(|| ResourceError::NotFound(url.to_string()))
    }
}

#[async_trait]
impl ResourceClient for MemoryClient {
    async fn get(
        &self,
        url: &str,
        _headers: Option<BTreeMap<String, String>>,
    ) -> Result<Vec<u8>, ResourceError> {
        Ok(self.lookup(url)?.to_vec())
    }

    async fn get_range(
        &self,
        url: &str,
        offset: u64,
        length: usize,
        _headers: Option<BTreeMap<String, String>>,
    ) -> Result<Vec<u8>, ResourceError> {
        let bytes = self.lookup(url)?;
        let start = usize::try_from(offset)
            .map_err(|_| ResourceError::Other("Range overflow".into()))?;
        let end = start
            .checked_add(length)
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| {
                ResourceError::Other(format!(
                    "range {start}..{} outside resource of {} bytes",
                    start.saturating_add(length),
                    bytes.len()
                ))
            })?;
        Ok(bytes[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_ranges_and_counts_fetches() {
        let client = MemoryClient::new().with("mem://data", vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(client.get_range("mem://data", 2, 3, None).await.unwrap(), vec![2, 3, 4]);
        assert!(client.get_range("mem://data", 4, 3, None).await.is_err());
        assert!(client.get("mem://missing", None).await.is_err());
        assert_eq!(client.fetch_count(), 3);
    }
}

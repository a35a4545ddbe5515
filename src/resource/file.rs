use std::collections::BTreeMap;
use std::io::SeekFrom;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::{ResourceClient, ResourceError};

/// Local-filesystem client for `file://` URLs, with seek-based range reads.
#[derive(Clone)]
pub struct FileClient;

impl FileClient {
    fn path(url: &str) -> Result<&str, ResourceError> {
        url.strip_prefix("file://").ok_or_else(|| {
            ResourceError::Unsupported("This client supports only file:// urls.".to_string())
        })
    }
}

#[async_trait]
impl ResourceClient for FileClient {
    async fn get(
        &self,
        url: &str,
        _headers: Option<BTreeMap<String, String>>,
    ) -> Result<Vec<u8>, ResourceError> {
        Ok(tokio::fs::read(Self::path(url)?).await?)
    }

    async fn get_range(
        &self,
        url: &str,
        offset: u64,
        length: usize,
        _headers: Option<BTreeMap<String, String>>,
    ) -> Result<Vec<u8>, ResourceError> {
        let mut file = tokio::fs::File::open(Self::path(url)?).await?;
        file.seek(SeekFrom::Start(offset)).await?;
        let mut bytes = vec![0; length];
        file.read_exact(&mut bytes).await?;
        Ok(bytes)
    }
}

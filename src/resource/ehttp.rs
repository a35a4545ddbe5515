use std::collections::BTreeMap;

use async_trait::async_trait;
#[cfg(target_arch = "wasm32")]
use ehttp::Mode;

use super::{ResourceClient, ResourceError};

/// Portable HTTP client over `ehttp`, usable on native and wasm targets.
pub struct EhttpClient;

#[async_trait]
impl ResourceClient for EhttpClient {
    async fn get(
        &self,
        url: &str,
        headers: Option<BTreeMap<String, String>>, // `ehttp` has limited headers support
    ) -> Result<Vec<u8>, ResourceError> {
        let (tx, rx) = futures::channel::oneshot::channel();

        let headers = {
            let mut out = ehttp::Headers::default();
            if let Some(hdrs) = headers {
                for (k, v) in hdrs {
                    out.insert(k, v);
                }
            }
            out
        };
        let request = ehttp::Request {
            method: "GET".to_owned(),
            url: url.to_string(),
            body: vec![],
            headers,
            #[cfg(target_arch = "wasm32")]
            mode: Mode::default(),
        };

        ehttp::fetch(request, move |res| {
            let _ = tx.send(res);
        });

        let response = rx
            .await
            .map_err(|_| ResourceError::Network("channel closed".to_string()))?;
        let response = response.map_err(|e| ResourceError::Network(format!("{:?}", e)))?;

        if !(200..300).contains(&response.status) {
            return Err(ResourceError::Status(response.status));
        }

        Ok(response.bytes)
    }
}

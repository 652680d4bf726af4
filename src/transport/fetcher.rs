use super::protocol::PayloadRef;
use crate::error::TransportError;

use serde::de::DeserializeOwned;

/// Receiver side of the transport: downloads a hosted payload, then
/// acknowledges it so the sender can free the slot.
#[derive(Debug, Clone, Default)]
pub struct PayloadFetcher {
    http_client: reqwest::Client,
}

impl PayloadFetcher {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }

    pub async fn fetch(&self, payload: &PayloadRef) -> Result<Vec<u8>, TransportError> {
        tracing::debug!("Downloading payload from {}", payload.url);

        let response = self.http_client.get(&payload.url).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::HttpStatus {
                url: payload.url.clone(),
                status: response.status().as_u16(),
            });
        }
        let bytes = response.bytes().await?.to_vec();

        // A lost acknowledgement only delays the release until the lease expires
        match self.http_client.post(&payload.ack_url).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(
                    "Acknowledgement of payload {} returned HTTP {}",
                    payload.lease,
                    response.status()
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Failed to acknowledge payload {}: {}", payload.lease, e);
            }
        }

        tracing::debug!("Downloaded payload {} ({} bytes)", payload.lease, bytes.len());
        Ok(bytes)
    }

    /// Downloads and decodes a bincode payload.
    pub async fn fetch_value<T: DeserializeOwned>(
        &self,
        payload: &PayloadRef,
    ) -> Result<T, TransportError> {
        let bytes = self.fetch(payload).await?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

use super::lease::LeaseId;
use super::protocol::AckResponse;
use super::proxy::{HostedPayloads, ProxyHandle};

use axum::Json;
use axum::extract::{Extension, Path};
use axum::http::StatusCode;

pub async fn handle_get_payload(
    Path(id): Path<String>,
    Extension(hosted): Extension<HostedPayloads>,
    Extension(proxy): Extension<ProxyHandle>,
) -> (StatusCode, Vec<u8>) {
    let lease = LeaseId(id);

    // Clone the Arc out so the map guard is not held while responding
    let payload = hosted.get(&lease).map(|entry| entry.value().clone());

    match payload {
        Some(bytes) => {
            tracing::debug!("Serving payload {} ({} bytes)", lease, bytes.len());
            if let Err(e) = proxy.fetched(lease.clone()) {
                tracing::debug!("Download of payload {} not recorded: {}", lease, e);
            }
            (StatusCode::OK, bytes.to_vec())
        }
        None => {
            tracing::warn!("Requested payload {} is not hosted", lease);
            (StatusCode::NOT_FOUND, Vec::new())
        }
    }
}

pub async fn handle_ack_payload(
    Path(id): Path<String>,
    Extension(hosted): Extension<HostedPayloads>,
    Extension(proxy): Extension<ProxyHandle>,
) -> (StatusCode, Json<AckResponse>) {
    let lease = LeaseId(id);
    let was_hosted = hosted.contains_key(&lease);

    if let Err(e) = proxy.acknowledge(lease.clone()) {
        tracing::error!("Failed to acknowledge payload {}: {}", lease, e);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(AckResponse {
                lease,
                hosted: was_hosted,
            }),
        );
    }

    (
        StatusCode::OK,
        Json(AckResponse {
            lease,
            hosted: was_hosted,
        }),
    )
}

//! Transport Module Tests
//!
//! ## Test Scopes
//! - **Lease Registry**: Capacity bound, idempotent release, first-download tracking.
//! - **Proxy over HTTP**: Hosting, download, acknowledgement and slot reuse on a loopback server.

#[cfg(test)]
mod tests {
    use crate::config::TransportConfig;
    use crate::error::TransportError;
    use crate::transport::fetcher::PayloadFetcher;
    use crate::transport::lease::{LeaseId, LeaseRegistry};
    use crate::transport::protocol::PayloadRef;
    use crate::transport::proxy::{PayloadProxy, ProxyHandle};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn config(max_in_flight: usize, lease_timeout: Duration) -> TransportConfig {
        TransportConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            max_in_flight,
            lease_timeout,
        }
    }

    /// Hosts `value` and returns a receiver that yields its reference once hosted.
    fn host(proxy: &ProxyHandle, value: &Vec<u32>) -> mpsc::UnboundedReceiver<PayloadRef> {
        let (tx, rx) = mpsc::unbounded_channel();
        proxy
            .host_value(
                value,
                Box::new(move |payload| {
                    let _ = tx.send(payload);
                }),
            )
            .unwrap();
        rx
    }

    async fn hosted_within(
        rx: &mut mpsc::UnboundedReceiver<PayloadRef>,
        wait: Duration,
    ) -> Option<PayloadRef> {
        tokio::time::timeout(wait, rx.recv()).await.ok().flatten()
    }

    // ============================================================
    // LEASE REGISTRY
    // ============================================================

    #[test]
    fn test_registry_respects_capacity() {
        let mut registry = LeaseRegistry::new(2, Duration::from_secs(30));

        let a = registry.try_acquire();
        let b = registry.try_acquire();
        let c = registry.try_acquire();

        assert!(a.is_some());
        assert!(b.is_some());
        assert!(c.is_none(), "third lease must wait for a free slot");
        assert_eq!(registry.in_flight(), 2);
        assert!(!registry.has_capacity());
    }

    #[test]
    fn test_registry_release_is_idempotent() {
        let mut registry = LeaseRegistry::new(1, Duration::from_secs(30));
        let lease = registry.try_acquire().unwrap();

        assert!(registry.release(&lease).is_some());
        assert!(registry.release(&lease).is_none());
        assert!(registry.release(&LeaseId::new()).is_none());

        assert!(registry.has_capacity());
        assert!(registry.try_acquire().is_some());
    }

    #[test]
    fn test_registry_reports_first_download_once() {
        let mut registry = LeaseRegistry::new(3, Duration::from_secs(5));

        let lease = registry.try_acquire().unwrap();

        assert!(registry.mark_fetched(&lease));
        assert!(!registry.mark_fetched(&lease), "second download must not re-arm");
        assert_eq!(registry.capacity(), 3);
        assert_eq!(registry.timeout(), Duration::from_secs(5));

        registry.release(&lease);
        assert!(!registry.mark_fetched(&lease));
        assert!(!registry.mark_fetched(&LeaseId::new()));
    }

    // ============================================================
    // PROXY OVER HTTP
    // ============================================================

    #[tokio::test]
    async fn test_hosted_payload_is_downloaded_and_decoded() {
        // ARRANGE
        let (proxy, addr, task) = PayloadProxy::start(&config(2, Duration::from_secs(30)))
            .await
            .unwrap();
        let value: Vec<u32> = (0..1000).collect();

        // ACT
        let mut hosted = host(&proxy, &value);
        let payload = hosted_within(&mut hosted, Duration::from_secs(2))
            .await
            .expect("payload should be hosted immediately");

        let fetched: Vec<u32> = PayloadFetcher::new().fetch_value(&payload).await.unwrap();

        // ASSERT
        assert_eq!(fetched, value);
        assert!(payload.url.contains(&addr.port().to_string()));

        proxy.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_acknowledgement_frees_slot_for_queued_payload() {
        // ARRANGE: a single slot
        let (proxy, _addr, task) = PayloadProxy::start(&config(1, Duration::from_secs(30)))
            .await
            .unwrap();

        let mut first = host(&proxy, &vec![1, 2, 3]);
        let mut second = host(&proxy, &vec![4, 5, 6]);

        let first_ref = hosted_within(&mut first, Duration::from_secs(2))
            .await
            .expect("first payload hosted");

        // ASSERT: the second payload waits while the slot is taken
        assert!(
            hosted_within(&mut second, Duration::from_millis(200))
                .await
                .is_none()
        );

        // ACT: downloading acknowledges the first payload
        let fetcher = PayloadFetcher::new();
        let values: Vec<u32> = fetcher.fetch_value(&first_ref).await.unwrap();
        assert_eq!(values, vec![1, 2, 3]);

        // ASSERT: the freed slot goes to the queued payload
        let second_ref = hosted_within(&mut second, Duration::from_secs(2))
            .await
            .expect("second payload hosted after acknowledgement");
        let values: Vec<u32> = fetcher.fetch_value(&second_ref).await.unwrap();
        assert_eq!(values, vec![4, 5, 6]);

        proxy.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_downloaded_but_unacknowledged_payload_expires() {
        // ARRANGE
        let (proxy, _addr, task) = PayloadProxy::start(&config(1, Duration::from_millis(100)))
            .await
            .unwrap();

        let mut first = host(&proxy, &vec![1]);
        let first_ref = hosted_within(&mut first, Duration::from_secs(2))
            .await
            .unwrap();
        let mut second = host(&proxy, &vec![2]);

        // ACT: download the first payload without acknowledging it
        let response = reqwest::get(&first_ref.url).await.unwrap();
        assert!(response.status().is_success());
        let second_ref = hosted_within(&mut second, Duration::from_secs(2))
            .await
            .expect("expiry should free the slot");

        // ASSERT: the expired payload is gone
        let result = PayloadFetcher::new().fetch(&first_ref).await;
        assert!(matches!(
            result,
            Err(TransportError::HttpStatus { status: 404, .. })
        ));
        assert_ne!(first_ref.lease, second_ref.lease);

        proxy.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_payload_waiting_for_a_receiver_does_not_expire() {
        // ARRANGE
        let (proxy, _addr, task) = PayloadProxy::start(&config(1, Duration::from_millis(100)))
            .await
            .unwrap();

        let mut first = host(&proxy, &vec![7, 8, 9]);
        let first_ref = hosted_within(&mut first, Duration::from_secs(2))
            .await
            .unwrap();
        let mut second = host(&proxy, &vec![10]);

        // ACT: nobody downloads the first payload for several lease timeouts
        let second_ref = hosted_within(&mut second, Duration::from_millis(400)).await;

        // ASSERT: it still holds its slot and can be downloaded
        assert!(second_ref.is_none(), "slot must stay taken until download");
        let values: Vec<u32> = PayloadFetcher::new().fetch_value(&first_ref).await.unwrap();
        assert_eq!(values, vec![7, 8, 9]);
        assert!(
            hosted_within(&mut second, Duration::from_secs(2))
                .await
                .is_some()
        );

        proxy.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_lease_returns_not_found() {
        let (proxy, addr, task) = PayloadProxy::start(&config(1, Duration::from_secs(30)))
            .await
            .unwrap();

        let bogus = PayloadRef::new(&format!("http://{}", addr), LeaseId::new());
        let result = PayloadFetcher::new().fetch(&bogus).await;

        assert!(matches!(
            result,
            Err(TransportError::HttpStatus { status: 404, .. })
        ));

        proxy.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_host_after_shutdown_fails() {
        let (proxy, _addr, task) = PayloadProxy::start(&config(1, Duration::from_secs(30)))
            .await
            .unwrap();

        proxy.shutdown();
        task.await.unwrap();

        let result = proxy.host(vec![0u8; 4], Box::new(|_| {}));
        assert!(matches!(result, Err(TransportError::ProxyClosed)));
    }
}

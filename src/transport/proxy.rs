use super::handlers::{handle_ack_payload, handle_get_payload};
use super::lease::{LeaseId, LeaseRegistry};
use super::protocol::{ENDPOINT_PAYLOAD, ENDPOINT_PAYLOAD_ACK, PayloadRef};
use crate::config::TransportConfig;
use crate::error::TransportError;

use anyhow::Result;
use axum::routing::{get, post};
use axum::{Extension, Router};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Called once the payload is hosted, with the reference the receiver needs.
pub type Delivery = Box<dyn FnOnce(PayloadRef) + Send>;

/// Payload bytes keyed by lease, shared with the HTTP handlers.
pub type HostedPayloads = Arc<DashMap<LeaseId, Arc<Vec<u8>>>>;

pub enum ProxyMessage {
    Host { bytes: Vec<u8>, deliver: Delivery },
    Fetched(LeaseId),
    Acknowledged(LeaseId),
    Expired(LeaseId),
    Shutdown,
}

#[derive(Clone)]
pub struct ProxyHandle {
    tx: mpsc::UnboundedSender<ProxyMessage>,
}

impl ProxyHandle {
    /// Queues raw bytes for hosting.
    pub fn host(&self, bytes: Vec<u8>, deliver: Delivery) -> Result<(), TransportError> {
        self.tx
            .send(ProxyMessage::Host { bytes, deliver })
            .map_err(|_| TransportError::ProxyClosed)
    }

    /// Serializes `value` with bincode and queues it for hosting. Returns the
    /// serialized size.
    pub fn host_value<T: Serialize>(
        &self,
        value: &T,
        deliver: Delivery,
    ) -> Result<usize, TransportError> {
        let bytes = bincode::serialize(value)?;
        let size = bytes.len();
        self.host(bytes, deliver)?;
        Ok(size)
    }

    /// Reports a download, which starts the lease's expiry clock.
    pub fn fetched(&self, lease: LeaseId) -> Result<(), TransportError> {
        self.tx
            .send(ProxyMessage::Fetched(lease))
            .map_err(|_| TransportError::ProxyClosed)
    }

    pub fn acknowledge(&self, lease: LeaseId) -> Result<(), TransportError> {
        self.tx
            .send(ProxyMessage::Acknowledged(lease))
            .map_err(|_| TransportError::ProxyClosed)
    }

    pub fn shutdown(&self) {
        if self.tx.send(ProxyMessage::Shutdown).is_err() {
            tracing::debug!("Payload proxy already stopped");
        }
    }
}

struct PendingPayload {
    bytes: Vec<u8>,
    deliver: Delivery,
}

/// Hosts payloads for download, at most `max_in_flight` at a time.
pub struct PayloadProxy {
    base_url: String,
    leases: LeaseRegistry,
    hosted: HostedPayloads,
    queue: VecDeque<PendingPayload>,
    rx: mpsc::UnboundedReceiver<ProxyMessage>,
    /// Used by lease timers to report expiry without keeping the proxy alive.
    timer_tx: mpsc::WeakUnboundedSender<ProxyMessage>,
    server_shutdown: Option<oneshot::Sender<()>>,
}

impl PayloadProxy {
    /// Binds the HTTP server and spawns the proxy task.
    ///
    /// Returns the proxy handle, the address the server listens on, and the
    /// proxy task (which also stops the server on shutdown).
    pub async fn start(
        config: &TransportConfig,
    ) -> Result<(ProxyHandle, SocketAddr, JoinHandle<()>)> {
        let listener = tokio::net::TcpListener::bind(config.bind).await?;
        let local_addr = listener.local_addr()?;
        let base_url = format!("http://{}", advertised_addr(local_addr));

        let (tx, rx) = mpsc::unbounded_channel();
        let timer_tx = tx.downgrade();
        let handle = ProxyHandle { tx };
        let hosted: HostedPayloads = Arc::new(DashMap::new());

        let app = Router::new()
            .route(ENDPOINT_PAYLOAD, get(handle_get_payload))
            .route(ENDPOINT_PAYLOAD_ACK, post(handle_ack_payload))
            .layer(Extension(hosted.clone()))
            .layer(Extension(handle.clone()));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                tracing::error!("Payload server failed: {}", e);
            }
        });

        tracing::info!(
            "Payload proxy online at {} (max {} in flight, lease timeout {:?})",
            base_url,
            config.max_in_flight,
            config.lease_timeout
        );

        let proxy = Self {
            base_url,
            leases: LeaseRegistry::new(config.max_in_flight, config.lease_timeout),
            hosted,
            queue: VecDeque::new(),
            rx,
            timer_tx,
            server_shutdown: Some(shutdown_tx),
        };

        let task = tokio::spawn(proxy.run());
        Ok((handle, local_addr, task))
    }

    async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            match message {
                ProxyMessage::Host { bytes, deliver } => {
                    self.queue.push_back(PendingPayload { bytes, deliver });
                }
                ProxyMessage::Fetched(lease) => {
                    if self.leases.mark_fetched(&lease) {
                        self.schedule_expiry(lease);
                    }
                }
                ProxyMessage::Acknowledged(lease) => {
                    if self.release(&lease) {
                        tracing::debug!("Payload {} acknowledged", lease);
                    }
                }
                ProxyMessage::Expired(lease) => {
                    if self.release(&lease) {
                        tracing::warn!(
                            "Payload {} was downloaded but never acknowledged, released {:?} later",
                            lease,
                            self.leases.timeout()
                        );
                    }
                }
                ProxyMessage::Shutdown => break,
            }
            self.host_queued();
        }

        self.stop();
    }

    /// Hosts queued payloads until the queue is empty or every slot is taken.
    fn host_queued(&mut self) {
        while let Some(pending) = self.queue.pop_front() {
            let Some(lease) = self.leases.try_acquire() else {
                self.queue.push_front(pending);
                tracing::debug!(
                    "All {} payload slots in use, {} payload(s) waiting",
                    self.leases.capacity(),
                    self.queue.len()
                );
                break;
            };

            let size = pending.bytes.len();
            self.hosted.insert(lease.clone(), Arc::new(pending.bytes));
            let payload = PayloadRef::new(&self.base_url, lease);
            tracing::info!("Payload of {} bytes hosted at {}", size, payload.url);

            (pending.deliver)(payload);
        }
    }

    /// Arms the lease timer on first download. A timer firing after the lease
    /// was acknowledged is ignored by `release`.
    fn schedule_expiry(&self, lease: LeaseId) {
        let timeout = self.leases.timeout();
        let timer_tx = self.timer_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(tx) = timer_tx.upgrade() {
                let _ = tx.send(ProxyMessage::Expired(lease));
            }
        });
    }

    fn release(&mut self, lease: &LeaseId) -> bool {
        self.hosted.remove(lease);
        match self.leases.release(lease) {
            Some(held) => {
                tracing::trace!("Released payload {} after {:?}", lease, held);
                true
            }
            None => false,
        }
    }

    fn stop(&mut self) {
        if !self.hosted.is_empty() {
            tracing::warn!(
                "Payload proxy stopping with {} unacknowledged payload(s)",
                self.hosted.len()
            );
        }
        if !self.queue.is_empty() {
            tracing::warn!(
                "Payload proxy dropping {} payload(s) that were never hosted",
                self.queue.len()
            );
        }
        if let Some(shutdown) = self.server_shutdown.take() {
            let _ = shutdown.send(());
        }
        tracing::info!("Payload proxy at {} offline", self.base_url);
    }
}

/// Unspecified bind addresses are advertised as loopback.
fn advertised_addr(addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
    } else {
        addr
    }
}

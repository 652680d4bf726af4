//! Worker
//!
//! A long-lived task that registers with the master, then runs one work item
//! at a time. Its report doubles as the request for the next item.
//!
//! The worker only keeps a weak sender to its own inbox. The master's roster
//! and the pool hold the strong ones, so the inbox closes, and the worker
//! stops, once the master releases it.

use super::types::{WorkItem, WorkOrder, WorkOutcome, WorkPayload, WorkReport};
use crate::coordinator::protocol::MasterHandle;
use crate::error::TransportError;
use crate::membership::types::{WorkerHandle, WorkerId};
use crate::transport::fetcher::PayloadFetcher;

use anyhow::Result;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct Worker {
    id: WorkerId,
    master: MasterHandle,
    fetcher: PayloadFetcher,
}

impl Worker {
    pub fn new(master: MasterHandle, fetcher: PayloadFetcher) -> Self {
        Self {
            id: WorkerId::new(),
            master,
            fetcher,
        }
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Spawns `count` workers sharing one HTTP client.
    pub fn spawn_many(
        count: usize,
        master: &MasterHandle,
        fetcher: &PayloadFetcher,
    ) -> Vec<JoinHandle<()>> {
        tracing::info!("Starting {} workers", count);

        (0..count)
            .map(|_| {
                let worker = Worker::new(master.clone(), fetcher.clone());
                tokio::spawn(async move {
                    let id = worker.id.clone();
                    if let Err(e) = worker.run().await {
                        tracing::error!("Worker {} failed: {}", id, e);
                    }
                })
            })
            .collect()
    }

    pub async fn run(self) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<WorkOrder>();
        let inbox = tx.downgrade();

        self.master
            .register(WorkerHandle::new(self.id.clone(), tx))
            .await?;
        tracing::info!("Worker {} registered", self.id);

        let mut processed = 0u64;
        while let Some(order) = rx.recv().await {
            let hosted = match &order.payload {
                WorkPayload::Hosted(payload) => Some(payload.lease.clone()),
                WorkPayload::Inline(_) => None,
            };
            let outcome = self.process(order.payload).await;
            processed += 1;

            let Some(tx) = inbox.upgrade() else {
                tracing::warn!("Worker {} was released while busy, dropping result", self.id);
                break;
            };
            let report = WorkReport {
                worker: WorkerHandle::new(self.id.clone(), tx),
                outcome,
                hosted,
            };
            if order.reply_to.send(report).is_err() {
                tracing::warn!("Worker {}: requester is gone, result dropped", self.id);
            }
        }

        self.master.disconnected(self.id.clone());
        tracing::info!("Worker {} stopped after {} work items", self.id, processed);
        Ok(())
    }

    async fn process(&self, payload: WorkPayload) -> WorkOutcome {
        let item = match payload {
            WorkPayload::Inline(item) => item,
            // Only hint items are large enough to be hosted
            WorkPayload::Hosted(payload) => {
                match self.fetcher.fetch_value::<WorkItem>(&payload).await {
                    Ok(item) => item,
                    Err(e @ TransportError::Codec(_)) => {
                        tracing::error!(
                            "Worker {} could not decode payload {}: {}",
                            self.id,
                            payload.lease,
                            e
                        );
                        return WorkOutcome::HintsFailed {
                            reason: format!("payload {} is corrupt: {}", payload.lease, e),
                        };
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Worker {} could not fetch payload {}: {}",
                            self.id,
                            payload.lease,
                            e
                        );
                        return WorkOutcome::PayloadUnavailable {
                            reason: format!("payload {} unavailable: {}", payload.lease, e),
                        };
                    }
                }
            }
        };

        tracing::debug!("Worker {} running {}", self.id, item.describe());
        let started = Instant::now();
        let on_panic = item.failed("search task panicked".to_string());

        match tokio::task::spawn_blocking(move || item.execute()).await {
            Ok(outcome) => {
                tracing::debug!("Worker {} finished in {:?}", self.id, started.elapsed());
                outcome
            }
            Err(e) => {
                tracing::error!("Worker {} search task failed: {}", self.id, e);
                on_panic
            }
        }
    }
}

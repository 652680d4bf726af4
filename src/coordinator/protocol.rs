//! Coordinator Protocol Definitions
//!
//! Messages accepted by the master task and the handle other components use
//! to send them.

use crate::executor::types::WorkerRef;
use crate::ingestion::types::Record;
use crate::membership::types::WorkerId;

use anyhow::{Result, anyhow};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub enum MasterMessage {
    Start,
    /// Reader reply. An empty batch marks the end of the input.
    Batch(Vec<Record>),
    BatchComplete(BatchSummary),
    Register {
        worker: WorkerRef,
        ack: oneshot::Sender<()>,
    },
    Disconnected(WorkerId),
}

/// Completion notice of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub batch_id: u64,
    pub records: usize,
    pub cracked: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

#[derive(Clone)]
pub struct MasterHandle {
    tx: mpsc::UnboundedSender<MasterMessage>,
}

impl MasterHandle {
    pub fn new(tx: mpsc::UnboundedSender<MasterMessage>) -> Self {
        Self { tx }
    }

    pub fn start(&self) {
        self.send(MasterMessage::Start);
    }

    pub fn deliver_batch(&self, records: Vec<Record>) {
        self.send(MasterMessage::Batch(records));
    }

    pub fn batch_complete(&self, summary: BatchSummary) {
        self.send(MasterMessage::BatchComplete(summary));
    }

    /// Registers a worker and waits until the master lets it proceed.
    pub async fn register(&self, worker: WorkerRef) -> Result<()> {
        let (ack, ack_rx) = oneshot::channel();
        self.tx
            .send(MasterMessage::Register { worker, ack })
            .map_err(|_| anyhow!("master is not running"))?;
        ack_rx
            .await
            .map_err(|_| anyhow!("master stopped before acknowledging registration"))
    }

    pub fn disconnected(&self, id: WorkerId) {
        self.send(MasterMessage::Disconnected(id));
    }

    fn send(&self, message: MasterMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("Master already stopped, message dropped");
        }
    }
}

//! Master
//!
//! Drives the run: pulls batches from the reader one at a time, runs each in
//! a `BatchProcessor`, keeps the worker roster, and shuts everything down
//! once the input is exhausted.

use super::batch::{BatchContext, BatchProcessor};
use super::protocol::{BatchSummary, MasterHandle, MasterMessage};
use crate::executor::pool::PoolHandle;
use crate::executor::types::{WorkOrder, WorkerRef};
use crate::ingestion::collector::CollectorHandle;
use crate::ingestion::reader::ReaderHandle;
use crate::ingestion::types::Record;
use crate::membership::roster::Roster;
use crate::membership::types::WorkerId;
use crate::transport::proxy::ProxyHandle;

use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterState {
    Idle,
    Running,
    /// Input exhausted, waiting for the last batch.
    Draining,
    Terminated,
}

/// Totals of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: u64,
    pub rejected_batches: u64,
    pub records: usize,
    pub cracked: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

pub struct Master {
    state: MasterState,
    tx: mpsc::UnboundedSender<MasterMessage>,
    rx: mpsc::UnboundedReceiver<MasterMessage>,
    reader: ReaderHandle,
    collector: CollectorHandle,
    pool: PoolHandle<WorkOrder>,
    transport: Option<ProxyHandle>,
    max_inline_bytes: usize,
    roster: Roster<WorkOrder>,
    active_batch: Option<u64>,
    next_batch_id: u64,
    started: Option<Instant>,
    summary: RunSummary,
}

impl Master {
    pub fn new(
        reader: ReaderHandle,
        collector: CollectorHandle,
        pool: PoolHandle<WorkOrder>,
        transport: Option<ProxyHandle>,
        max_inline_bytes: usize,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: MasterState::Idle,
            tx,
            rx,
            reader,
            collector,
            pool,
            transport,
            max_inline_bytes,
            roster: Roster::new(),
            active_batch: None,
            next_batch_id: 0,
            started: None,
            summary: RunSummary::default(),
        }
    }

    pub fn handle(&self) -> MasterHandle {
        MasterHandle::new(self.tx.clone())
    }

    pub fn state(&self) -> MasterState {
        self.state
    }

    pub fn spawn(self) -> JoinHandle<RunSummary> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> RunSummary {
        tracing::info!("Master ready");

        while self.state != MasterState::Terminated {
            let Some(message) = self.rx.recv().await else {
                break;
            };
            self.handle_message(message);
        }

        self.summary.clone()
    }

    pub fn handle_message(&mut self, message: MasterMessage) {
        match message {
            MasterMessage::Start => self.handle_start(),
            MasterMessage::Batch(records) => self.handle_batch(records),
            MasterMessage::BatchComplete(summary) => self.handle_batch_complete(summary),
            MasterMessage::Register { worker, ack } => self.handle_register(worker, ack),
            MasterMessage::Disconnected(id) => self.handle_disconnected(id),
        }
    }

    fn handle_start(&mut self) {
        if self.state != MasterState::Idle {
            tracing::warn!("Ignoring start request in state {:?}", self.state);
            return;
        }

        self.state = MasterState::Running;
        self.started = Some(Instant::now());
        tracing::info!("Master running with {} registered workers", self.roster.len());
        self.reader.request_batch(self.handle());
    }

    fn handle_batch(&mut self, records: Vec<Record>) {
        if self.state != MasterState::Running {
            tracing::warn!(
                "Ignoring batch of {} records in state {:?}",
                records.len(),
                self.state
            );
            return;
        }

        if records.is_empty() {
            tracing::info!("End of input reached");
            self.state = MasterState::Draining;
            if self.active_batch.is_none() {
                self.terminate();
            }
            return;
        }

        if let Some(active) = self.active_batch {
            tracing::warn!(
                "Batch {} still running, dropping unrequested batch of {} records",
                active,
                records.len()
            );
            return;
        }

        let batch_id = self.next_batch_id;
        self.next_batch_id += 1;
        let size = records.len();

        match BatchProcessor::new(batch_id, records, self.batch_context()) {
            Ok(processor) => {
                tracing::info!("Starting batch {} with {} records", batch_id, size);
                self.active_batch = Some(batch_id);
                processor.spawn();
            }
            Err(e) => {
                tracing::error!("Rejected batch {} ({} records): {}", batch_id, size, e);
                self.summary.rejected_batches += 1;
                self.reader.request_batch(self.handle());
            }
        }
    }

    fn handle_batch_complete(&mut self, summary: BatchSummary) {
        if self.active_batch != Some(summary.batch_id) {
            tracing::warn!("Ignoring completion of unknown batch {}", summary.batch_id);
            return;
        }
        self.active_batch = None;

        self.summary.batches += 1;
        self.summary.records += summary.records;
        self.summary.cracked += summary.cracked;
        self.summary.failed += summary.failed;

        match self.state {
            MasterState::Running => self.reader.request_batch(self.handle()),
            MasterState::Draining => self.terminate(),
            state => tracing::warn!("Batch completed in state {:?}", state),
        }
    }

    fn handle_register(&mut self, worker: WorkerRef, ack: oneshot::Sender<()>) {
        let id = worker.id.clone();

        if self.roster.add(worker.clone()) {
            self.pool.worker_available(worker);
        }

        if ack.send(()).is_err() {
            tracing::warn!("Worker {} stopped before its registration was acknowledged", id);
        }
    }

    fn handle_disconnected(&mut self, id: WorkerId) {
        if self.roster.remove(&id).is_some() {
            self.pool.worker_left(id);
        }
    }

    fn terminate(&mut self) {
        self.state = MasterState::Terminated;
        self.summary.elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();

        self.collector.flush();
        self.pool.shutdown();
        if let Some(transport) = &self.transport {
            transport.shutdown();
        }
        let released = self.roster.clear();

        tracing::info!(
            "Master terminated: {} batches, {} records ({} cracked, {} failed), {} workers released, elapsed {:?}",
            self.summary.batches,
            self.summary.records,
            self.summary.cracked,
            self.summary.failed,
            released,
            self.summary.elapsed
        );
    }

    fn batch_context(&self) -> BatchContext {
        BatchContext {
            pool: self.pool.clone(),
            collector: self.collector.clone(),
            master: self.handle(),
            transport: self.transport.clone(),
            max_inline_bytes: self.max_inline_bytes,
        }
    }
}

//! Worker Pool
//!
//! A generic scheduler matching a FIFO queue of pending messages against a FIFO
//! queue of idle workers. It is opaque to message content: the reply address
//! travels inside each message, so forwarding a message unchanged routes the
//! worker's answer back to whoever submitted it.

use crate::membership::types::{WorkerHandle, WorkerId};

use std::collections::{HashMap, VecDeque};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub enum PoolMessage<M> {
    WorkerAvailable(WorkerHandle<M>),
    Submit(M),
    WorkerLeft(WorkerId),
    Shutdown,
}

pub struct PoolHandle<M> {
    tx: mpsc::UnboundedSender<PoolMessage<M>>,
}

impl<M> Clone for PoolHandle<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M> PoolHandle<M> {
    pub fn new(tx: mpsc::UnboundedSender<PoolMessage<M>>) -> Self {
        Self { tx }
    }

    pub fn submit(&self, message: M) {
        self.send(PoolMessage::Submit(message));
    }

    pub fn worker_available(&self, worker: WorkerHandle<M>) {
        self.send(PoolMessage::WorkerAvailable(worker));
    }

    pub fn worker_left(&self, id: WorkerId) {
        self.send(PoolMessage::WorkerLeft(id));
    }

    pub fn shutdown(&self) {
        self.send(PoolMessage::Shutdown);
    }

    fn send(&self, message: PoolMessage<M>) {
        if self.tx.send(message).is_err() {
            tracing::warn!("Worker pool is no longer running, message dropped");
        }
    }
}

pub struct WorkerPool<M> {
    work_items: VecDeque<M>,
    idle_workers: VecDeque<WorkerHandle<M>>,
    /// The message each busy worker is processing, kept for reassignment.
    in_flight: HashMap<WorkerId, M>,
    dispatched: u64,
}

impl<M: Clone + Send + 'static> WorkerPool<M> {
    pub fn new() -> Self {
        Self {
            work_items: VecDeque::new(),
            idle_workers: VecDeque::new(),
            in_flight: HashMap::new(),
            dispatched: 0,
        }
    }

    /// Spawns the pool task.
    pub fn spawn() -> (PoolHandle<M>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(Self::new().run(rx));
        (PoolHandle::new(tx), task)
    }

    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<PoolMessage<M>>) {
        tracing::info!("Worker pool started");

        while let Some(message) = rx.recv().await {
            match message {
                PoolMessage::WorkerAvailable(worker) => self.worker_available(worker),
                PoolMessage::Submit(item) => self.submit(item),
                PoolMessage::WorkerLeft(id) => self.worker_left(&id),
                PoolMessage::Shutdown => break,
            }
        }

        tracing::info!(
            "Worker pool stopped after {} dispatches ({} queued, {} idle, {} in flight released)",
            self.dispatched,
            self.work_items.len(),
            self.idle_workers.len(),
            self.in_flight.len()
        );
    }

    pub fn worker_available(&mut self, worker: WorkerHandle<M>) {
        self.in_flight.remove(&worker.id);

        if self.idle_workers.iter().any(|idle| idle.id == worker.id) {
            tracing::warn!("Worker {} announced as available twice", worker.id);
            return;
        }

        self.idle_workers.push_back(worker);
        self.try_assign_work();
    }

    pub fn submit(&mut self, item: M) {
        self.work_items.push_back(item);
        self.try_assign_work();
    }

    /// Forgets a departed worker and requeues whatever it was running.
    pub fn worker_left(&mut self, id: &WorkerId) {
        self.idle_workers.retain(|worker| &worker.id != id);

        if let Some(item) = self.in_flight.remove(id) {
            tracing::warn!("Worker {} left while busy, requeueing its work item", id);
            self.work_items.push_front(item);
            self.try_assign_work();
        }
    }

    fn try_assign_work(&mut self) {
        while !self.idle_workers.is_empty() && !self.work_items.is_empty() {
            let (Some(worker), Some(item)) =
                (self.idle_workers.pop_front(), self.work_items.pop_front())
            else {
                break;
            };

            self.in_flight.insert(worker.id.clone(), item.clone());
            match worker.send(item) {
                Ok(()) => {
                    self.dispatched += 1;
                    tracing::trace!("Dispatched work item to worker {}", worker.id);
                }
                Err(item) => {
                    tracing::warn!("Worker {} is gone, requeueing work item", worker.id);
                    self.in_flight.remove(&worker.id);
                    self.work_items.push_front(item);
                }
            }
        }
    }

    pub fn queued_items(&self) -> usize {
        self.work_items.len()
    }

    pub fn idle_workers(&self) -> usize {
        self.idle_workers.len()
    }

    pub fn busy_workers(&self) -> usize {
        self.in_flight.len()
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }
}

impl<M: Clone + Send + 'static> Default for WorkerPool<M> {
    fn default() -> Self {
        Self::new()
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of a worker that accepts messages of type `M`.
///
/// Handles compare equal when they refer to the same worker id.
pub struct WorkerHandle<M> {
    pub id: WorkerId,
    tx: mpsc::UnboundedSender<M>,
}

impl<M> WorkerHandle<M> {
    pub fn new(id: WorkerId, tx: mpsc::UnboundedSender<M>) -> Self {
        Self { id, tx }
    }

    /// Delivers a message, handing it back if the worker's channel is closed.
    pub fn send(&self, message: M) -> Result<(), M> {
        self.tx.send(message).map_err(|e| e.0)
    }
}

impl<M> Clone for WorkerHandle<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            tx: self.tx.clone(),
        }
    }
}

impl<M> PartialEq for WorkerHandle<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<M> Eq for WorkerHandle<M> {}

impl<M> fmt::Debug for WorkerHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle").field("id", &self.id).finish()
    }
}

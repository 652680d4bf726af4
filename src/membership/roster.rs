use super::types::{WorkerHandle, WorkerId};

use std::collections::HashMap;
use std::time::Instant;

/// A registered worker and when it joined.
#[derive(Debug)]
pub struct Member<M> {
    pub handle: WorkerHandle<M>,
    pub registered_at: Instant,
}

/// The set of workers currently registered with the coordinator.
#[derive(Debug)]
pub struct Roster<M> {
    members: HashMap<WorkerId, Member<M>>,
}

impl<M> Roster<M> {
    pub fn new() -> Self {
        Self {
            members: HashMap::new(),
        }
    }

    /// Adds a worker. Returns `false` if it was already registered, in which
    /// case the stored handle is replaced.
    pub fn add(&mut self, handle: WorkerHandle<M>) -> bool {
        let id = handle.id.clone();
        let member = Member {
            handle,
            registered_at: Instant::now(),
        };

        match self.members.insert(id.clone(), member) {
            None => {
                tracing::info!("Registered worker {} (roster size: {})", id, self.members.len());
                true
            }
            Some(_) => {
                tracing::warn!("Worker {} registered twice", id);
                false
            }
        }
    }

    /// Removes a worker, returning its entry if it was registered.
    pub fn remove(&mut self, id: &WorkerId) -> Option<Member<M>> {
        let removed = self.members.remove(id);
        match &removed {
            Some(member) => tracing::info!(
                "Unregistered worker {} after {:?} (roster size: {})",
                id,
                member.registered_at.elapsed(),
                self.members.len()
            ),
            None => tracing::debug!("Disconnection notice for unknown worker {}", id),
        }
        removed
    }

    pub fn contains(&self, id: &WorkerId) -> bool {
        self.members.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Drops every handle the roster holds, releasing the workers' channels.
    pub fn clear(&mut self) -> usize {
        let released = self.members.len();
        self.members.clear();
        released
    }
}

impl<M> Default for Roster<M> {
    fn default() -> Self {
        Self::new()
    }
}

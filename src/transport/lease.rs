use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Identifier of one hosted payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LeaseId(pub String);

impl LeaseId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for LeaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LeaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
struct Lease {
    acquired_at: Instant,
    fetched: bool,
}

/// Tracks the leases currently held, never more than `capacity` at once.
///
/// The expiry clock of a lease starts at its first download, so a payload
/// waiting for a receiver keeps its slot for as long as it waits.
#[derive(Debug)]
pub struct LeaseRegistry {
    capacity: usize,
    timeout: Duration,
    leases: HashMap<LeaseId, Lease>,
}

impl LeaseRegistry {
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        Self {
            capacity,
            timeout,
            leases: HashMap::with_capacity(capacity),
        }
    }

    /// Takes a free slot, or returns `None` when all slots are in use.
    pub fn try_acquire(&mut self) -> Option<LeaseId> {
        if !self.has_capacity() {
            return None;
        }

        let id = LeaseId::new();
        self.leases.insert(
            id.clone(),
            Lease {
                acquired_at: Instant::now(),
                fetched: false,
            },
        );
        Some(id)
    }

    /// Frees a slot. Releasing an unknown or already released lease is a no-op
    /// and returns `None`; otherwise returns how long the lease was held.
    pub fn release(&mut self, id: &LeaseId) -> Option<Duration> {
        self.leases.remove(id).map(|lease| lease.acquired_at.elapsed())
    }

    /// Records a download. Returns `true` only for the first download of a
    /// held lease, which is when its expiry timer should be armed.
    pub fn mark_fetched(&mut self, id: &LeaseId) -> bool {
        match self.leases.get_mut(id) {
            Some(lease) if !lease.fetched => {
                lease.fetched = true;
                true
            }
            _ => false,
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.leases.len() < self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.leases.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

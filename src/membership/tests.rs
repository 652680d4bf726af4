//! Membership Module Tests
//!
//! ## Test Scopes
//! - **Worker Identity**: Uniqueness and hashing of `WorkerId`.
//! - **Handles**: Delivery, closed-channel detection, identity-based equality.
//! - **Roster**: Registration, duplicate registration, disconnection, release.

#[cfg(test)]
mod tests {
    use crate::membership::roster::Roster;
    use crate::membership::types::{WorkerHandle, WorkerId};
    use std::collections::HashSet;
    use tokio::sync::mpsc;

    fn handle(id: &str) -> (WorkerHandle<u32>, mpsc::UnboundedReceiver<u32>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (WorkerHandle::new(WorkerId(id.to_string()), tx), rx)
    }

    // ============================================================
    // WORKER ID TESTS
    // ============================================================

    #[test]
    fn test_worker_id_is_unique() {
        let id1 = WorkerId::new();
        let id2 = WorkerId::new();

        assert_ne!(id1, id2, "Each WorkerId should be unique");
    }

    #[test]
    fn test_worker_id_hash() {
        let mut set = HashSet::new();
        set.insert(WorkerId("worker-1".to_string()));
        set.insert(WorkerId("worker-1".to_string())); // duplicate
        set.insert(WorkerId("worker-2".to_string()));

        assert_eq!(set.len(), 2, "HashSet should have 2 unique WorkerIds");
    }

    // ============================================================
    // HANDLE TESTS
    // ============================================================

    #[test]
    fn test_handle_delivers_messages() {
        let (worker, mut rx) = handle("w");

        worker.send(7).unwrap();

        assert_eq!(rx.try_recv().unwrap(), 7);
    }

    #[test]
    fn test_handle_returns_message_when_closed() {
        let (worker, rx) = handle("w");
        drop(rx);

        assert_eq!(worker.send(42), Err(42));
    }

    #[test]
    fn test_handles_compare_by_id() {
        let (a, _rx_a) = handle("same");
        let (b, _rx_b) = handle("same");
        let (c, _rx_c) = handle("other");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    // ============================================================
    // ROSTER TESTS
    // ============================================================

    #[test]
    fn test_roster_add_and_remove() {
        // ARRANGE
        let mut roster = Roster::new();
        let (w1, _rx1) = handle("w1");
        let (w2, _rx2) = handle("w2");

        // ACT
        assert!(roster.add(w1.clone()));
        assert!(roster.add(w2.clone()));

        // ASSERT
        assert_eq!(roster.len(), 2);
        assert!(roster.contains(&w1.id));

        let removed = roster.remove(&w1.id).expect("w1 was registered");
        assert_eq!(removed.handle, w1);
        assert!(!roster.contains(&w1.id));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_roster_duplicate_registration_is_idempotent() {
        let mut roster = Roster::new();
        let (w1, _rx1) = handle("w1");

        assert!(roster.add(w1.clone()));
        assert!(!roster.add(w1.clone()));

        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_roster_remove_unknown_worker() {
        let mut roster: Roster<u32> = Roster::new();

        assert!(roster.remove(&WorkerId("ghost".to_string())).is_none());
        assert!(roster.is_empty());
    }

    #[test]
    fn test_roster_clear_releases_worker_channels() {
        // ARRANGE
        let mut roster = Roster::new();
        let (w1, mut rx1) = handle("w1");
        roster.add(w1);

        // ACT: the roster held the only sender
        let released = roster.clear();

        // ASSERT: the worker sees its channel close
        assert_eq!(released, 1);
        assert!(roster.is_empty());
        assert!(matches!(
            rx1.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}

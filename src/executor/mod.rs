//! Task Executor Module
//!
//! Schedules search work onto workers and runs it.
//!
//! ## Architecture Overview
//! The executor follows a **Pull-based** model:
//! 1. **Submission**: Requesters submit `WorkOrder`s to the `WorkerPool`. Each order
//!    carries the requester's reply channel, so the pool never needs to know who asked.
//! 2. **Matching**: The pool pairs the oldest pending order with the oldest idle worker
//!    as soon as both exist.
//! 3. **Execution**: A worker runs one item to completion on a blocking thread and sends
//!    the `WorkReport` straight to the requester.
//! 4. **Re-arming**: The requester hands the reporting worker back to the pool, which is
//!    how a worker asks for its next item.
//!
//! If a worker leaves while holding an item, the pool puts that item back at the head of
//! the queue.
//!
//! ## Submodules
//! - **`types`**: Work items, orders, outcomes and reports.
//! - **`pool`**: The generic scheduler.
//! - **`worker`**: The worker registration and dispatch loop.

pub mod pool;
pub mod types;
pub mod worker;

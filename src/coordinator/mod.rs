//! Coordinator Module
//!
//! Owns the lifecycle of a run.
//!
//! ## Flow
//! 1. The `master` asks the reader for a batch.
//! 2. A `batch::BatchProcessor` splits the batch's hint search into one work item per
//!    ordered pair of alphabet characters and submits them to the worker pool.
//! 3. As hint results come in, each record narrows down the characters its password
//!    may contain. When all its hints are cracked, its password search is submitted.
//! 4. When every record is answered (or has failed) the processor reports to the
//!    master, which asks for the next batch.
//! 5. An empty batch ends the run: the master flushes the results and releases the
//!    workers, the pool and the transport.
//!
//! ## Submodules
//! - **`protocol`**: Messages accepted by the master.
//! - **`batch`**: Partitioning and aggregation for one batch.
//! - **`master`**: The run state machine and worker roster.

pub mod batch;
pub mod master;
pub mod protocol;

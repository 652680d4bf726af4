//! Distributed Password Cracker Library
//!
//! Recovers passwords from their SHA-256 hashes with the help of hint hashes,
//! spreading the search over a pool of workers.
//!
//! ## Architecture Modules
//! - **`coordinator`**: The master state machine and the per-batch partitioning and
//!   aggregation engine.
//! - **`executor`**: The generic pull-based worker pool, the work items and the workers
//!   running them.
//! - **`cracking`**: The permutation (hint) and combination (password) searches.
//! - **`ingestion`**: Reading records from a delimited file and collecting answer lines.
//! - **`membership`**: Worker identity and the roster of registered workers.
//! - **`transport`**: Bounded HTTP hosting for work items too large to send inline.
//! - **`hashing`**: The SHA-256 content hash shared by all of the above.

pub mod cluster;
pub mod config;
pub mod coordinator;
pub mod cracking;
pub mod error;
pub mod executor;
pub mod hashing;
pub mod ingestion;
pub mod membership;
pub mod transport;

//! Membership Module
//!
//! Tracks which workers currently belong to the cluster. Workers join by registering
//! with the coordinator and leave by sending a disconnection notice when their loop
//! ends; liveness detection beyond that notice is outside this module.
//!
//! ## Core Mechanisms
//! - **Worker Identity**: UUID-based `WorkerId`s, unique for the lifetime of the process.
//! - **Worker Handles**: A worker is addressed through the sending half of its private
//!   channel; the handle is generic over the message type so the scheduler stays opaque.
//! - **Roster**: Explicit add-on-registration / remove-on-disconnection bookkeeping.

pub mod roster;
pub mod types;

#[cfg(test)]
mod tests;

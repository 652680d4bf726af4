//! Oversized-Payload Transport
//!
//! Moves payloads that are too large to travel inline in a work order. The sending
//! side hosts the serialized payload on a small HTTP server and hands the receiver a
//! reference; the receiver downloads it and acknowledges, which frees the slot.
//!
//! ## Core Mechanisms
//! - **Bounded Leasing**: At most `max_in_flight` payloads are hosted at once. Further
//!   payloads wait in a FIFO queue inside the proxy until a slot frees up.
//! - **Expiry**: The first download of a payload arms its timer. A lease still held
//!   when the timer fires is released. A payload nobody has downloaded yet never
//!   expires, so it survives any wait in the receiver's queue.
//! - **Delivery Callbacks**: The proxy never interprets payloads. When a payload gets a
//!   slot it invokes the sender's callback with a `PayloadRef`, and the sender routes
//!   that reference wherever it wants (e.g. into the worker pool).
//!
//! ## Submodules
//! - **`lease`**: Capacity-limited lease registry.
//! - **`protocol`**: Endpoints and wire types.
//! - **`proxy`**: The proxy task and its HTTP server.
//! - **`handlers`**: Axum handlers serving and acknowledging payloads.
//! - **`fetcher`**: Receiver-side download-and-acknowledge client.

pub mod fetcher;
pub mod handlers;
pub mod lease;
pub mod protocol;
pub mod proxy;

#[cfg(test)]
mod tests;

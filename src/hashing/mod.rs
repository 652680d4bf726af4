//! Content Hash Module
//!
//! The fixed-length SHA-256 digest used as the search target of every work item
//! and as the key of the batch aggregation indices.
//!
//! ## Submodules
//! - **`types`**: The `ContentHash` value type, its hex codec and serde support.

pub mod types;

#[cfg(test)]
mod tests;

//! Ingestion Module
//!
//! The edges of the pipeline: records come in through the `reader`, answer
//! lines go out through the `collector`.
//!
//! ## Submodules
//! - **`types`**: The `Record` and its line parser.
//! - **`reader`**: Pull-style batch reader over a delimited file.
//! - **`collector`**: Result sink that prints answers on flush.

pub mod collector;
pub mod reader;
pub mod types;

#[cfg(test)]
mod tests;

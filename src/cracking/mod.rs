//! Search Algorithms
//!
//! The two exhaustive searches executed by workers. Both are pure, CPU-bound
//! and deterministic; the coordinator relies on their enumeration properties to
//! split the search space into disjoint work items.
//!
//! ## Submodules
//! - **`permutation`**: Hint cracking. Permutes an alphabet behind a fixed prefix and
//!   recovers the character withheld from each matching hint.
//! - **`combination`**: Password cracking. Enumerates fixed-length tuples (with repetition)
//!   over the surviving candidate characters.

pub mod combination;
pub mod permutation;


use crate::error::CrackError;

/// Validates that `value` is ASCII so every character is exactly one byte.
pub(crate) fn ascii_bytes(field: &str, value: &str) -> Result<Vec<u8>, CrackError> {
    if !value.is_ascii() {
        return Err(CrackError::InvalidInput(format!(
            "'{}' can only contain ASCII characters",
            field
        )));
    }
    Ok(value.as_bytes().to_vec())
}

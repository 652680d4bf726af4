use super::ascii_bytes;
use crate::error::CrackError;
use crate::hashing::types::ContentHash;

use std::collections::{HashMap, HashSet};

/// Cracks hint hashes by permuting an alphabet behind a fixed prefix.
///
/// Every permutation `prefix + p` is hashed without its last byte; when that
/// digest is one of the targets, the last byte is the character withheld
/// from the hint.
#[derive(Debug, Clone)]
pub struct PermutationCracker {
    choices: Vec<u8>,
    prefix: Vec<u8>,
}

impl PermutationCracker {
    pub fn new(choices: &str, prefix: Option<&str>) -> Result<Self, CrackError> {
        if choices.is_empty() {
            return Err(CrackError::InvalidInput(
                "'choices' must be a non-empty string".to_string(),
            ));
        }

        Ok(Self {
            choices: ascii_bytes("choices", choices)?,
            prefix: ascii_bytes("prefix", prefix.unwrap_or_default())?,
        })
    }

    /// Tests every permutation of the choices once and returns the targets
    /// that matched, mapped to their missing character.
    ///
    /// Targets that cannot arise from this alphabet and prefix are simply
    /// absent from the result.
    pub fn crack(&self, targets: &HashSet<ContentHash>) -> HashMap<ContentHash, char> {
        let mut cracked = HashMap::new();
        if targets.is_empty() {
            return cracked;
        }

        let offset = self.prefix.len();
        let n = self.choices.len();

        let mut word = Vec::with_capacity(offset + n);
        word.extend_from_slice(&self.prefix);
        word.extend_from_slice(&self.choices);

        try_crack_hint(&word, targets, &mut cracked);
        if n < 2 {
            return cracked;
        }

        // Countdown QuickPerm: each step is a single transposition
        let mut p: Vec<usize> = (0..=n).collect();
        let mut k = 1;
        while k < n {
            p[k] -= 1;
            let j = (k % 2) * p[k];
            word.swap(offset + j, offset + k);

            try_crack_hint(&word, targets, &mut cracked);

            k = 1;
            while p[k] == 0 {
                p[k] = k;
                k += 1;
            }
        }

        cracked
    }
}

fn try_crack_hint(
    candidate: &[u8],
    targets: &HashSet<ContentHash>,
    cracked: &mut HashMap<ContentHash, char>,
) {
    let hint_length = candidate.len() - 1;
    let hash = ContentHash::of_prefix(candidate, hint_length);

    if targets.contains(&hash) {
        cracked.insert(hash, candidate[hint_length] as char);
    }
}

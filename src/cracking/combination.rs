use super::ascii_bytes;
use crate::error::CrackError;
use crate::hashing::types::ContentHash;

/// Cracks a password by enumerating every `length`-tuple over an alphabet.
///
/// The enumeration is a mixed-radix counter where position 0 is the least
/// significant digit, so the first character changes fastest.
#[derive(Debug, Clone)]
pub struct CombinationCracker {
    choices: Vec<u8>,
    length: usize,
}

impl CombinationCracker {
    pub fn new(choices: &str, length: usize) -> Result<Self, CrackError> {
        if choices.is_empty() {
            return Err(CrackError::InvalidInput(
                "'choices' must be a non-empty string".to_string(),
            ));
        }
        if length == 0 {
            return Err(CrackError::InvalidInput(
                "'length' must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            choices: ascii_bytes("choices", choices)?,
            length,
        })
    }

    /// Returns the first combination in enumeration order whose hash is `target`.
    pub fn crack(&self, target: &ContentHash) -> Result<String, CrackError> {
        let radix = self.choices.len();
        let mut digits = vec![0usize; self.length];
        let mut candidate = vec![self.choices[0]; self.length];

        loop {
            if ContentHash::digest(&candidate) == *target {
                return Ok(candidate.iter().map(|&b| b as char).collect());
            }

            // Increment; carries stop at the first digit that does not wrap
            let mut position = 0;
            loop {
                if position == self.length {
                    return Err(CrackError::NotFound {
                        alphabet: self.choices.iter().map(|&b| b as char).collect(),
                        length: self.length,
                        target: target.to_hex(),
                    });
                }

                digits[position] += 1;
                if digits[position] < radix {
                    candidate[position] = self.choices[digits[position]];
                    break;
                }

                digits[position] = 0;
                candidate[position] = self.choices[0];
                position += 1;
            }
        }
    }
}

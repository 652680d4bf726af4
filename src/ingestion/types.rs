//! Ingestion Data Types
//!
//! The record read from each input line, and its line parser.

use crate::error::RecordParseError;
use crate::hashing::types::ContentHash;

use serde::{Deserialize, Serialize};

/// One password to crack.
///
/// Every hint hash is the hash of a permutation of `password_chars` with
/// exactly one character left out; that character is absent from the password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub id: u32,
    pub name: String,
    pub password_chars: String,
    pub password_length: usize,
    pub password_hash: ContentHash,
    pub hint_hashes: Vec<ContentHash>,
}

impl Record {
    /// Parses `id, name, passwordChars, passwordLength, passwordHash, hint...`.
    ///
    /// Fields are trimmed. Empty trailing hint fields are ignored.
    pub fn from_line(line: &str, delimiter: char) -> Result<Self, RecordParseError> {
        let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();
        if fields.len() < 5 {
            return Err(RecordParseError::FieldCount(fields.len()));
        }

        let id = fields[0]
            .parse::<u32>()
            .map_err(|_| RecordParseError::InvalidNumber {
                field: "id",
                value: fields[0].to_string(),
            })?;

        let password_length =
            fields[3]
                .parse::<usize>()
                .map_err(|_| RecordParseError::InvalidNumber {
                    field: "passwordLength",
                    value: fields[3].to_string(),
                })?;

        let password_hash = parse_hash("passwordHash", fields[4])?;

        let hint_hashes = fields[5..]
            .iter()
            .enumerate()
            .filter(|(_, field)| !field.is_empty())
            .map(|(i, field)| parse_hash(&format!("hint{}", i + 1), field))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            name: fields[1].to_string(),
            password_chars: fields[2].to_string(),
            password_length,
            password_hash,
            hint_hashes,
        })
    }
}

fn parse_hash(field: &str, value: &str) -> Result<ContentHash, RecordParseError> {
    ContentHash::from_hex(value).map_err(|source| RecordParseError::InvalidHash {
        field: field.to_string(),
        source,
    })
}

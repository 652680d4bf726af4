//! Error types for the cracking cluster
//!
//! Library code returns the typed errors defined here; task loops and the
//! binary wrap them in `anyhow::Result`.

use thiserror::Error;

/// A hex string could not be turned into a [`crate::hashing::types::ContentHash`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HashParseError {
    #[error("a SHA-256 hex string must have 64 characters, got {0}")]
    InvalidLength(usize),

    #[error("invalid character in SHA-256 hex string: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Errors raised by the search algorithms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrackError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("search space exhausted: no {length}-character combination of '{alphabet}' hashes to {target}")]
    NotFound {
        alphabet: String,
        length: usize,
        target: String,
    },
}

/// A single input line could not be parsed into a record.
#[derive(Error, Debug)]
pub enum RecordParseError {
    #[error("a record line must have at least 5 fields, got {0}")]
    FieldCount(usize),

    #[error("field '{field}' is not a valid number: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field '{field}' is not a valid hash: {source}")]
    InvalidHash {
        field: String,
        #[source]
        source: HashParseError,
    },
}

/// A batch was rejected at the validation boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch has no records")]
    Empty,

    #[error("record ID={id} uses password characters '{found}', batch uses '{expected}'")]
    MixedAlphabet {
        id: u32,
        expected: String,
        found: String,
    },

    #[error("record ID={id} has password length {found}, batch uses {expected}")]
    MixedLength { id: u32, expected: usize, found: usize },

    #[error("password characters '{0}' must have at least 4 distinct ASCII characters")]
    InvalidAlphabet(String),

    #[error("password length must be at least 1")]
    InvalidLength,
}

/// Failures of the oversized-payload transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("payload serialization failed: {0}")]
    Codec(#[from] bincode::Error),

    #[error("payload proxy is no longer running")]
    ProxyClosed,
}

/// Invalid command line or configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: usize,
        value: usize,
    },

    #[error("delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(char),
}

//! Configuration for the cracking cluster
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - The validated runtime configuration handed to each component at construction

use crate::error::ConfigError;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Work items larger than this travel through the payload transport.
pub const DEFAULT_MAX_INLINE_BYTES: usize = 64 * 1024;

pub const DEFAULT_MAX_IN_FLIGHT: usize = 20;

pub const DEFAULT_LEASE_TIMEOUT_SECS: u64 = 30;

/// Distributed hint-based password cracker
#[derive(Parser, Debug, Clone)]
#[command(
    name = "distributed-cracker",
    version,
    about = "Cracks hint-protected password hashes with a pool of workers",
    after_help = "EXAMPLES:\n    \
        distributed-cracker passwords.csv\n    \
        distributed-cracker passwords.csv -w 8 -b 50 --delimiter ';' --has-header\n    \
        distributed-cracker passwords.csv --transport-bind 127.0.0.1:7788"
)]
pub struct CliArgs {
    /// Input file, one record per line
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Records per batch
    #[arg(short = 'b', long, default_value_t = DEFAULT_BATCH_SIZE, value_name = "NUM")]
    pub batch_size: usize,

    /// Number of local workers
    #[arg(short = 'w', long, default_value_t = default_workers(), value_name = "NUM")]
    pub workers: usize,

    /// Field delimiter of the input file
    #[arg(short = 'd', long, default_value_t = ',')]
    pub delimiter: char,

    /// Skip the first line of the input file
    #[arg(long)]
    pub has_header: bool,

    /// Serve oversized work items over HTTP from this address
    #[arg(long, value_name = "ADDR")]
    pub transport_bind: Option<SocketAddr>,

    /// Largest work item (in bytes) sent inline
    #[arg(long, default_value_t = DEFAULT_MAX_INLINE_BYTES, value_name = "BYTES")]
    pub max_inline_bytes: usize,

    /// Maximum payloads hosted at once by the transport
    #[arg(long, default_value_t = DEFAULT_MAX_IN_FLIGHT, value_name = "NUM")]
    pub max_in_flight: usize,

    /// Seconds before an unacknowledged payload is released
    #[arg(long, default_value_t = DEFAULT_LEASE_TIMEOUT_SECS, value_name = "SECS")]
    pub lease_timeout_secs: u64,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub bind: SocketAddr,
    pub max_in_flight: usize,
    pub lease_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub batch_size: usize,
    pub worker_count: usize,
    pub delimiter: char,
    pub has_header: bool,
    pub max_inline_bytes: usize,
    pub transport: Option<TransportConfig>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            worker_count: default_workers(),
            delimiter: ',',
            has_header: false,
            max_inline_bytes: DEFAULT_MAX_INLINE_BYTES,
            transport: None,
        }
    }
}

impl ClusterConfig {
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        at_least("batch_size", args.batch_size, 1)?;
        at_least("workers", args.workers, 1)?;

        if !args.delimiter.is_ascii() {
            return Err(ConfigError::InvalidDelimiter(args.delimiter));
        }

        let transport = match args.transport_bind {
            Some(bind) => {
                at_least("max_in_flight", args.max_in_flight, 1)?;
                at_least("lease_timeout_secs", args.lease_timeout_secs as usize, 1)?;
                Some(TransportConfig {
                    bind,
                    max_in_flight: args.max_in_flight,
                    lease_timeout: Duration::from_secs(args.lease_timeout_secs),
                })
            }
            None => None,
        };

        Ok(Self {
            batch_size: args.batch_size,
            worker_count: args.workers,
            delimiter: args.delimiter,
            has_header: args.has_header,
            max_inline_bytes: args.max_inline_bytes,
            transport,
        })
    }
}

fn at_least(field: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::TooSmall { field, min, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("distributed-cracker").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ClusterConfig::from_args(&parse(&["input.csv"])).unwrap();

        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.delimiter, ',');
        assert!(!config.has_header);
        assert!(config.worker_count >= 1);
        assert!(config.transport.is_none());
    }

    #[test]
    fn test_transport_enabled_by_bind_address() {
        let args = parse(&[
            "input.csv",
            "--transport-bind",
            "127.0.0.1:7788",
            "--max-in-flight",
            "5",
            "--lease-timeout-secs",
            "10",
        ]);

        let config = ClusterConfig::from_args(&args).unwrap();
        let transport = config.transport.expect("transport configured");

        assert_eq!(transport.bind, "127.0.0.1:7788".parse().unwrap());
        assert_eq!(transport.max_in_flight, 5);
        assert_eq!(transport.lease_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let result = ClusterConfig::from_args(&parse(&["input.csv", "-b", "0"]));

        assert_eq!(
            result,
            Err(ConfigError::TooSmall {
                field: "batch_size",
                min: 1,
                value: 0
            })
        );
    }

    #[test]
    fn test_rejects_non_ascii_delimiter() {
        let result = ClusterConfig::from_args(&parse(&["input.csv", "-d", "§"]));

        assert_eq!(result, Err(ConfigError::InvalidDelimiter('§')));
    }
}

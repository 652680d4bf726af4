//! Batch Reader
//!
//! Answers each read request with the next batch of records and then
//! prefetches the following one, so the master never waits on the file for
//! more than one batch. An empty batch marks the end of the input.

use super::types::Record;
use crate::config::ClusterConfig;
use crate::coordinator::protocol::MasterHandle;

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub enum ReaderMessage {
    Read { reply_to: MasterHandle },
}

#[derive(Clone)]
pub struct ReaderHandle {
    tx: mpsc::UnboundedSender<ReaderMessage>,
}

impl ReaderHandle {
    pub fn new(tx: mpsc::UnboundedSender<ReaderMessage>) -> Self {
        Self { tx }
    }

    pub fn request_batch(&self, reply_to: MasterHandle) {
        if self.tx.send(ReaderMessage::Read { reply_to }).is_err() {
            tracing::error!("Reader is no longer running, batch request dropped");
        }
    }
}

pub struct BatchReader<R> {
    lines: Lines<R>,
    line_number: usize,
    batch_size: usize,
    delimiter: char,
    skip_header: bool,
    exhausted: bool,
    skipped: usize,
}

impl BatchReader<BufReader<File>> {
    pub async fn open(path: &Path, config: &ClusterConfig) -> Result<Self> {
        let file = File::open(path)
            .await
            .with_context(|| format!("cannot open input file {}", path.display()))?;
        tracing::info!("Reading records from {}", path.display());
        Ok(Self::new(BufReader::new(file), config))
    }
}

impl<R: AsyncBufRead + Unpin + Send + 'static> BatchReader<R> {
    pub fn new(source: R, config: &ClusterConfig) -> Self {
        Self {
            lines: source.lines(),
            line_number: 0,
            batch_size: config.batch_size,
            delimiter: config.delimiter,
            skip_header: config.has_header,
            exhausted: false,
            skipped: 0,
        }
    }

    pub fn spawn(self) -> (ReaderHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx));
        (ReaderHandle::new(tx), task)
    }

    /// Serves read requests until every handle is dropped.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ReaderMessage>) {
        let mut buffer = self.next_batch().await;

        while let Some(ReaderMessage::Read { reply_to }) = rx.recv().await {
            let batch = std::mem::take(&mut buffer);
            tracing::debug!("Delivering batch of {} records", batch.len());
            reply_to.deliver_batch(batch);
            buffer = self.next_batch().await;
        }

        tracing::info!(
            "Reader stopped after {} lines ({} skipped)",
            self.line_number,
            self.skipped
        );
    }

    /// Reads up to `batch_size` records. Returns an empty batch at the end of
    /// input. A read error ends the input.
    pub async fn next_batch(&mut self) -> Vec<Record> {
        let mut batch = Vec::with_capacity(self.batch_size);

        while batch.len() < self.batch_size && !self.exhausted {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.exhausted = true;
                    break;
                }
                Err(e) => {
                    tracing::error!("Failed to read input after line {}: {}", self.line_number, e);
                    self.exhausted = true;
                    break;
                }
            };
            self.line_number += 1;

            if self.skip_header {
                self.skip_header = false;
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }

            match Record::from_line(&line, self.delimiter) {
                Ok(record) => batch.push(record),
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!("Skipping line {}: {}", self.line_number, e);
                }
            }
        }

        batch
    }
}

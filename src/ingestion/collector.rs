//! Result Collector
//!
//! Buffers answer and failure lines and writes them out when flushed.

use anyhow::Result;
use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub enum CollectorMessage {
    Collect(String),
    Failure(String),
    Flush,
}

#[derive(Clone)]
pub struct CollectorHandle {
    tx: mpsc::UnboundedSender<CollectorMessage>,
}

impl CollectorHandle {
    pub fn new(tx: mpsc::UnboundedSender<CollectorMessage>) -> Self {
        Self { tx }
    }

    pub fn collect(&self, line: String) {
        self.send(CollectorMessage::Collect(line));
    }

    pub fn failure(&self, line: String) {
        self.send(CollectorMessage::Failure(line));
    }

    pub fn flush(&self) {
        self.send(CollectorMessage::Flush);
    }

    fn send(&self, message: CollectorMessage) {
        if self.tx.send(message).is_err() {
            tracing::error!("Collector is no longer running, result dropped");
        }
    }
}

/// Everything the collector wrote.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectedResults {
    pub answers: Vec<String>,
    pub failures: Vec<String>,
}

pub struct Collector {
    out: Box<dyn Write + Send>,
    pending: CollectedResults,
    written: CollectedResults,
}

impl Collector {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            pending: CollectedResults::default(),
            written: CollectedResults::default(),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn spawn(self) -> (CollectorHandle, JoinHandle<Result<CollectedResults>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx));
        (CollectorHandle::new(tx), task)
    }

    /// Runs until every handle is dropped. Anything still buffered is written
    /// out before returning.
    pub async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<CollectorMessage>,
    ) -> Result<CollectedResults> {
        while let Some(message) = rx.recv().await {
            match message {
                CollectorMessage::Collect(line) => self.pending.answers.push(line),
                CollectorMessage::Failure(line) => self.pending.failures.push(line),
                CollectorMessage::Flush => self.flush()?,
            }
        }

        self.flush()?;
        Ok(self.written)
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.answers.is_empty() && self.pending.failures.is_empty() {
            return Ok(());
        }

        // Answers first, failures after them
        for line in self
            .pending
            .answers
            .iter()
            .chain(self.pending.failures.iter())
        {
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()?;

        tracing::info!(
            "Flushed {} answers and {} failures",
            self.pending.answers.len(),
            self.pending.failures.len()
        );

        let pending = std::mem::take(&mut self.pending);
        self.written.answers.extend(pending.answers);
        self.written.failures.extend(pending.failures);
        Ok(())
    }
}

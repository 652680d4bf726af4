//! Batch Processor
//!
//! Splits the hint search of one batch into disjoint work items, aggregates
//! the partial results per record, and starts each record's password search
//! once all of its hints are cracked.
//!
//! ## Aggregation
//! Results are matched back to records by hash value. Two indices map hint
//! hashes and password hashes to the records that carry them; both only
//! shrink. Every record runs its own password search over its own candidates.
//! The batch is complete when no password is outstanding and every submitted
//! item has reported.
//!
//! ## Hosted Items
//! Items sent through the payload transport are retained by lease until their
//! report arrives. A worker that cannot download one reports it unavailable,
//! and the retained item is submitted again.

use super::protocol::{BatchSummary, MasterHandle};
use crate::error::BatchError;
use crate::executor::pool::PoolHandle;
use crate::executor::types::{WorkItem, WorkOrder, WorkOutcome, WorkPayload, WorkReport};
use crate::hashing::types::ContentHash;
use crate::ingestion::collector::CollectorHandle;
use crate::ingestion::types::Record;
use crate::transport::lease::LeaseId;
use crate::transport::proxy::ProxyHandle;

use dashmap::DashMap;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Smallest alphabet the two-character prefix partitioning supports.
pub const MIN_ALPHABET_SIZE: usize = 4;

/// Collaborators of a batch processor.
#[derive(Clone)]
pub struct BatchContext {
    pub pool: PoolHandle<WorkOrder>,
    pub collector: CollectorHandle,
    pub master: MasterHandle,
    pub transport: Option<ProxyHandle>,
    pub max_inline_bytes: usize,
}

/// One `(prefix, choices)` pair per ordered pair of distinct alphabet
/// positions. Together the partitions cover every permutation exactly once.
pub fn hint_partitions(alphabet: &str) -> Vec<(String, String)> {
    let chars: Vec<char> = alphabet.chars().collect();
    let mut partitions = Vec::with_capacity(chars.len() * chars.len().saturating_sub(1));

    for i in 0..chars.len() {
        for j in 0..chars.len() {
            if i == j {
                continue;
            }
            let prefix: String = [chars[i], chars[j]].iter().collect();
            let choices: String = chars
                .iter()
                .enumerate()
                .filter(|(k, _)| *k != i && *k != j)
                .map(|(_, c)| *c)
                .collect();
            partitions.push((prefix, choices));
        }
    }

    partitions
}

/// Checks the batch invariants and returns the shared alphabet and length.
pub fn validate(records: &[Record]) -> Result<(String, usize), BatchError> {
    let first = records.first().ok_or(BatchError::Empty)?;
    let alphabet = first.password_chars.clone();
    let length = first.password_length;

    for record in records {
        if record.password_chars != alphabet {
            return Err(BatchError::MixedAlphabet {
                id: record.id,
                expected: alphabet,
                found: record.password_chars.clone(),
            });
        }
        if record.password_length != length {
            return Err(BatchError::MixedLength {
                id: record.id,
                expected: length,
                found: record.password_length,
            });
        }
    }

    let distinct: HashSet<char> = alphabet.chars().collect();
    if !alphabet.is_ascii()
        || alphabet.len() < MIN_ALPHABET_SIZE
        || distinct.len() != alphabet.len()
    {
        return Err(BatchError::InvalidAlphabet(alphabet));
    }
    if length == 0 {
        return Err(BatchError::InvalidLength);
    }

    Ok((alphabet, length))
}

struct WorkLog {
    record: Record,
    /// Characters that may still occur in the password.
    candidates: BTreeSet<char>,
    hints_remaining: usize,
    /// Candidate set of the password search this record submitted.
    searched_over: Option<String>,
    resolved: bool,
}

impl WorkLog {
    fn new(record: Record, distinct_hints: usize) -> Self {
        Self {
            candidates: record.password_chars.chars().collect(),
            hints_remaining: distinct_hints,
            searched_over: None,
            resolved: false,
            record,
        }
    }

    fn password_item(&self) -> WorkItem {
        WorkItem::CrackPassword {
            target: self.record.password_hash,
            choices: self.candidates.iter().collect(),
            length: self.record.password_length,
        }
    }

    fn answer_line(&self, password: &str) -> String {
        format!(
            "The password of ID={} (NAME={}) is {}",
            self.record.id, self.record.name, password
        )
    }

    fn failure_line(&self, reason: &str) -> String {
        format!(
            "Failed to crack the password of ID={} (NAME={}): {}",
            self.record.id, self.record.name, reason
        )
    }
}

pub struct BatchProcessor {
    batch_id: u64,
    alphabet: String,
    ctx: BatchContext,
    logs: Vec<WorkLog>,
    hint_index: HashMap<ContentHash, Vec<usize>>,
    password_index: HashMap<ContentHash, Vec<usize>>,
    pending_hint_items: usize,
    pending_password_items: usize,
    /// Hosted items by lease, filled in when the transport delivers them.
    hosted_items: Arc<DashMap<LeaseId, WorkItem>>,
    reports_tx: mpsc::UnboundedSender<WorkReport>,
    reports_rx: mpsc::UnboundedReceiver<WorkReport>,
    cracked: usize,
    failed: usize,
    started: Instant,
    completed: bool,
}

impl BatchProcessor {
    pub fn new(batch_id: u64, records: Vec<Record>, ctx: BatchContext) -> Result<Self, BatchError> {
        let (alphabet, _) = validate(&records)?;

        let mut logs = Vec::with_capacity(records.len());
        let mut hint_index: HashMap<ContentHash, Vec<usize>> = HashMap::new();
        let mut password_index: HashMap<ContentHash, Vec<usize>> = HashMap::new();

        for (idx, record) in records.into_iter().enumerate() {
            let hints: HashSet<ContentHash> = record.hint_hashes.iter().copied().collect();
            for hint in &hints {
                hint_index.entry(*hint).or_default().push(idx);
            }
            password_index
                .entry(record.password_hash)
                .or_default()
                .push(idx);
            logs.push(WorkLog::new(record, hints.len()));
        }

        let (reports_tx, reports_rx) = mpsc::unbounded_channel();

        Ok(Self {
            batch_id,
            alphabet,
            ctx,
            logs,
            hint_index,
            password_index,
            pending_hint_items: 0,
            pending_password_items: 0,
            hosted_items: Arc::new(DashMap::new()),
            reports_tx,
            reports_rx,
            cracked: 0,
            failed: 0,
            started: Instant::now(),
            completed: false,
        })
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        self.start();

        while !self.completed {
            match self.reports_rx.recv().await {
                Some(report) => self.handle_report(report),
                None => break,
            }
        }
    }

    /// Submits the hint search of the whole batch, and the password search of
    /// every record without hints.
    pub fn start(&mut self) {
        tracing::info!(
            "Batch {}: {} records over alphabet '{}'",
            self.batch_id,
            self.logs.len(),
            self.alphabet
        );

        let targets: HashSet<ContentHash> = self.hint_index.keys().copied().collect();
        if !targets.is_empty() {
            let partitions = hint_partitions(&self.alphabet);
            self.pending_hint_items = partitions.len();
            tracing::info!(
                "Batch {}: searching {} hint hashes in {} partitions",
                self.batch_id,
                targets.len(),
                partitions.len()
            );

            for (prefix, choices) in partitions {
                self.submit(WorkItem::CrackHints {
                    targets: targets.clone(),
                    prefix,
                    choices,
                });
            }
        }

        let hintless: Vec<usize> = (0..self.logs.len())
            .filter(|&idx| self.logs[idx].hints_remaining == 0)
            .collect();
        for idx in hintless {
            tracing::debug!(
                "Record ID={} has no hints, searching its password directly",
                self.logs[idx].record.id
            );
            self.submit_password(idx);
        }

        self.check_completion();
    }

    /// The reporting worker goes back to the pool before the outcome is processed.
    pub fn handle_report(&mut self, report: WorkReport) {
        self.ctx.pool.worker_available(report.worker);

        let retained = report
            .hosted
            .and_then(|lease| self.hosted_items.remove(&lease))
            .map(|(_, item)| item);

        match (report.outcome, retained) {
            (WorkOutcome::PayloadUnavailable { reason }, Some(item)) if !self.completed => {
                tracing::warn!(
                    "Batch {}: hosted work item lost ({}), submitting it again",
                    self.batch_id,
                    reason
                );
                self.submit(item);
            }
            (outcome, _) => self.handle_outcome(outcome),
        }
    }

    pub fn handle_outcome(&mut self, outcome: WorkOutcome) {
        if self.completed {
            tracing::warn!("Batch {} already complete, dropping result", self.batch_id);
            return;
        }

        match outcome {
            WorkOutcome::CrackedHints(cracked) => {
                self.hint_item_done();
                self.aggregate_hints(cracked);
            }
            WorkOutcome::HintsFailed { reason } | WorkOutcome::PayloadUnavailable { reason } => {
                self.hint_item_done();
                tracing::error!("Batch {}: hint search failed: {}", self.batch_id, reason);
            }
            WorkOutcome::CrackedPassword { target, password } => {
                self.password_item_done();
                self.answer(&target, &password);
            }
            WorkOutcome::PasswordFailed {
                target,
                choices,
                reason,
            } => {
                self.password_item_done();
                self.fail_search(&target, &choices, &reason);
            }
        }

        self.check_completion();
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn pending_hint_items(&self) -> usize {
        self.pending_hint_items
    }

    fn hint_item_done(&mut self) {
        match self.pending_hint_items.checked_sub(1) {
            Some(pending) => self.pending_hint_items = pending,
            None => tracing::warn!("Batch {}: unexpected hint result", self.batch_id),
        }
    }

    fn password_item_done(&mut self) {
        match self.pending_password_items.checked_sub(1) {
            Some(pending) => self.pending_password_items = pending,
            None => tracing::warn!("Batch {}: unexpected password result", self.batch_id),
        }
    }

    fn aggregate_hints(&mut self, cracked: HashMap<ContentHash, char>) {
        tracing::debug!(
            "Batch {}: aggregating {} cracked hints ({} hint items pending)",
            self.batch_id,
            cracked.len(),
            self.pending_hint_items
        );

        for (hash, missing) in cracked {
            let Some(indices) = self.hint_index.remove(&hash) else {
                continue;
            };

            for idx in indices {
                let log = &mut self.logs[idx];
                log.candidates.remove(&missing);
                log.hints_remaining = log.hints_remaining.saturating_sub(1);

                if log.hints_remaining == 0 && !log.resolved {
                    tracing::info!(
                        "All hints of ID={} (NAME={}) cracked, searching password over '{}'",
                        log.record.id,
                        log.record.name,
                        log.candidates.iter().collect::<String>()
                    );
                    self.submit_password(idx);
                }
            }
        }
    }

    /// Answers every record still waiting on `target`. A later result for the
    /// same hash finds nobody waiting and is ignored.
    fn answer(&mut self, target: &ContentHash, password: &str) {
        let Some(indices) = self.password_index.remove(target) else {
            tracing::debug!(
                "Batch {}: password hash {} already resolved",
                self.batch_id,
                target
            );
            return;
        };

        for idx in indices {
            let log = &mut self.logs[idx];
            log.resolved = true;
            self.cracked += 1;
            self.ctx.collector.collect(log.answer_line(password));
        }
    }

    /// Fails the records whose own search over `choices` came up empty.
    /// Records with the same hash but another search stay indexed.
    fn fail_search(&mut self, target: &ContentHash, choices: &str, reason: &str) {
        let Some(indices) = self.password_index.remove(target) else {
            tracing::debug!(
                "Batch {}: password hash {} already resolved",
                self.batch_id,
                target
            );
            return;
        };

        let (searched, waiting): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&idx| self.logs[idx].searched_over.as_deref() == Some(choices));
        if !waiting.is_empty() {
            self.password_index.insert(*target, waiting);
        }

        for idx in searched {
            let log = &mut self.logs[idx];
            log.resolved = true;
            tracing::error!(
                "Password search failed for record ID={} (alphabet '{}', hash {}): {}",
                log.record.id,
                log.record.password_chars,
                target,
                reason
            );
            self.failed += 1;
            self.ctx.collector.failure(log.failure_line(reason));
        }
    }

    /// Records whose hints were not all found once the hint search is over
    /// can never start their password search.
    fn fail_stalled_records(&mut self) {
        if self.pending_hint_items > 0 || self.hint_index.is_empty() {
            return;
        }

        let stalled: BTreeSet<usize> = self.hint_index.drain().flat_map(|(_, v)| v).collect();
        for idx in stalled {
            let log = &mut self.logs[idx];
            if log.resolved || log.hints_remaining == 0 {
                continue;
            }
            log.resolved = true;

            let reason = format!(
                "{} hint(s) not found among the permutations of '{}'",
                log.hints_remaining, log.record.password_chars
            );
            tracing::warn!(
                "Record ID={} (NAME={}, hash {}) stalled: {}",
                log.record.id,
                log.record.name,
                log.record.password_hash,
                reason
            );
            self.failed += 1;
            self.ctx.collector.failure(log.failure_line(&reason));

            let hash = log.record.password_hash;
            if let Some(indices) = self.password_index.get_mut(&hash) {
                indices.retain(|&i| i != idx);
                if indices.is_empty() {
                    self.password_index.remove(&hash);
                }
            }
        }
    }

    fn check_completion(&mut self) {
        self.fail_stalled_records();

        if self.completed
            || self.pending_hint_items > 0
            || self.pending_password_items > 0
            || !self.password_index.is_empty()
        {
            return;
        }
        self.completed = true;

        let summary = BatchSummary {
            batch_id: self.batch_id,
            records: self.logs.len(),
            cracked: self.cracked,
            failed: self.failed,
            elapsed: self.started.elapsed(),
        };
        tracing::info!(
            "Batch {} complete: {} cracked, {} failed in {:?}",
            summary.batch_id,
            summary.cracked,
            summary.failed,
            summary.elapsed
        );
        self.ctx.master.batch_complete(summary);
    }

    fn submit_password(&mut self, idx: usize) {
        let log = &mut self.logs[idx];
        log.searched_over = Some(log.candidates.iter().collect());
        let item = log.password_item();
        self.pending_password_items += 1;
        self.submit(item);
    }

    /// Hands an item to the pool, through the payload transport when it is
    /// too large to send inline.
    fn submit(&self, item: WorkItem) {
        let reply_to = self.reports_tx.clone();

        if let (Some(transport), WorkItem::CrackHints { .. }) = (&self.ctx.transport, &item) {
            let size = bincode::serialized_size(&item).unwrap_or(u64::MAX);
            if size > self.ctx.max_inline_bytes as u64 {
                let pool = self.ctx.pool.clone();
                let deliver_to = reply_to.clone();
                let hosted_items = self.hosted_items.clone();
                let retained = item.clone();
                let hosted = transport.host_value(
                    &item,
                    Box::new(move |payload| {
                        hosted_items.insert(payload.lease.clone(), retained);
                        pool.submit(WorkOrder {
                            payload: WorkPayload::Hosted(payload),
                            reply_to: deliver_to,
                        })
                    }),
                );
                match hosted {
                    Ok(bytes) => {
                        tracing::debug!("Work item of {} bytes handed to the transport", bytes);
                        return;
                    }
                    Err(e) => tracing::error!("Transport refused work item, sending inline: {}", e),
                }
            }
        }

        self.ctx.pool.submit(WorkOrder {
            payload: WorkPayload::Inline(item),
            reply_to,
        });
    }
}

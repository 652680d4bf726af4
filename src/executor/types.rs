use crate::cracking::combination::CombinationCracker;
use crate::cracking::permutation::PermutationCracker;
use crate::hashing::types::ContentHash;
use crate::membership::types::WorkerHandle;
use crate::transport::lease::LeaseId;
use crate::transport::protocol::PayloadRef;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;

/// The definition of a unit of search work.
///
/// Items are self-contained: results are matched back to records by hash
/// value, never by item identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WorkItem {
    /// Permutation phase: crack every hint in `targets` reachable behind `prefix`.
    CrackHints {
        targets: HashSet<ContentHash>,
        prefix: String,
        choices: String,
    },
    /// Combination phase: find the `length`-character password hashing to `target`.
    CrackPassword {
        target: ContentHash,
        choices: String,
        length: usize,
    },
}

impl WorkItem {
    /// Runs the search to completion. CPU-bound; callers should run it on a
    /// blocking thread.
    pub fn execute(self) -> WorkOutcome {
        match self {
            WorkItem::CrackHints {
                targets,
                prefix,
                choices,
            } => match PermutationCracker::new(&choices, Some(&prefix)) {
                Ok(cracker) => WorkOutcome::CrackedHints(cracker.crack(&targets)),
                Err(e) => WorkOutcome::HintsFailed {
                    reason: e.to_string(),
                },
            },
            WorkItem::CrackPassword {
                target,
                choices,
                length,
            } => match CombinationCracker::new(&choices, length).and_then(|c| c.crack(&target)) {
                Ok(password) => WorkOutcome::CrackedPassword { target, password },
                Err(e) => WorkOutcome::PasswordFailed {
                    target,
                    choices,
                    reason: e.to_string(),
                },
            },
        }
    }

    /// The outcome reported when this item could not be run at all.
    pub fn failed(&self, reason: String) -> WorkOutcome {
        match self {
            WorkItem::CrackHints { .. } => WorkOutcome::HintsFailed { reason },
            WorkItem::CrackPassword {
                target, choices, ..
            } => WorkOutcome::PasswordFailed {
                target: *target,
                choices: choices.clone(),
                reason,
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            WorkItem::CrackHints {
                targets,
                prefix,
                choices,
            } => format!(
                "hint search over {} hash(es) with prefix '{}' and choices '{}'",
                targets.len(),
                prefix,
                choices
            ),
            WorkItem::CrackPassword {
                target,
                choices,
                length,
            } => format!(
                "password search for {} ({} characters over '{}')",
                target, length, choices
            ),
        }
    }
}

/// How the item reaches the worker.
#[derive(Debug, Clone)]
pub enum WorkPayload {
    Inline(WorkItem),
    /// A hint item hosted by the payload transport.
    Hosted(PayloadRef),
}

/// What the worker pool carries: the payload plus the address the result
/// goes back to.
#[derive(Debug, Clone)]
pub struct WorkOrder {
    pub payload: WorkPayload,
    pub reply_to: mpsc::UnboundedSender<WorkReport>,
}

pub type WorkerRef = WorkerHandle<WorkOrder>;

#[derive(Debug, Clone, PartialEq)]
pub enum WorkOutcome {
    /// Hint hash -> character withheld from that hint.
    CrackedHints(HashMap<ContentHash, char>),
    CrackedPassword {
        target: ContentHash,
        password: String,
    },
    HintsFailed {
        reason: String,
    },
    /// The search over `choices` found nothing.
    PasswordFailed {
        target: ContentHash,
        choices: String,
        reason: String,
    },
    /// A hosted item could not be downloaded. The item itself was never run.
    PayloadUnavailable {
        reason: String,
    },
}

/// A worker's result. Receiving one also means the worker is free again.
#[derive(Debug)]
pub struct WorkReport {
    pub worker: WorkerRef,
    pub outcome: WorkOutcome,
    /// Lease of the hosted payload the item came from.
    pub hosted: Option<LeaseId>,
}

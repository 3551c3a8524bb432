//! Client-side view of a document OCR job.
//!
//! The service owns the job; the client only ever sees snapshots returned
//! by queries. [`JobTracker`] folds those snapshots together so that
//! overlapping queries cannot move progress backwards, a terminal state
//! stays terminal, and entries delivered by "unread" queries accumulate
//! in one place.

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{DataFormat, Dict, DocQueryResult, JobState};

/// Last observed status of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub state: JobState,
    pub processed_count: u32,
    pub pages_count: u32,
    pub is_done: bool,
    pub message: Option<String>,
}

impl JobSnapshot {
    pub fn from_result<F: DataFormat>(result: &DocQueryResult<F>) -> Self {
        Self {
            state: result.state,
            processed_count: result.processed_count,
            pages_count: result.pages_count,
            is_done: result.is_done,
            message: result.message.clone(),
        }
    }

    /// Fraction of pages processed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.pages_count == 0 {
            return if self.is_done { 1.0 } else { 0.0 };
        }
        f64::from(self.processed_count.min(self.pages_count)) / f64::from(self.pages_count)
    }

    pub fn failure(&self) -> Option<&str> {
        (self.state == JobState::Failure).then(|| self.message.as_deref().unwrap_or_default())
    }
}

/// Outcome of folding one query response into a [`JobTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The snapshot was accepted as the most current one.
    Updated { new_entries: usize },
    /// The response was older than what had already been seen. Its entries
    /// were still kept, its status was not.
    Stale { new_entries: usize },
    /// The service answered with a non-success code; nothing changed.
    Rejected { code: i64, reason: String },
}

/// Accumulates the status and results of one job across queries.
#[derive(Debug, Clone)]
pub struct JobTracker<F: DataFormat = Dict> {
    id: String,
    snapshot: Option<JobSnapshot>,
    entries: Vec<F::DocEntry>,
}

impl<F: DataFormat> JobTracker<F> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            snapshot: None,
            entries: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn snapshot(&self) -> Option<&JobSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn state(&self) -> Option<JobState> {
        self.snapshot.as_ref().map(|s| s.state)
    }

    pub fn is_done(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| s.is_done)
    }

    /// Entries received so far, in delivery order.
    pub fn entries(&self) -> &[F::DocEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<F::DocEntry> {
        self.entries
    }

    /// Folds a query response into the tracker.
    ///
    /// `unread` must match the `is_unread` flag of the query that produced
    /// `result`: unread entries are appended, a full listing replaces what
    /// was accumulated unless it is shorter.
    pub fn observe(&mut self, result: &DocQueryResult<F>, unread: bool) -> Observation {
        if !result.is_success() {
            let reason = result.data.message().unwrap_or_default().to_string();
            warn!(job_id = %self.id, code = result.code, %reason, "Job query rejected");
            return Observation::Rejected {
                code: result.code,
                reason,
            };
        }

        let new_entries = self.merge_entries(result.entries(), unread);
        let incoming = JobSnapshot::from_result(result);

        let stale = match &self.snapshot {
            Some(current) => is_stale(current, &incoming),
            None => false,
        };
        if stale {
            debug!(
                job_id = %self.id,
                processed = incoming.processed_count,
                "Ignoring out-of-date job status"
            );
            return Observation::Stale { new_entries };
        }

        if let Some(current) = &self.snapshot {
            if current.pages_count != 0 && current.pages_count != incoming.pages_count {
                warn!(
                    job_id = %self.id,
                    before = current.pages_count,
                    after = incoming.pages_count,
                    "Page count changed between queries"
                );
            }
        }

        self.snapshot = Some(incoming);
        Observation::Updated { new_entries }
    }

    fn merge_entries(&mut self, incoming: &[F::DocEntry], unread: bool) -> usize {
        if unread {
            self.entries.extend_from_slice(incoming);
            incoming.len()
        } else if incoming.len() >= self.entries.len() {
            let added = incoming.len() - self.entries.len();
            self.entries = incoming.to_vec();
            added
        } else {
            0
        }
    }
}

fn is_stale(current: &JobSnapshot, incoming: &JobSnapshot) -> bool {
    if current.is_done {
        // terminal state is latched; only an identical terminal report counts
        return !(incoming.is_done && incoming.state == current.state)
            || incoming.processed_count < current.processed_count;
    }
    incoming.processed_count < current.processed_count
}

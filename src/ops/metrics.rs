//! Evacuation request metrics.
//!
//! Namespaces:
//! - bulletin.evacuation.requests.<operation>
//! - bulletin.evacuation.errors.<error_type>
//! - bulletin.evacuation.escalations

use crate::core::error::ErrorType;
use crate::evacuation::kind::EvacuationKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters shared by every in-flight request.
#[derive(Debug, Default)]
pub struct EvacuationMetrics {
    requests: [AtomicU64; EvacuationKind::ALL.len()],
    errors: [AtomicU64; ErrorType::ALL.len()],
    keep_container: AtomicU64,
    escalations: AtomicU64,
}

impl EvacuationMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed request.
    pub fn record(&self, kind: EvacuationKind, error: Option<ErrorType>, keep_container: bool) {
        self.requests[kind.ordinal()].fetch_add(1, Ordering::Relaxed);
        if let Some(error_type) = error {
            self.errors[error_type.code() as usize].fetch_add(1, Ordering::Relaxed);
        }
        if keep_container {
            self.keep_container.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an escalation signal.
    pub fn record_escalation(&self) {
        self.escalations.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests handled for `kind`.
    pub fn requests(&self, kind: EvacuationKind) -> u64 {
        self.requests[kind.ordinal()].load(Ordering::Relaxed)
    }

    /// Errors reported with `error_type`.
    pub fn errors(&self, error_type: ErrorType) -> u64 {
        self.errors[error_type.code() as usize].load(Ordering::Relaxed)
    }

    /// Escalation signals emitted.
    pub fn escalations(&self) -> u64 {
        self.escalations.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: EvacuationKind::ALL
                .into_iter()
                .map(|kind| (kind.session().to_string(), self.requests(kind)))
                .collect(),
            errors: ErrorType::ALL
                .into_iter()
                .map(|error_type| (error_type.as_str().to_string(), self.errors(error_type)))
                .collect(),
            keep_container: self.keep_container.load(Ordering::Relaxed),
            escalations: self.escalations(),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Requests per operation.
    pub requests: BTreeMap<String, u64>,
    /// Errors per classification.
    pub errors: BTreeMap<String, u64>,
    /// Responses that told the cell to keep its container.
    pub keep_container: u64,
    /// Escalation signals emitted.
    pub escalations: u64,
}

impl MetricsSnapshot {
    /// Total requests across operations.
    pub fn total_requests(&self) -> u64 {
        self.requests.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = EvacuationMetrics::new();
        metrics.record(EvacuationKind::Running, None, true);
        metrics.record(EvacuationKind::Running, Some(ErrorType::Unrecoverable), true);
        metrics.record(EvacuationKind::Stopped, Some(ErrorType::ResourceNotFound), false);
        metrics.record_escalation();

        assert_eq!(metrics.requests(EvacuationKind::Running), 2);
        assert_eq!(metrics.errors(ErrorType::Unrecoverable), 1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests(), 3);
        assert_eq!(snapshot.keep_container, 2);
        assert_eq!(snapshot.escalations, 1);
        assert_eq!(snapshot.errors["ResourceNotFound"], 1);
        assert_eq!(snapshot.requests["evacuate-running-actual-lrp"], 2);
    }
}

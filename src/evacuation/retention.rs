//! Keep-container policy per evacuation operation.
//!
//! The policies do not follow a common rule, so they are kept as a table:
//!
//! | Operation        | Before call | Invalid request | Controller decides |
//! |------------------|-------------|-----------------|--------------------|
//! | RemoveEvacuating | n/a         | n/a             | no                 |
//! | Claimed          | discard     | **keep**        | yes                |
//! | Crashed          | n/a         | n/a             | no                 |
//! | Running          | keep        | keep            | yes                |
//! | Stopped          | n/a         | n/a             | no                 |
//!
//! Where the controller decides, its decision stands even when the call
//! fails.

use super::kind::EvacuationKind;

/// Keep-container value at one stage of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// The operation has no container decision; reported as `false`.
    NotApplicable,
    /// The cell may destroy the container.
    Discard,
    /// The cell must keep the container.
    Keep,
}

impl Retention {
    /// Wire value of this retention.
    pub fn keep_container(self) -> bool {
        matches!(self, Self::Keep)
    }

    fn from_decision(keep: bool) -> Self {
        if keep {
            Self::Keep
        } else {
            Self::Discard
        }
    }
}

/// How a request ended, as far as retention is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionOutcome {
    /// Decoding or validation failed; the controller was not called.
    InvalidRequest,
    /// The controller returned an error without a retention decision.
    ControllerFailed,
    /// The controller succeeded without a retention decision.
    Completed,
    /// The controller decided retention, with or without an error.
    Decided(bool),
}

/// Retention rules for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Value set before the controller is invoked.
    pub before_invocation: Retention,
    /// Value reported when the request is invalid.
    pub on_invalid_request: Retention,
    /// Whether the controller's decision replaces the earlier value.
    pub adopts_controller_decision: bool,
}

const NO_CONTAINER: RetentionPolicy = RetentionPolicy {
    before_invocation: Retention::NotApplicable,
    on_invalid_request: Retention::NotApplicable,
    adopts_controller_decision: false,
};

const CLAIMED: RetentionPolicy = RetentionPolicy {
    before_invocation: Retention::Discard,
    on_invalid_request: Retention::Keep,
    adopts_controller_decision: true,
};

const RUNNING: RetentionPolicy = RetentionPolicy {
    before_invocation: Retention::Keep,
    on_invalid_request: Retention::Keep,
    adopts_controller_decision: true,
};

impl RetentionPolicy {
    /// Policy for an operation.
    pub const fn for_kind(kind: EvacuationKind) -> Self {
        match kind {
            EvacuationKind::RemoveEvacuating => NO_CONTAINER,
            EvacuationKind::Claimed => CLAIMED,
            EvacuationKind::Crashed => NO_CONTAINER,
            EvacuationKind::Running => RUNNING,
            EvacuationKind::Stopped => NO_CONTAINER,
        }
    }

    /// Whether the operation has any container decision at all.
    pub fn has_container_decision(&self) -> bool {
        self.adopts_controller_decision
    }

    /// Resolve the retention reported for `outcome`.
    pub fn resolve(&self, outcome: RetentionOutcome) -> Retention {
        match outcome {
            RetentionOutcome::InvalidRequest => self.on_invalid_request,
            RetentionOutcome::ControllerFailed | RetentionOutcome::Completed => {
                self.before_invocation
            }
            RetentionOutcome::Decided(keep) if self.adopts_controller_decision => {
                Retention::from_decision(keep)
            }
            RetentionOutcome::Decided(_) => self.before_invocation,
        }
    }

    /// Wire value reported for `outcome`.
    pub fn keep_container(&self, outcome: RetentionOutcome) -> bool {
        self.resolve(outcome).keep_container()
    }
}

impl EvacuationKind {
    /// Retention policy for this operation.
    pub fn retention_policy(self) -> RetentionPolicy {
        RetentionPolicy::for_kind(self)
    }
}

//! Controller port.
//!
//! The dispatcher depends only on this trait; the authoritative store behind
//! it is supplied at construction. Claimed and Running return a
//! [`ContainerDecision`]: the controller states whether the cell keeps the
//! container even when the call fails.

use crate::core::error::{EvacuationError, EvacuationResult};
use crate::models::{ActualLrpInstanceKey, ActualLrpKey, ActualLrpNetInfo};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by controller operations without a retention decision.
pub type ControllerFuture<'a, T> = Pin<Box<dyn Future<Output = EvacuationResult<T>> + Send + 'a>>;

/// Boxed future returned by controller operations that decide retention.
pub type DecisionFuture<'a> = Pin<Box<dyn Future<Output = ContainerDecision> + Send + 'a>>;

/// Outcome of Claimed and Running: an optional failure plus the retention
/// decision, which is meaningful in both cases.
#[derive(Debug, Clone)]
pub struct ContainerDecision {
    pub error: Option<EvacuationError>,
    pub keep_container: bool,
}

impl ContainerDecision {
    pub fn succeeded(keep_container: bool) -> Self {
        Self {
            error: None,
            keep_container,
        }
    }

    pub fn failed(error: EvacuationError, keep_container: bool) -> Self {
        Self {
            error: Some(error),
            keep_container,
        }
    }

    /// Take the decision from `result`, or `keep_on_error` if it failed.
    pub fn from_result(result: EvacuationResult<bool>, keep_on_error: bool) -> Self {
        match result {
            Ok(keep_container) => Self::succeeded(keep_container),
            Err(err) => Self::failed(err, keep_on_error),
        }
    }
}

/// Store-side handling of the five evacuation events.
pub trait EvacuationController: Send + Sync {
    /// Drop the evacuating record held for `instance_key`.
    fn remove_evacuating_actual_lrp<'a>(
        &'a self,
        key: &'a ActualLrpKey,
        instance_key: &'a ActualLrpInstanceKey,
    ) -> ControllerFuture<'a, ()>;

    /// Release a claimed instance and decide whether the cell keeps the container.
    fn evacuate_claimed_actual_lrp<'a>(
        &'a self,
        key: &'a ActualLrpKey,
        instance_key: &'a ActualLrpInstanceKey,
    ) -> DecisionFuture<'a>;

    /// Record a crash observed while evacuating.
    fn evacuate_crashed_actual_lrp<'a>(
        &'a self,
        key: &'a ActualLrpKey,
        instance_key: &'a ActualLrpInstanceKey,
        error_message: &'a str,
    ) -> ControllerFuture<'a, ()>;

    /// Evacuate a running instance and decide whether the cell keeps the container.
    fn evacuate_running_actual_lrp<'a>(
        &'a self,
        key: &'a ActualLrpKey,
        instance_key: &'a ActualLrpInstanceKey,
        net_info: &'a ActualLrpNetInfo,
    ) -> DecisionFuture<'a>;

    /// Remove the records of an instance the cell has stopped.
    fn evacuate_stopped_actual_lrp<'a>(
        &'a self,
        key: &'a ActualLrpKey,
        instance_key: &'a ActualLrpInstanceKey,
    ) -> ControllerFuture<'a, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_takes_fallback_decision() {
        let decision = ContainerDecision::from_result(Err(EvacuationError::internal("boom")), true);
        assert!(decision.error.is_some());
        assert!(decision.keep_container);

        let decision = ContainerDecision::from_result(Ok(false), true);
        assert!(decision.error.is_none());
        assert!(!decision.keep_container);
    }
}

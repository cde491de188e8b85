//! Evacuation controller backed by the instance store.
//!
//! On failure Claimed reports `keep_container = false` and Running reports
//! `true`, so a running workload is not dropped on an unknown store state.

use super::instances::{ActualLrpGroup, ActualLrpState, InstanceStore};
use crate::core::error::{EvacuationError, EvacuationResult};
use crate::evacuation::controller::{
    ContainerDecision, ControllerFuture, DecisionFuture, EvacuationController,
};
use crate::models::{ActualLrpInstanceKey, ActualLrpKey, ActualLrpNetInfo};
use std::sync::Arc;

/// Applies evacuation events to an [`InstanceStore`].
#[derive(Debug, Clone)]
pub struct StoreEvacuationController {
    store: Arc<InstanceStore>,
}

impl StoreEvacuationController {
    pub fn new(store: Arc<InstanceStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<InstanceStore> {
        &self.store
    }

    /// Drop the evacuating record if `instance_key` owns it.
    fn drop_evacuating(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
    ) -> EvacuationResult<()> {
        match self.store.remove_evacuating(key, instance_key) {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        }
    }

    fn claimed(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
    ) -> EvacuationResult<bool> {
        self.drop_evacuating(key, instance_key)?;
        match self.store.unclaim(key, instance_key) {
            Ok(_) => Ok(false),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn crashed(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
        error_message: &str,
    ) -> EvacuationResult<()> {
        self.drop_evacuating(key, instance_key)?;
        match self.store.crash(key, instance_key, error_message) {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn running(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
        net_info: &ActualLrpNetInfo,
    ) -> EvacuationResult<bool> {
        let Some(ActualLrpGroup { instance, .. }) =
            self.store.group(&key.process_guid, key.index)?
        else {
            tracing::info!(process_guid = %key.process_guid, index = key.index, "actual lrp not found");
            return Ok(false);
        };

        let Some(instance) = instance else {
            self.drop_evacuating(key, instance_key)?;
            return Ok(false);
        };

        let owned = instance.is_owned_by(instance_key);
        match instance.state {
            ActualLrpState::Claimed | ActualLrpState::Running if owned => {
                self.store.evacuate_and_unclaim(key, instance_key, net_info)?;
                Ok(true)
            }
            // Claimed here means claimed by another instance.
            ActualLrpState::Unclaimed | ActualLrpState::Claimed => {
                self.keep_evacuating(key, instance_key, net_info)
            }
            ActualLrpState::Running | ActualLrpState::Crashed => {
                self.drop_evacuating(key, instance_key)?;
                Ok(false)
            }
        }
    }

    /// Keep serving from the evacuating cell while the replacement is pending.
    fn keep_evacuating(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
        net_info: &ActualLrpNetInfo,
    ) -> EvacuationResult<bool> {
        match self.store.evacuate(key, instance_key, net_info) {
            Ok(()) => Ok(true),
            Err(EvacuationError::CannotBeEvacuated { .. }) => {
                tracing::info!(
                    process_guid = %key.process_guid,
                    index = key.index,
                    "evacuating record held by another instance"
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    fn stopped(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
    ) -> EvacuationResult<()> {
        match self.store.remove_instance(key, instance_key) {
            Err(err) if err.is_not_found() => self.store.remove_evacuating(key, instance_key),
            other => other,
        }
    }
}

impl EvacuationController for StoreEvacuationController {
    fn remove_evacuating_actual_lrp<'a>(
        &'a self,
        key: &'a ActualLrpKey,
        instance_key: &'a ActualLrpInstanceKey,
    ) -> ControllerFuture<'a, ()> {
        Box::pin(async move { self.store.remove_evacuating(key, instance_key) })
    }

    fn evacuate_claimed_actual_lrp<'a>(
        &'a self,
        key: &'a ActualLrpKey,
        instance_key: &'a ActualLrpInstanceKey,
    ) -> DecisionFuture<'a> {
        Box::pin(async move {
            ContainerDecision::from_result(self.claimed(key, instance_key), false)
        })
    }

    fn evacuate_crashed_actual_lrp<'a>(
        &'a self,
        key: &'a ActualLrpKey,
        instance_key: &'a ActualLrpInstanceKey,
        error_message: &'a str,
    ) -> ControllerFuture<'a, ()> {
        Box::pin(async move { self.crashed(key, instance_key, error_message) })
    }

    fn evacuate_running_actual_lrp<'a>(
        &'a self,
        key: &'a ActualLrpKey,
        instance_key: &'a ActualLrpInstanceKey,
        net_info: &'a ActualLrpNetInfo,
    ) -> DecisionFuture<'a> {
        Box::pin(async move {
            ContainerDecision::from_result(self.running(key, instance_key, net_info), true)
        })
    }

    fn evacuate_stopped_actual_lrp<'a>(
        &'a self,
        key: &'a ActualLrpKey,
        instance_key: &'a ActualLrpInstanceKey,
    ) -> ControllerFuture<'a, ()> {
        Box::pin(async move { self.stopped(key, instance_key) })
    }
}

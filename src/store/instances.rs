//! In-memory actual LRP groups.
//!
//! Each (process_guid, index) holds at most one *instance* record and one
//! *evacuating* record. The evacuating record carries an expiry; once it
//! passes, the record is invisible to every read and write.

use crate::core::error::{EvacuationError, EvacuationResult};
use crate::models::{ActualLrpInstanceKey, ActualLrpKey, ActualLrpNetInfo};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Crashes that are restarted immediately before an instance stays crashed.
pub const IMMEDIATE_RESTARTS: u32 = 3;

/// Lifecycle state of an actual LRP record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActualLrpState {
    Unclaimed,
    Claimed,
    Running,
    Crashed,
}

impl ActualLrpState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unclaimed => "UNCLAIMED",
            Self::Claimed => "CLAIMED",
            Self::Running => "RUNNING",
            Self::Crashed => "CRASHED",
        }
    }
}

impl std::fmt::Display for ActualLrpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One actual LRP record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualLrp {
    pub key: ActualLrpKey,
    /// Owner of the record; `None` while unclaimed.
    pub instance_key: Option<ActualLrpInstanceKey>,
    pub state: ActualLrpState,
    pub net_info: Option<ActualLrpNetInfo>,
    pub crash_count: u32,
    pub crash_reason: Option<String>,
}

impl ActualLrp {
    fn unclaimed(key: ActualLrpKey) -> Self {
        Self {
            key,
            instance_key: None,
            state: ActualLrpState::Unclaimed,
            net_info: None,
            crash_count: 0,
            crash_reason: None,
        }
    }

    /// Whether `instance_key` owns this record.
    pub fn is_owned_by(&self, instance_key: &ActualLrpInstanceKey) -> bool {
        self.instance_key.as_ref() == Some(instance_key)
    }

    fn release(&mut self) {
        self.instance_key = None;
        self.state = ActualLrpState::Unclaimed;
        self.net_info = None;
    }
}

/// Visible records for one (process_guid, index).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualLrpGroup {
    pub instance: Option<ActualLrp>,
    pub evacuating: Option<ActualLrp>,
}

#[derive(Debug)]
struct Evacuating {
    lrp: ActualLrp,
    expires_at: Instant,
}

impl Evacuating {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Default)]
struct GroupEntry {
    instance: Option<ActualLrp>,
    evacuating: Option<Evacuating>,
}

impl GroupEntry {
    fn live_evacuating(&self, now: Instant) -> Option<&ActualLrp> {
        self.evacuating
            .as_ref()
            .filter(|evacuating| evacuating.is_live(now))
            .map(|evacuating| &evacuating.lrp)
    }

    fn is_empty(&self, now: Instant) -> bool {
        self.instance.is_none() && self.live_evacuating(now).is_none()
    }
}

type GroupId = (String, i32);

fn group_id(key: &ActualLrpKey) -> GroupId {
    (key.process_guid.clone(), key.index)
}

#[derive(Debug, Default)]
struct StoreState {
    groups: HashMap<GroupId, GroupEntry>,
    start_requests: Vec<ActualLrpKey>,
    poisoned: Option<String>,
}

impl StoreState {
    fn check_poison(&self) -> EvacuationResult<()> {
        match &self.poisoned {
            Some(reason) => Err(EvacuationError::unrecoverable(reason.clone())),
            None => Ok(()),
        }
    }

    fn instance_mut(&mut self, key: &ActualLrpKey) -> EvacuationResult<&mut ActualLrp> {
        self.groups
            .get_mut(&group_id(key))
            .and_then(|entry| entry.instance.as_mut())
            .ok_or_else(|| EvacuationError::not_found(&key.process_guid, key.index))
    }

    fn prune(&mut self, key: &ActualLrpKey, now: Instant) {
        let id = group_id(key);
        if self.groups.get(&id).is_some_and(|entry| entry.is_empty(now)) {
            self.groups.remove(&id);
        }
    }

    /// Drop expired evacuating records and the groups they leave empty.
    fn prune_expired(&mut self, now: Instant) {
        self.groups.retain(|_, entry| {
            if entry.evacuating.as_ref().is_some_and(|e| !e.is_live(now)) {
                entry.evacuating = None;
            }
            entry.instance.is_some() || entry.evacuating.is_some()
        });
    }

    fn write_evacuating(
        &mut self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
        net_info: &ActualLrpNetInfo,
        now: Instant,
        expires_at: Instant,
    ) -> EvacuationResult<()> {
        let entry = self.groups.entry(group_id(key)).or_default();
        if let Some(existing) = entry.live_evacuating(now) {
            if !existing.is_owned_by(instance_key) {
                return Err(EvacuationError::CannotBeEvacuated {
                    process_guid: key.process_guid.clone(),
                    index: key.index,
                });
            }
        }

        let crash_count = entry.instance.as_ref().map_or(0, |lrp| lrp.crash_count);
        entry.evacuating = Some(Evacuating {
            lrp: ActualLrp {
                key: key.clone(),
                instance_key: Some(instance_key.clone()),
                state: ActualLrpState::Running,
                net_info: Some(net_info.clone()),
                crash_count,
                crash_reason: None,
            },
            expires_at,
        });
        Ok(())
    }

    fn release_held(
        &mut self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
    ) -> EvacuationResult<bool> {
        let lrp = self.instance_mut(key)?;
        let held = matches!(lrp.state, ActualLrpState::Claimed | ActualLrpState::Running)
            && lrp.is_owned_by(instance_key);
        if !held {
            return Ok(false);
        }
        lrp.release();
        self.start_requests.push(key.clone());
        tracing::debug!(process_guid = %key.process_guid, index = key.index, "unclaimed");
        Ok(true)
    }
}

/// Authoritative actual LRP state.
///
/// Locks are held only for the duration of one synchronous call.
#[derive(Debug)]
pub struct InstanceStore {
    state: RwLock<StoreState>,
    evacuation_timeout: Duration,
}

impl InstanceStore {
    /// Create an empty store; evacuating records live for `evacuation_timeout`.
    pub fn new(evacuation_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            evacuation_timeout,
        }
    }

    pub fn evacuation_timeout(&self) -> Duration {
        self.evacuation_timeout
    }

    /// Create an unclaimed instance for `key`.
    pub fn desire(&self, key: &ActualLrpKey) -> EvacuationResult<()> {
        let mut state = self.state.write();
        state.check_poison()?;
        let entry = state.groups.entry(group_id(key)).or_default();
        if entry.instance.is_some() {
            return Err(EvacuationError::conflict(format!(
                "actual lrp {}/{} already exists",
                key.process_guid, key.index
            )));
        }
        entry.instance = Some(ActualLrp::unclaimed(key.clone()));
        Ok(())
    }

    /// Claim the instance for `instance_key`.
    pub fn claim(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
    ) -> EvacuationResult<()> {
        let mut state = self.state.write();
        state.check_poison()?;
        let lrp = state.instance_mut(key)?;
        match lrp.state {
            ActualLrpState::Unclaimed => {}
            ActualLrpState::Claimed if lrp.is_owned_by(instance_key) => return Ok(()),
            other => {
                return Err(EvacuationError::conflict(format!(
                    "cannot claim actual lrp in state {other}"
                )))
            }
        }
        lrp.instance_key = Some(instance_key.clone());
        lrp.state = ActualLrpState::Claimed;
        Ok(())
    }

    /// Mark the instance running on `instance_key`.
    pub fn start(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
        net_info: &ActualLrpNetInfo,
    ) -> EvacuationResult<()> {
        let mut state = self.state.write();
        state.check_poison()?;
        let lrp = state.instance_mut(key)?;
        let startable = match lrp.state {
            ActualLrpState::Unclaimed => true,
            ActualLrpState::Claimed | ActualLrpState::Running => lrp.is_owned_by(instance_key),
            ActualLrpState::Crashed => false,
        };
        if !startable {
            return Err(EvacuationError::conflict(format!(
                "cannot start actual lrp in state {}",
                lrp.state
            )));
        }
        lrp.instance_key = Some(instance_key.clone());
        lrp.state = ActualLrpState::Running;
        lrp.net_info = Some(net_info.clone());
        Ok(())
    }

    /// Release the instance held by `instance_key` and queue a start request.
    ///
    /// Returns `false` when the instance is not claimed or running on
    /// `instance_key`.
    pub fn unclaim(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
    ) -> EvacuationResult<bool> {
        let mut state = self.state.write();
        state.check_poison()?;
        state.release_held(key, instance_key)
    }

    /// Record a crash of the instance held by `instance_key`.
    ///
    /// The first [`IMMEDIATE_RESTARTS`] crashes reschedule the instance; later
    /// ones leave it crashed. Returns `false` when `instance_key` does not own
    /// the instance.
    pub fn crash(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
        reason: &str,
    ) -> EvacuationResult<bool> {
        let mut state = self.state.write();
        state.check_poison()?;
        let lrp = state.instance_mut(key)?;
        let held = matches!(lrp.state, ActualLrpState::Claimed | ActualLrpState::Running)
            && lrp.is_owned_by(instance_key);
        if !held {
            return Ok(false);
        }

        lrp.crash_count += 1;
        lrp.crash_reason = Some(reason.to_string());
        let restart = lrp.crash_count <= IMMEDIATE_RESTARTS;
        if restart {
            lrp.release();
        } else {
            lrp.state = ActualLrpState::Crashed;
            lrp.net_info = None;
        }
        let crash_count = lrp.crash_count;
        if restart {
            state.start_requests.push(key.clone());
        }
        tracing::info!(
            process_guid = %key.process_guid,
            index = key.index,
            crash_count,
            restart,
            "crashed"
        );
        Ok(true)
    }

    /// Write the evacuating record for `instance_key`.
    ///
    /// Fails with `CannotBeEvacuated` when a live evacuating record belongs to
    /// another instance.
    pub fn evacuate(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
        net_info: &ActualLrpNetInfo,
    ) -> EvacuationResult<()> {
        let now = Instant::now();
        let expires_at = now + self.evacuation_timeout;
        let mut state = self.state.write();
        state.check_poison()?;
        state.prune_expired(now);
        state.write_evacuating(key, instance_key, net_info, now, expires_at)
    }

    /// Write the evacuating record for `instance_key` and release the
    /// instance it holds, as one update.
    ///
    /// Returns whether the instance was released. Nothing changes when the
    /// instance is missing or the evacuating record belongs to another
    /// instance.
    pub fn evacuate_and_unclaim(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
        net_info: &ActualLrpNetInfo,
    ) -> EvacuationResult<bool> {
        let now = Instant::now();
        let expires_at = now + self.evacuation_timeout;
        let mut state = self.state.write();
        state.check_poison()?;
        state.prune_expired(now);
        state.instance_mut(key)?;
        state.write_evacuating(key, instance_key, net_info, now, expires_at)?;
        state.release_held(key, instance_key)
    }

    /// Remove the live evacuating record owned by `instance_key`.
    pub fn remove_evacuating(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
    ) -> EvacuationResult<()> {
        let now = Instant::now();
        let mut state = self.state.write();
        state.check_poison()?;
        let owned = state
            .groups
            .get(&group_id(key))
            .and_then(|entry| entry.live_evacuating(now))
            .is_some_and(|lrp| lrp.is_owned_by(instance_key));
        if !owned {
            return Err(EvacuationError::not_found(&key.process_guid, key.index));
        }
        if let Some(entry) = state.groups.get_mut(&group_id(key)) {
            entry.evacuating = None;
        }
        state.prune(key, now);
        Ok(())
    }

    /// Remove the instance record owned by `instance_key`.
    pub fn remove_instance(
        &self,
        key: &ActualLrpKey,
        instance_key: &ActualLrpInstanceKey,
    ) -> EvacuationResult<()> {
        let now = Instant::now();
        let mut state = self.state.write();
        state.check_poison()?;
        let lrp = state.instance_mut(key)?;
        if !lrp.is_owned_by(instance_key) {
            return Err(EvacuationError::not_found(&key.process_guid, key.index));
        }
        if let Some(entry) = state.groups.get_mut(&group_id(key)) {
            entry.instance = None;
        }
        state.prune(key, now);
        Ok(())
    }

    /// Visible records for `(process_guid, index)`, or `None` if both are absent.
    pub fn group(&self, process_guid: &str, index: i32) -> EvacuationResult<Option<ActualLrpGroup>> {
        let now = Instant::now();
        let mut state = self.state.write();
        state.check_poison()?;
        state.prune_expired(now);
        let group = state
            .groups
            .get(&(process_guid.to_string(), index))
            .filter(|entry| !entry.is_empty(now))
            .map(|entry| ActualLrpGroup {
                instance: entry.instance.clone(),
                evacuating: entry.live_evacuating(now).cloned(),
            });
        Ok(group)
    }

    /// Drain queued start requests.
    pub fn take_start_requests(&self) -> Vec<ActualLrpKey> {
        std::mem::take(&mut self.state.write().start_requests)
    }

    /// Fail every later call with `Unrecoverable`.
    pub fn poison(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(reason = %reason, "instance store poisoned");
        self.state.write().poisoned = Some(reason);
    }

    pub fn is_poisoned(&self) -> bool {
        self.state.read().poisoned.is_some()
    }

    /// Number of groups with at least one visible record.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.state
            .read()
            .groups
            .values()
            .filter(|entry| !entry.is_empty(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InstanceStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

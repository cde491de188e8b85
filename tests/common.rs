//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.

#![allow(dead_code)]

use bulletin::core::error::{EvacuationError, EvacuationResult};
use bulletin::evacuation::{
    ContainerDecision, ControllerFuture, DecisionFuture, EvacuationController, EvacuationHandler,
    ExitSink,
};
use bulletin::models::{
    ActualLrpInstanceKey, ActualLrpKey, ActualLrpNetInfo, ErrorMessage,
    EvacuateClaimedActualLrpRequest, EvacuateCrashedActualLrpRequest,
    EvacuateRunningActualLrpRequest, EvacuateStoppedActualLrpRequest, EvacuationResponse,
    PortMapping, RemoveEvacuatingActualLrpRequest,
};
use bulletin::EvacuationKind;
use parking_lot::Mutex;
use prost::Message;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

// ============================================================================
// Config files
// ============================================================================

/// Create a minimal valid configuration file.
pub fn create_minimal_config() -> NamedTempFile {
    let config_content = r#"
[listener]
bind = "127.0.0.1:0"
"#;

    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(config_content.as_bytes())
        .expect("Failed to write config");
    file
}

/// Create a configuration with custom settings.
pub fn create_config_with_settings(bind: &str, capacity: usize, log_level: &str) -> NamedTempFile {
    let config_content = format!(
        r#"
[listener]
bind = "{}"
max_body_bytes = 4096

[evacuation]
timeout_seconds = 30

[escalation]
capacity = {}

[telemetry]
log_level = "{}"
"#,
        bind, capacity, log_level
    );

    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(config_content.as_bytes())
        .expect("Failed to write config");
    file
}

// ============================================================================
// Requests
// ============================================================================

pub fn lrp_key() -> ActualLrpKey {
    ActualLrpKey::new("process-guid", 1, "cf-apps")
}

pub fn instance_key(cell: &str) -> ActualLrpInstanceKey {
    ActualLrpInstanceKey::new(format!("instance-{cell}"), cell)
}

pub fn net_info() -> ActualLrpNetInfo {
    ActualLrpNetInfo::new(
        "10.0.0.7",
        vec![PortMapping {
            container_port: 8080,
            host_port: 61001,
        }],
    )
}

/// A valid encoded request for `kind`, sent by `cell`.
pub fn valid_request_from(kind: EvacuationKind, cell: &str) -> Vec<u8> {
    let key = Some(lrp_key());
    let instance = Some(instance_key(cell));
    match kind {
        EvacuationKind::RemoveEvacuating => RemoveEvacuatingActualLrpRequest {
            actual_lrp_key: key,
            actual_lrp_instance_key: instance,
        }
        .encode_to_vec(),
        EvacuationKind::Claimed => EvacuateClaimedActualLrpRequest {
            actual_lrp_key: key,
            actual_lrp_instance_key: instance,
        }
        .encode_to_vec(),
        EvacuationKind::Crashed => EvacuateCrashedActualLrpRequest {
            actual_lrp_key: key,
            actual_lrp_instance_key: instance,
            error_message: "container exited".to_string(),
        }
        .encode_to_vec(),
        EvacuationKind::Running => EvacuateRunningActualLrpRequest {
            actual_lrp_key: key,
            actual_lrp_instance_key: instance,
            actual_lrp_net_info: Some(net_info()),
        }
        .encode_to_vec(),
        EvacuationKind::Stopped => EvacuateStoppedActualLrpRequest {
            actual_lrp_key: key,
            actual_lrp_instance_key: instance,
        }
        .encode_to_vec(),
    }
}

pub fn valid_request(kind: EvacuationKind) -> Vec<u8> {
    valid_request_from(kind, "cell-a")
}

/// Bytes that fail protobuf decoding: field 1 claims 5 bytes, one follows.
pub const GARBAGE: &[u8] = &[0x0a, 0x05, 0x01];

/// Run `kind` through the typed handler method; RemoveEvacuating reports
/// `false` for keep_container since its response has no such field.
pub async fn evacuate(
    handler: &EvacuationHandler,
    kind: EvacuationKind,
    body: &[u8],
) -> (Option<ErrorMessage>, bool) {
    fn split(response: EvacuationResponse) -> (Option<ErrorMessage>, bool) {
        (response.error, response.keep_container)
    }

    match kind {
        EvacuationKind::RemoveEvacuating => {
            (handler.remove_evacuating_actual_lrp(body).await.error, false)
        }
        EvacuationKind::Claimed => split(handler.evacuate_claimed_actual_lrp(body).await),
        EvacuationKind::Crashed => split(handler.evacuate_crashed_actual_lrp(body).await),
        EvacuationKind::Running => split(handler.evacuate_running_actual_lrp(body).await),
        EvacuationKind::Stopped => split(handler.evacuate_stopped_actual_lrp(body).await),
    }
}

// ============================================================================
// Test doubles
// ============================================================================

/// Controller stub returning one scripted outcome and counting calls.
pub struct RecordingController {
    calls: [AtomicUsize; 5],
    decision: ContainerDecision,
    crash_messages: Mutex<Vec<String>>,
}

impl RecordingController {
    /// Succeeds; decision operations report `keep_container`.
    pub fn succeeding(keep_container: bool) -> Arc<Self> {
        Arc::new(Self::with_decision(ContainerDecision::succeeded(keep_container)))
    }

    /// Fails every operation with `err`; decision operations ask to keep
    /// the container.
    pub fn failing(err: EvacuationError) -> Arc<Self> {
        Self::failing_with(err, true)
    }

    /// Fails every operation with `err`; decision operations report
    /// `keep_container`.
    pub fn failing_with(err: EvacuationError, keep_container: bool) -> Arc<Self> {
        Arc::new(Self::with_decision(ContainerDecision::failed(err, keep_container)))
    }

    fn with_decision(decision: ContainerDecision) -> Self {
        Self {
            calls: Default::default(),
            decision,
            crash_messages: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self, kind: EvacuationKind) -> usize {
        self.calls[kind.ordinal()].load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        EvacuationKind::ALL.into_iter().map(|kind| self.calls(kind)).sum()
    }

    pub fn crash_messages(&self) -> Vec<String> {
        self.crash_messages.lock().clone()
    }

    async fn decide(&self, kind: EvacuationKind) -> ContainerDecision {
        self.calls[kind.ordinal()].fetch_add(1, Ordering::SeqCst);
        // Give concurrent requests a chance to interleave.
        tokio::task::yield_now().await;
        self.decision.clone()
    }

    async fn outcome(&self, kind: EvacuationKind) -> EvacuationResult<()> {
        match self.decide(kind).await.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl EvacuationController for RecordingController {
    fn remove_evacuating_actual_lrp<'a>(
        &'a self,
        _key: &'a ActualLrpKey,
        _instance_key: &'a ActualLrpInstanceKey,
    ) -> ControllerFuture<'a, ()> {
        Box::pin(self.outcome(EvacuationKind::RemoveEvacuating))
    }

    fn evacuate_claimed_actual_lrp<'a>(
        &'a self,
        _key: &'a ActualLrpKey,
        _instance_key: &'a ActualLrpInstanceKey,
    ) -> DecisionFuture<'a> {
        Box::pin(self.decide(EvacuationKind::Claimed))
    }

    fn evacuate_crashed_actual_lrp<'a>(
        &'a self,
        _key: &'a ActualLrpKey,
        _instance_key: &'a ActualLrpInstanceKey,
        error_message: &'a str,
    ) -> ControllerFuture<'a, ()> {
        Box::pin(async move {
            self.crash_messages.lock().push(error_message.to_string());
            self.outcome(EvacuationKind::Crashed).await
        })
    }

    fn evacuate_running_actual_lrp<'a>(
        &'a self,
        _key: &'a ActualLrpKey,
        _instance_key: &'a ActualLrpInstanceKey,
        _net_info: &'a ActualLrpNetInfo,
    ) -> DecisionFuture<'a> {
        Box::pin(self.decide(EvacuationKind::Running))
    }

    fn evacuate_stopped_actual_lrp<'a>(
        &'a self,
        _key: &'a ActualLrpKey,
        _instance_key: &'a ActualLrpInstanceKey,
    ) -> ControllerFuture<'a, ()> {
        Box::pin(self.outcome(EvacuationKind::Stopped))
    }
}

/// Exit sink counting signals.
#[derive(Default)]
pub struct RecordingSink {
    signals: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn signals(&self) -> usize {
        self.signals.load(Ordering::SeqCst)
    }
}

impl ExitSink for RecordingSink {
    fn notify_exit(&self) {
        self.signals.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handler over `controller` emitting into a fresh recording sink.
pub fn recording_handler(
    controller: Arc<RecordingController>,
) -> (EvacuationHandler, Arc<RecordingSink>) {
    let sink = RecordingSink::new();
    let handler = EvacuationHandler::new(controller, sink.clone());
    (handler, sink)
}

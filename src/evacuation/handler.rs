//! Evacuation dispatcher.
//!
//! Every operation runs the same pipeline:
//! 1. Decode and validate the request; an invalid request never reaches the
//!    controller.
//! 2. Invoke the controller with the validated command.
//! 3. Build the response, resolving `keep_container` through the operation's
//!    [`RetentionPolicy`](super::retention::RetentionPolicy). Claimed and
//!    Running report the controller's decision, failed or not.
//! 4. Pass the response error to the escalation monitor, then return the
//!    response for transmission.

use super::controller::{ContainerDecision, EvacuationController};
use super::escalation::{EscalationMonitor, ExitSink};
use super::kind::EvacuationKind;
use super::retention::RetentionOutcome;
use super::validator::parse_request;
use crate::core::error::{convert_error, EvacuationError, EvacuationResult};
use crate::models::{
    ActualLrpInstanceKey, ActualLrpKey, ErrorMessage, EvacuateClaimedActualLrpRequest,
    EvacuateCrashedActualLrpRequest, EvacuateRunningActualLrpRequest,
    EvacuateStoppedActualLrpRequest, EvacuationResponse, RemoveEvacuatingActualLrpRequest,
    RemoveEvacuatingActualLrpResponse,
};
use crate::ops::metrics::EvacuationMetrics;
use bytes::Bytes;
use prost::Message;
use std::sync::Arc;
use tracing::Instrument;

/// Handles the five evacuation operations.
///
/// Stateless apart from the shared exit sink and metrics counters; one
/// instance serves every concurrent request.
#[derive(Clone)]
pub struct EvacuationHandler {
    controller: Arc<dyn EvacuationController>,
    escalation: EscalationMonitor,
    metrics: Arc<EvacuationMetrics>,
}

impl EvacuationHandler {
    /// Create a handler over `controller`, escalating on `exit_sink`.
    pub fn new(controller: Arc<dyn EvacuationController>, exit_sink: Arc<dyn ExitSink>) -> Self {
        Self {
            controller,
            escalation: EscalationMonitor::new(exit_sink),
            metrics: Arc::new(EvacuationMetrics::new()),
        }
    }

    /// Share `metrics` instead of private counters.
    pub fn with_metrics(mut self, metrics: Arc<EvacuationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Request metrics.
    pub fn metrics(&self) -> &Arc<EvacuationMetrics> {
        &self.metrics
    }

    /// Handle RemoveEvacuatingActualLrp.
    pub async fn remove_evacuating_actual_lrp(
        &self,
        body: &[u8],
    ) -> RemoveEvacuatingActualLrpResponse {
        let kind = EvacuationKind::RemoveEvacuating;
        async {
            tracing::info!("started");
            let error = match parse_request::<RemoveEvacuatingActualLrpRequest>(body) {
                Ok(command) => {
                    trace_keys(&command.key, &command.instance_key);
                    let result = self
                        .controller
                        .remove_evacuating_actual_lrp(&command.key, &command.instance_key)
                        .await;
                    completed(result).1
                }
                Err(err) => Some(rejected(&err)),
            };

            let response = RemoveEvacuatingActualLrpResponse { error };
            self.finish(kind, response.error.as_ref(), false);
            tracing::info!("completed");
            response
        }
        .instrument(session_span(kind))
        .await
    }

    /// Handle EvacuateClaimedActualLrp.
    pub async fn evacuate_claimed_actual_lrp(&self, body: &[u8]) -> EvacuationResponse {
        let kind = EvacuationKind::Claimed;
        async {
            tracing::info!("started");
            let (outcome, error) = match parse_request::<EvacuateClaimedActualLrpRequest>(body) {
                Ok(command) => {
                    trace_keys(&command.key, &command.instance_key);
                    let decision = self
                        .controller
                        .evacuate_claimed_actual_lrp(&command.key, &command.instance_key)
                        .await;
                    decided(decision)
                }
                Err(err) => (RetentionOutcome::InvalidRequest, Some(rejected(&err))),
            };
            self.respond(kind, outcome, error)
        }
        .instrument(session_span(kind))
        .await
    }

    /// Handle EvacuateCrashedActualLrp.
    pub async fn evacuate_crashed_actual_lrp(&self, body: &[u8]) -> EvacuationResponse {
        let kind = EvacuationKind::Crashed;
        async {
            tracing::info!("started");
            let (outcome, error) = match parse_request::<EvacuateCrashedActualLrpRequest>(body) {
                Ok(command) => {
                    trace_keys(&command.key, &command.instance_key);
                    let result = self
                        .controller
                        .evacuate_crashed_actual_lrp(
                            &command.key,
                            &command.instance_key,
                            &command.error_message,
                        )
                        .await;
                    completed(result)
                }
                Err(err) => (RetentionOutcome::InvalidRequest, Some(rejected(&err))),
            };
            self.respond(kind, outcome, error)
        }
        .instrument(session_span(kind))
        .await
    }

    /// Handle EvacuateRunningActualLrp.
    pub async fn evacuate_running_actual_lrp(&self, body: &[u8]) -> EvacuationResponse {
        let kind = EvacuationKind::Running;
        async {
            tracing::info!("started");
            let (outcome, error) = match parse_request::<EvacuateRunningActualLrpRequest>(body) {
                Ok(command) => {
                    trace_keys(&command.key, &command.instance_key);
                    let decision = self
                        .controller
                        .evacuate_running_actual_lrp(
                            &command.key,
                            &command.instance_key,
                            &command.net_info,
                        )
                        .await;
                    decided(decision)
                }
                Err(err) => (RetentionOutcome::InvalidRequest, Some(rejected(&err))),
            };
            self.respond(kind, outcome, error)
        }
        .instrument(session_span(kind))
        .await
    }

    /// Handle EvacuateStoppedActualLrp.
    pub async fn evacuate_stopped_actual_lrp(&self, body: &[u8]) -> EvacuationResponse {
        let kind = EvacuationKind::Stopped;
        async {
            tracing::info!("started");
            let (outcome, error) = match parse_request::<EvacuateStoppedActualLrpRequest>(body) {
                Ok(command) => {
                    trace_keys(&command.key, &command.instance_key);
                    let result = self
                        .controller
                        .evacuate_stopped_actual_lrp(&command.key, &command.instance_key)
                        .await;
                    completed(result)
                }
                Err(err) => (RetentionOutcome::InvalidRequest, Some(rejected(&err))),
            };
            self.respond(kind, outcome, error)
        }
        .instrument(session_span(kind))
        .await
    }

    /// Handle `kind` and encode the response for transmission.
    pub async fn dispatch(&self, kind: EvacuationKind, body: &[u8]) -> Bytes {
        let encoded = match kind {
            EvacuationKind::RemoveEvacuating => {
                self.remove_evacuating_actual_lrp(body).await.encode_to_vec()
            }
            EvacuationKind::Claimed => self.evacuate_claimed_actual_lrp(body).await.encode_to_vec(),
            EvacuationKind::Crashed => self.evacuate_crashed_actual_lrp(body).await.encode_to_vec(),
            EvacuationKind::Running => self.evacuate_running_actual_lrp(body).await.encode_to_vec(),
            EvacuationKind::Stopped => self.evacuate_stopped_actual_lrp(body).await.encode_to_vec(),
        };
        Bytes::from(encoded)
    }

    /// Answer `kind` with `err` for a body the transport could not read.
    ///
    /// The request counts as invalid, so the operation's invalid-request
    /// retention applies and the controller is not called.
    pub fn reject(&self, kind: EvacuationKind, err: &EvacuationError) -> Bytes {
        let _span = session_span(kind).entered();
        tracing::info!("started");
        let error = Some(rejected(err));
        let encoded = match kind {
            EvacuationKind::RemoveEvacuating => {
                let response = RemoveEvacuatingActualLrpResponse { error };
                self.finish(kind, response.error.as_ref(), false);
                tracing::info!("completed");
                response.encode_to_vec()
            }
            _ => self
                .respond(kind, RetentionOutcome::InvalidRequest, error)
                .encode_to_vec(),
        };
        Bytes::from(encoded)
    }

    fn respond(
        &self,
        kind: EvacuationKind,
        outcome: RetentionOutcome,
        error: Option<ErrorMessage>,
    ) -> EvacuationResponse {
        let keep_container = kind.retention_policy().keep_container(outcome);
        let response = EvacuationResponse {
            error,
            keep_container,
        };
        self.finish(kind, response.error.as_ref(), keep_container);
        tracing::info!(keep_container, "completed");
        response
    }

    /// Runs exactly once per request, after the response is built.
    fn finish(&self, kind: EvacuationKind, error: Option<&ErrorMessage>, keep_container: bool) {
        if self.escalation.inspect(error) {
            self.metrics.record_escalation();
        }
        self.metrics
            .record(kind, error.map(ErrorMessage::error_type), keep_container);
    }
}

impl std::fmt::Debug for EvacuationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvacuationHandler")
            .field("escalation", &self.escalation)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

fn session_span(kind: EvacuationKind) -> tracing::Span {
    tracing::info_span!("evacuation", session = kind.session())
}

fn trace_keys(key: &ActualLrpKey, instance_key: &ActualLrpInstanceKey) {
    tracing::debug!(
        process_guid = %key.process_guid,
        index = key.index,
        instance_guid = %instance_key.instance_guid,
        cell_id = %instance_key.cell_id,
        "request parsed"
    );
}

fn rejected(err: &EvacuationError) -> ErrorMessage {
    tracing::warn!(error = %err, "failed-parsing-request");
    convert_error(err)
}

fn failed(err: &EvacuationError) -> ErrorMessage {
    tracing::error!(error = %err, error_type = %err.error_type(), "controller-failed");
    convert_error(err)
}

fn completed(result: EvacuationResult<()>) -> (RetentionOutcome, Option<ErrorMessage>) {
    match result {
        Ok(()) => (RetentionOutcome::Completed, None),
        Err(err) => (RetentionOutcome::ControllerFailed, Some(failed(&err))),
    }
}

fn decided(decision: ContainerDecision) -> (RetentionOutcome, Option<ErrorMessage>) {
    let error = decision.error.as_ref().map(failed);
    (RetentionOutcome::Decided(decision.keep_container), error)
}

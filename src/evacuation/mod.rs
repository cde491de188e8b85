//! Evacuation request handling.
//!
//! A draining cell reports each instance it hosts through one of five
//! operations and learns whether it must keep the instance's container:
//!
//! ```text
//!  request bytes
//!       │
//!  ┌────▼──────┐  invalid   ┌──────────────────────┐
//!  │ validator ├───────────►│                      │
//!  └────┬──────┘            │  response (error,    │
//!  ┌────▼──────┐            │  keep_container)     │──► escalation monitor
//!  │controller ├───────────►│                      │──► transport
//!  └───────────┘            └──────────────────────┘
//! ```
//!
//! - [`kind`] - The five operations and their routes
//! - [`retention`] - Per-operation keep-container policy table
//! - [`validator`] - Request decoding and validation
//! - [`controller`] - Controller port the dispatcher depends on
//! - [`escalation`] - Unrecoverable-error escalation to process shutdown
//! - [`handler`] - The dispatcher

pub mod controller;
pub mod escalation;
pub mod handler;
pub mod kind;
pub mod retention;
pub mod validator;

pub use controller::{ContainerDecision, ControllerFuture, DecisionFuture, EvacuationController};
pub use escalation::{exit_channel, EscalationMonitor, ExitReceiver, ExitSink};
pub use handler::EvacuationHandler;
pub use kind::EvacuationKind;
pub use retention::{Retention, RetentionOutcome, RetentionPolicy};
pub use validator::{parse_request, CrashedCommand, IntoCommand, LrpCommand, RunningCommand};

//! Bulletin - evacuation endpoint of the bulletin-board authority.
//!
//! When a cell drains, it reports what happened to each of its actual LRPs
//! through five evacuation operations. Bulletin validates each report, applies
//! it to the authoritative instance store, tells the cell whether to keep the
//! container, and stops the process if the store reports an unrecoverable
//! failure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 HTTP listener (protobuf bodies)                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Evacuation dispatcher                       │
//! │   validate → controller → retention policy → escalation check   │
//! └─────────────────────────────────────────────────────────────────┘
//!                  │                                │
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │   Store evacuation controller│   │   Exit sink → runtime stop   │
//! │   over the instance store    │   │                              │
//! └──────────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::runtime`] - Main runtime orchestration
//! - [`core::error`] - Error types and the conversion into wire errors
//!
//! ## Models
//! - [`models::actual_lrp`] - Instance keys and network info
//! - [`models::proto`] - Request/response messages
//! - [`models::validation`] - Structural validation
//!
//! ## Evacuation
//! - [`evacuation::validator`] - Request decoding and validation
//! - [`evacuation::retention`] - Keep-container policy table
//! - [`evacuation::controller`] - Controller port
//! - [`evacuation::handler`] - Dispatcher
//! - [`evacuation::escalation`] - Unrecoverable error escalation
//!
//! ## Store
//! - [`store::instances`] - In-memory actual LRP groups
//! - [`store::controller`] - Controller over the instance store
//!
//! ## Networking
//! - [`net::http`] - HTTP routes
//!
//! ## Operations
//! - [`ops::metrics`] - Request counters
//!
//! ## CLI
//! - [`cli::commands`] - CLI command implementations
//!
//! # Key Invariants
//!
//! - An invalid request never reaches the controller.
//! - Every request gets exactly one response, always with transport status 200.
//! - Every unrecoverable error emits exactly one exit signal, before the
//!   response is transmitted.

// Core infrastructure
pub mod core;

// Wire models
pub mod models;

// Evacuation request surface
pub mod evacuation;

// Reference instance store
pub mod store;

// Networking
pub mod net;

// Operations and observability
pub mod ops;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, error, runtime};
pub use evacuation::{
    EvacuationController, EvacuationHandler, EvacuationKind, ExitSink, RetentionPolicy,
};
pub use ops::metrics;
pub use store::{InstanceStore, StoreEvacuationController};

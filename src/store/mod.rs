//! Reference instance store.
//!
//! - [`instances`] - In-memory actual LRP groups and their lifecycle primitives
//! - [`controller`] - Evacuation controller over the store
//!
//! State is not replicated or persisted; it lives for the process lifetime.

pub mod controller;
pub mod instances;

pub use controller::StoreEvacuationController;
pub use instances::{ActualLrp, ActualLrpGroup, ActualLrpState, InstanceStore};

//! Evacuation wire models.
//!
//! - [`actual_lrp`] - Instance keys and network info shared by all requests
//! - [`proto`] - Request/response messages with protobuf encoding
//! - [`validation`] - Structural validation of decoded messages
//!
//! Messages implement `prost::Message` by hand; field numbers are listed on
//! each struct.

pub mod actual_lrp;
pub mod proto;
pub mod validation;

pub use actual_lrp::{ActualLrpInstanceKey, ActualLrpKey, ActualLrpNetInfo, PortMapping};
pub use proto::{
    ErrorMessage, EvacuateClaimedActualLrpRequest, EvacuateCrashedActualLrpRequest,
    EvacuateRunningActualLrpRequest, EvacuateStoppedActualLrpRequest, EvacuationResponse,
    RemoveEvacuatingActualLrpRequest, RemoveEvacuatingActualLrpResponse,
};
pub use validation::{Validate, ValidationError};

//! Request decoding and validation.
//!
//! A request message is decoded, then converted into a command whose required
//! fields are no longer optional. Conversion is the validation step: it
//! collects every invalid field before failing.

use crate::core::error::EvacuationResult;
use crate::models::validation::{take_required, ValidationError};
use crate::models::{
    ActualLrpInstanceKey, ActualLrpKey, ActualLrpNetInfo, EvacuateClaimedActualLrpRequest,
    EvacuateCrashedActualLrpRequest, EvacuateRunningActualLrpRequest,
    EvacuateStoppedActualLrpRequest, RemoveEvacuatingActualLrpRequest,
};
use prost::Message;

/// A decoded request that can be validated into a command.
pub trait IntoCommand {
    /// The validated command.
    type Command;

    /// Validate and destructure the request.
    fn into_command(self) -> Result<Self::Command, ValidationError>;
}

/// Decode `body` and validate it into a command.
///
/// Decode failures map to `InvalidProtobufMessage`, validation failures to
/// `InvalidRequest`. No shared state is touched.
pub fn parse_request<M>(body: &[u8]) -> EvacuationResult<M::Command>
where
    M: Message + Default + IntoCommand,
{
    let request = M::decode(body)?;
    Ok(request.into_command()?)
}

/// Validated keys shared by every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrpCommand {
    pub key: ActualLrpKey,
    pub instance_key: ActualLrpInstanceKey,
}

/// Validated EvacuateCrashedActualLrp request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashedCommand {
    pub key: ActualLrpKey,
    pub instance_key: ActualLrpInstanceKey,
    pub error_message: String,
}

/// Validated EvacuateRunningActualLrp request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningCommand {
    pub key: ActualLrpKey,
    pub instance_key: ActualLrpInstanceKey,
    pub net_info: ActualLrpNetInfo,
}

fn take_keys(
    errors: &mut ValidationError,
    key: Option<ActualLrpKey>,
    instance_key: Option<ActualLrpInstanceKey>,
) -> Option<LrpCommand> {
    let key = take_required(errors, "actual_lrp_key", key);
    let instance_key = take_required(errors, "actual_lrp_instance_key", instance_key);
    Some(LrpCommand {
        key: key?,
        instance_key: instance_key?,
    })
}

fn lrp_command(
    key: Option<ActualLrpKey>,
    instance_key: Option<ActualLrpInstanceKey>,
) -> Result<LrpCommand, ValidationError> {
    let mut errors = ValidationError::new();
    match take_keys(&mut errors, key, instance_key) {
        Some(command) if errors.is_empty() => Ok(command),
        _ => Err(errors),
    }
}

impl IntoCommand for RemoveEvacuatingActualLrpRequest {
    type Command = LrpCommand;

    fn into_command(self) -> Result<LrpCommand, ValidationError> {
        lrp_command(self.actual_lrp_key, self.actual_lrp_instance_key)
    }
}

impl IntoCommand for EvacuateClaimedActualLrpRequest {
    type Command = LrpCommand;

    fn into_command(self) -> Result<LrpCommand, ValidationError> {
        lrp_command(self.actual_lrp_key, self.actual_lrp_instance_key)
    }
}

impl IntoCommand for EvacuateStoppedActualLrpRequest {
    type Command = LrpCommand;

    fn into_command(self) -> Result<LrpCommand, ValidationError> {
        lrp_command(self.actual_lrp_key, self.actual_lrp_instance_key)
    }
}

impl IntoCommand for EvacuateCrashedActualLrpRequest {
    type Command = CrashedCommand;

    fn into_command(self) -> Result<CrashedCommand, ValidationError> {
        let mut errors = ValidationError::new();
        let keys = take_keys(&mut errors, self.actual_lrp_key, self.actual_lrp_instance_key);
        if self.error_message.is_empty() {
            errors.push("error_message");
        }
        match keys {
            Some(LrpCommand { key, instance_key }) if errors.is_empty() => Ok(CrashedCommand {
                key,
                instance_key,
                error_message: self.error_message,
            }),
            _ => Err(errors),
        }
    }
}

impl IntoCommand for EvacuateRunningActualLrpRequest {
    type Command = RunningCommand;

    fn into_command(self) -> Result<RunningCommand, ValidationError> {
        let mut errors = ValidationError::new();
        let keys = take_keys(&mut errors, self.actual_lrp_key, self.actual_lrp_instance_key);
        let net_info = take_required(&mut errors, "actual_lrp_net_info", self.actual_lrp_net_info);
        match (keys, net_info) {
            (Some(LrpCommand { key, instance_key }), Some(net_info)) if errors.is_empty() => {
                Ok(RunningCommand {
                    key,
                    instance_key,
                    net_info,
                })
            }
            _ => Err(errors),
        }
    }
}

//! Evacuation request and response messages.
//!
//! Every request carries the actual LRP key in field 1 and the instance key in
//! field 2; kind-specific payloads start at field 3.

use super::actual_lrp::{ActualLrpInstanceKey, ActualLrpKey, ActualLrpNetInfo};
use crate::core::error::ErrorType;
use prost::{DecodeError, Message};

// ============================================================================
// ErrorMessage
// ============================================================================

/// Classified error carried by responses.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct ErrorMessage {
    pub error_type: i32, // field 1
    pub message: String, // field 2
}

impl ErrorMessage {
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.code(),
            message: message.into(),
        }
    }

    /// Classification of this error.
    pub fn error_type(&self) -> ErrorType {
        ErrorType::from_code(self.error_type)
    }

    /// Check if this error must terminate the process.
    pub fn is_unrecoverable(&self) -> bool {
        self.error_type() == ErrorType::Unrecoverable
    }
}

impl std::fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message)
    }
}

impl Message for ErrorMessage {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if self.error_type != 0 {
            prost::encoding::int32::encode(1, &self.error_type, buf);
        }
        if !self.message.is_empty() {
            prost::encoding::string::encode(2, &self.message, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::int32::merge(wire_type, &mut self.error_type, buf, ctx),
            2 => prost::encoding::string::merge(wire_type, &mut self.message, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if self.error_type != 0 {
            len += prost::encoding::int32::encoded_len(1, &self.error_type);
        }
        if !self.message.is_empty() {
            len += prost::encoding::string::encoded_len(2, &self.message);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Shared key fields
// ============================================================================

fn encode_keys(
    key: &Option<ActualLrpKey>,
    instance_key: &Option<ActualLrpInstanceKey>,
    buf: &mut impl prost::bytes::BufMut,
) {
    if let Some(ref key) = key {
        prost::encoding::message::encode(1, key, buf);
    }
    if let Some(ref instance_key) = instance_key {
        prost::encoding::message::encode(2, instance_key, buf);
    }
}

fn keys_encoded_len(
    key: &Option<ActualLrpKey>,
    instance_key: &Option<ActualLrpInstanceKey>,
) -> usize {
    let mut len = 0;
    if let Some(ref key) = key {
        len += prost::encoding::message::encoded_len(1, key);
    }
    if let Some(ref instance_key) = instance_key {
        len += prost::encoding::message::encoded_len(2, instance_key);
    }
    len
}

fn merge_optional<M: Message + Default>(
    field: &mut Option<M>,
    wire_type: prost::encoding::WireType,
    buf: &mut impl prost::bytes::Buf,
    ctx: prost::encoding::DecodeContext,
) -> Result<(), DecodeError> {
    let mut value = field.take().unwrap_or_default();
    prost::encoding::message::merge(wire_type, &mut value, buf, ctx)?;
    *field = Some(value);
    Ok(())
}

// ============================================================================
// RemoveEvacuatingActualLrpRequest
// ============================================================================

#[derive(Clone, Default, Debug, PartialEq)]
pub struct RemoveEvacuatingActualLrpRequest {
    pub actual_lrp_key: Option<ActualLrpKey>, // field 1
    pub actual_lrp_instance_key: Option<ActualLrpInstanceKey>, // field 2
}

impl Message for RemoveEvacuatingActualLrpRequest {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        encode_keys(&self.actual_lrp_key, &self.actual_lrp_instance_key, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => merge_optional(&mut self.actual_lrp_key, wire_type, buf, ctx),
            2 => merge_optional(&mut self.actual_lrp_instance_key, wire_type, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        keys_encoded_len(&self.actual_lrp_key, &self.actual_lrp_instance_key)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// EvacuateClaimedActualLrpRequest
// ============================================================================

#[derive(Clone, Default, Debug, PartialEq)]
pub struct EvacuateClaimedActualLrpRequest {
    pub actual_lrp_key: Option<ActualLrpKey>, // field 1
    pub actual_lrp_instance_key: Option<ActualLrpInstanceKey>, // field 2
}

impl Message for EvacuateClaimedActualLrpRequest {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        encode_keys(&self.actual_lrp_key, &self.actual_lrp_instance_key, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => merge_optional(&mut self.actual_lrp_key, wire_type, buf, ctx),
            2 => merge_optional(&mut self.actual_lrp_instance_key, wire_type, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        keys_encoded_len(&self.actual_lrp_key, &self.actual_lrp_instance_key)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// EvacuateCrashedActualLrpRequest
// ============================================================================

#[derive(Clone, Default, Debug, PartialEq)]
pub struct EvacuateCrashedActualLrpRequest {
    pub actual_lrp_key: Option<ActualLrpKey>, // field 1
    pub actual_lrp_instance_key: Option<ActualLrpInstanceKey>, // field 2
    pub error_message: String,                // field 3
}

impl Message for EvacuateCrashedActualLrpRequest {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        encode_keys(&self.actual_lrp_key, &self.actual_lrp_instance_key, buf);
        if !self.error_message.is_empty() {
            prost::encoding::string::encode(3, &self.error_message, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => merge_optional(&mut self.actual_lrp_key, wire_type, buf, ctx),
            2 => merge_optional(&mut self.actual_lrp_instance_key, wire_type, buf, ctx),
            3 => prost::encoding::string::merge(wire_type, &mut self.error_message, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = keys_encoded_len(&self.actual_lrp_key, &self.actual_lrp_instance_key);
        if !self.error_message.is_empty() {
            len += prost::encoding::string::encoded_len(3, &self.error_message);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// EvacuateRunningActualLrpRequest
// ============================================================================

#[derive(Clone, Default, Debug, PartialEq)]
pub struct EvacuateRunningActualLrpRequest {
    pub actual_lrp_key: Option<ActualLrpKey>, // field 1
    pub actual_lrp_instance_key: Option<ActualLrpInstanceKey>, // field 2
    pub actual_lrp_net_info: Option<ActualLrpNetInfo>, // field 3
}

impl Message for EvacuateRunningActualLrpRequest {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        encode_keys(&self.actual_lrp_key, &self.actual_lrp_instance_key, buf);
        if let Some(ref net_info) = self.actual_lrp_net_info {
            prost::encoding::message::encode(3, net_info, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => merge_optional(&mut self.actual_lrp_key, wire_type, buf, ctx),
            2 => merge_optional(&mut self.actual_lrp_instance_key, wire_type, buf, ctx),
            3 => merge_optional(&mut self.actual_lrp_net_info, wire_type, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = keys_encoded_len(&self.actual_lrp_key, &self.actual_lrp_instance_key);
        if let Some(ref net_info) = self.actual_lrp_net_info {
            len += prost::encoding::message::encoded_len(3, net_info);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// EvacuateStoppedActualLrpRequest
// ============================================================================

#[derive(Clone, Default, Debug, PartialEq)]
pub struct EvacuateStoppedActualLrpRequest {
    pub actual_lrp_key: Option<ActualLrpKey>, // field 1
    pub actual_lrp_instance_key: Option<ActualLrpInstanceKey>, // field 2
}

impl Message for EvacuateStoppedActualLrpRequest {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        encode_keys(&self.actual_lrp_key, &self.actual_lrp_instance_key, buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => merge_optional(&mut self.actual_lrp_key, wire_type, buf, ctx),
            2 => merge_optional(&mut self.actual_lrp_instance_key, wire_type, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        keys_encoded_len(&self.actual_lrp_key, &self.actual_lrp_instance_key)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Response to RemoveEvacuatingActualLrp. Carries no retention decision.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct RemoveEvacuatingActualLrpResponse {
    pub error: Option<ErrorMessage>, // field 1
}

impl Message for RemoveEvacuatingActualLrpResponse {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if let Some(ref error) = self.error {
            prost::encoding::message::encode(1, error, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => merge_optional(&mut self.error, wire_type, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        self.error
            .as_ref()
            .map(|error| prost::encoding::message::encoded_len(1, error))
            .unwrap_or(0)
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Response to the four evacuate operations.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct EvacuationResponse {
    pub error: Option<ErrorMessage>, // field 1
    pub keep_container: bool,        // field 2
}

impl Message for EvacuationResponse {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if let Some(ref error) = self.error {
            prost::encoding::message::encode(1, error, buf);
        }
        if self.keep_container {
            prost::encoding::bool::encode(2, &self.keep_container, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => merge_optional(&mut self.error, wire_type, buf, ctx),
            2 => prost::encoding::bool::merge(wire_type, &mut self.keep_container, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if let Some(ref error) = self.error {
            len += prost::encoding::message::encoded_len(1, error);
        }
        if self.keep_container {
            len += prost::encoding::bool::encoded_len(2, &self.keep_container);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

//! Actual LRP keys and network info.

use super::validation::{Validate, ValidationError};
use prost::{DecodeError, Message};
use serde::{Deserialize, Serialize};

// ============================================================================
// ActualLrpKey
// ============================================================================

/// Identifies a logical workload instance.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActualLrpKey {
    pub process_guid: String, // field 1
    pub index: i32,           // field 2
    pub domain: String,       // field 3
}

impl ActualLrpKey {
    pub fn new(process_guid: impl Into<String>, index: i32, domain: impl Into<String>) -> Self {
        Self {
            process_guid: process_guid.into(),
            index,
            domain: domain.into(),
        }
    }
}

impl Validate for ActualLrpKey {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        if self.process_guid.is_empty() {
            errors.push("process_guid");
        }
        if self.index < 0 {
            errors.push("index");
        }
        if self.domain.is_empty() {
            errors.push("domain");
        }
        errors.into_result()
    }
}

impl Message for ActualLrpKey {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if !self.process_guid.is_empty() {
            prost::encoding::string::encode(1, &self.process_guid, buf);
        }
        if self.index != 0 {
            prost::encoding::int32::encode(2, &self.index, buf);
        }
        if !self.domain.is_empty() {
            prost::encoding::string::encode(3, &self.domain, buf);
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
            1 => prost::encoding::string::merge(wire_type, &mut self.process_guid, buf, ctx),
            2 => prost::encoding::int32::merge(wire_type, &mut self.index, buf, ctx),
            3 => prost::encoding::string::merge(wire_type, &mut self.domain, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if !self.process_guid.is_empty() {
            len += prost::encoding::string::encoded_len(1, &self.process_guid);
        }
        if self.index != 0 {
            len += prost::encoding::int32::encoded_len(2, &self.index);
        }
        if !self.domain.is_empty() {
            len += prost::encoding::string::encoded_len(3, &self.domain);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// ActualLrpInstanceKey
// ============================================================================

/// Identifies one incarnation of an instance on a cell.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActualLrpInstanceKey {
    pub instance_guid: String, // field 1
    pub cell_id: String,       // field 2
}

impl ActualLrpInstanceKey {
    pub fn new(instance_guid: impl Into<String>, cell_id: impl Into<String>) -> Self {
        Self {
            instance_guid: instance_guid.into(),
            cell_id: cell_id.into(),
        }
    }
}

impl Validate for ActualLrpInstanceKey {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        if self.instance_guid.is_empty() {
            errors.push("instance_guid");
        }
        if self.cell_id.is_empty() {
            errors.push("cell_id");
        }
        errors.into_result()
    }
}

impl Message for ActualLrpInstanceKey {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if !self.instance_guid.is_empty() {
            prost::encoding::string::encode(1, &self.instance_guid, buf);
        }
        if !self.cell_id.is_empty() {
            prost::encoding::string::encode(2, &self.cell_id, buf);
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
            1 => prost::encoding::string::merge(wire_type, &mut self.instance_guid, buf, ctx),
            2 => prost::encoding::string::merge(wire_type, &mut self.cell_id, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if !self.instance_guid.is_empty() {
            len += prost::encoding::string::encoded_len(1, &self.instance_guid);
        }
        if !self.cell_id.is_empty() {
            len += prost::encoding::string::encoded_len(2, &self.cell_id);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// PortMapping / ActualLrpNetInfo
// ============================================================================

/// Container port exposed on the cell.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortMapping {
    pub container_port: u32, // field 1
    pub host_port: u32,      // field 2
}

impl Message for PortMapping {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if self.container_port != 0 {
            prost::encoding::uint32::encode(1, &self.container_port, buf);
        }
        if self.host_port != 0 {
            prost::encoding::uint32::encode(2, &self.host_port, buf);
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
            1 => prost::encoding::uint32::merge(wire_type, &mut self.container_port, buf, ctx),
            2 => prost::encoding::uint32::merge(wire_type, &mut self.host_port, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if self.container_port != 0 {
            len += prost::encoding::uint32::encoded_len(1, &self.container_port);
        }
        if self.host_port != 0 {
            len += prost::encoding::uint32::encoded_len(2, &self.host_port);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Address information for a running instance. Passed through unchanged.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActualLrpNetInfo {
    pub address: String,          // field 1
    pub ports: Vec<PortMapping>,  // field 2
    pub instance_address: String, // field 3
}

impl ActualLrpNetInfo {
    pub fn new(address: impl Into<String>, ports: Vec<PortMapping>) -> Self {
        Self {
            address: address.into(),
            ports,
            instance_address: String::new(),
        }
    }
}

impl Validate for ActualLrpNetInfo {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.address.is_empty() {
            return Err(ValidationError::field("address"));
        }
        Ok(())
    }
}

impl Message for ActualLrpNetInfo {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if !self.address.is_empty() {
            prost::encoding::string::encode(1, &self.address, buf);
        }
        for port in &self.ports {
            prost::encoding::message::encode(2, port, buf);
        }
        if !self.instance_address.is_empty() {
            prost::encoding::string::encode(3, &self.instance_address, buf);
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
            1 => prost::encoding::string::merge(wire_type, &mut self.address, buf, ctx),
            2 => {
                let mut port = PortMapping::default();
                prost::encoding::message::merge(wire_type, &mut port, buf, ctx)?;
                self.ports.push(port);
                Ok(())
            }
            3 => prost::encoding::string::merge(wire_type, &mut self.instance_address, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if !self.address.is_empty() {
            len += prost::encoding::string::encoded_len(1, &self.address);
        }
        for port in &self.ports {
            len += prost::encoding::message::encoded_len(2, port);
        }
        if !self.instance_address.is_empty() {
            len += prost::encoding::string::encoded_len(3, &self.instance_address);
        }
        len
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation_collects_every_field() {
        let key = ActualLrpKey::new("", -1, "");
        let err = key.validate().unwrap_err();
        assert_eq!(err.fields(), ["process_guid", "index", "domain"]);
    }

    #[test]
    fn index_zero_is_valid() {
        assert!(ActualLrpKey::new("pg", 0, "domain").validate().is_ok());
    }

    #[test]
    fn instance_key_requires_cell() {
        let err = ActualLrpInstanceKey::new("ig", "").validate().unwrap_err();
        assert_eq!(err.fields(), ["cell_id"]);
    }

    #[test]
    fn net_info_keeps_ports() {
        let info = ActualLrpNetInfo::new(
            "10.0.0.7",
            vec![
                PortMapping {
                    container_port: 8080,
                    host_port: 61001,
                },
                PortMapping {
                    container_port: 2222,
                    host_port: 61002,
                },
            ],
        );
        let decoded = ActualLrpNetInfo::decode(info.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, info);
    }
}

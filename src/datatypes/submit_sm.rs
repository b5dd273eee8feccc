use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
    encode_u8,
};
use crate::datatypes::tlv::{Tlv, tags};
use crate::datatypes::{
    CommandId, CommandStatus, MAX_ADDRESS_LENGTH, MAX_MESSAGE_ID_LENGTH, MAX_SERVICE_TYPE_LENGTH,
    MAX_TIME_LENGTH, NumericPlanIndicator, TypeOfNumber, decode_npi, decode_ton,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Largest user data the short_message field can carry
pub const MAX_SHORT_MESSAGE_LENGTH: usize = 254;

/// esm_class bit announcing a User Data Header at the start of the user data
pub const ESM_CLASS_UDHI: u8 = 0x40;

/// This operation is used by an ESME to submit a short message to the SMSC for onward transmission
/// to a specified short message entity (SME). The submit_sm PDU does not support the transaction
/// message mode.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSm {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    // Mandatory parameters
    /// 4.4.1 service_type: SMS application service associated with the message.
    ///       Empty for the SMSC default. Max length: 5 octets (6 with null terminator).
    pub service_type: String,

    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,

    /// Address of the SME which originated this message.
    /// Max length: 20 octets (21 with null terminator).
    pub source_addr: String,

    pub dest_addr_ton: TypeOfNumber,
    pub dest_addr_npi: NumericPlanIndicator,

    /// Destination address of this short message.
    /// Max length: 20 octets (21 with null terminator).
    pub destination_addr: String,

    /// Message mode and type. Bit 6 (0x40) is UDHI, set when short_message
    /// or message_payload starts with a User Data Header.
    pub esm_class: u8,

    pub protocol_id: u8,

    /// Level 0 (lowest) to level 3 (highest)
    pub priority_flag: u8,

    /// Empty for immediate delivery. Format: YYMMDDhhmmsstnnp
    pub schedule_delivery_time: String,

    /// Empty for the SMSC default validity period
    pub validity_period: String,

    /// Bits 0-1: SMSC delivery receipt (01 = requested)
    pub registered_delivery: u8,

    pub replace_if_present_flag: u8,

    /// Encoding scheme of the user data
    pub data_coding: u8,

    pub sm_default_msg_id: u8,

    /// Up to 254 octets of user data. sm_length is written from its length.
    /// Empty when the message_payload TLV carries the data.
    pub short_message: Bytes,

    /// Optional parameters (message_payload among them)
    pub tlvs: Vec<Tlv>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitSmValidationError {
    #[error("short_message is {actual} octets, maximum is {MAX_SHORT_MESSAGE_LENGTH}")]
    ShortMessageTooLong { actual: usize },

    #[error("Cannot use both short_message and message_payload - they are mutually exclusive")]
    MutualExclusivityViolation,
}

impl SubmitSm {
    /// Validates the user data placement rules
    pub fn validate(&self) -> Result<(), SubmitSmValidationError> {
        if self.short_message.len() > MAX_SHORT_MESSAGE_LENGTH {
            return Err(SubmitSmValidationError::ShortMessageTooLong {
                actual: self.short_message.len(),
            });
        }

        if !self.short_message.is_empty() && self.message_payload().is_some() {
            return Err(SubmitSmValidationError::MutualExclusivityViolation);
        }

        Ok(())
    }

    /// Creates a builder for constructing SubmitSm PDUs with validation
    pub fn builder() -> SubmitSmBuilder {
        SubmitSmBuilder::new()
    }

    /// The message_payload TLV value, if present
    pub fn message_payload(&self) -> Option<&Bytes> {
        self.tlvs
            .iter()
            .find(|tlv| tlv.tag == tags::MESSAGE_PAYLOAD)
            .map(|tlv| &tlv.value)
    }

    /// User data wherever it is carried
    pub fn user_data(&self) -> &[u8] {
        match self.message_payload() {
            Some(payload) => &payload[..],
            None => &self.short_message[..],
        }
    }

    /// Whether the user data starts with a User Data Header
    pub fn has_udh(&self) -> bool {
        self.esm_class & ESM_CLASS_UDHI != 0
    }
}

/// Builder for creating SubmitSm PDUs with validation and sensible defaults
pub struct SubmitSmBuilder {
    sequence_number: u32,
    service_type: String,
    source_addr_ton: TypeOfNumber,
    source_addr_npi: NumericPlanIndicator,
    source_addr: String,
    dest_addr_ton: TypeOfNumber,
    dest_addr_npi: NumericPlanIndicator,
    destination_addr: String,
    esm_class: u8,
    protocol_id: u8,
    priority_flag: u8,
    schedule_delivery_time: String,
    validity_period: String,
    registered_delivery: u8,
    data_coding: u8,
    short_message: Bytes,
    tlvs: Vec<Tlv>,
}

impl Default for SubmitSmBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitSmBuilder {
    pub fn new() -> Self {
        Self {
            sequence_number: 1,
            service_type: String::new(),
            source_addr_ton: TypeOfNumber::Unknown,
            source_addr_npi: NumericPlanIndicator::Unknown,
            source_addr: String::new(),
            dest_addr_ton: TypeOfNumber::Unknown,
            dest_addr_npi: NumericPlanIndicator::Unknown,
            destination_addr: String::new(),
            esm_class: 0,
            protocol_id: 0,
            priority_flag: 0,
            schedule_delivery_time: String::new(),
            validity_period: String::new(),
            registered_delivery: 0,
            data_coding: 0,
            short_message: Bytes::new(),
            tlvs: Vec::new(),
        }
    }

    crate::macros::builder_setters!(
        sequence_number: u32,
        source_addr_ton: TypeOfNumber,
        source_addr_npi: NumericPlanIndicator,
        dest_addr_ton: TypeOfNumber,
        dest_addr_npi: NumericPlanIndicator,
        esm_class: u8,
        protocol_id: u8,
        priority_flag: u8,
        registered_delivery: u8,
        data_coding: u8,
    );

    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = service_type.into();
        self
    }

    pub fn source_addr(mut self, addr: impl Into<String>) -> Self {
        self.source_addr = addr.into();
        self
    }

    pub fn destination_addr(mut self, addr: impl Into<String>) -> Self {
        self.destination_addr = addr.into();
        self
    }

    pub fn schedule_delivery_time(mut self, time: impl Into<String>) -> Self {
        self.schedule_delivery_time = time.into();
        self
    }

    pub fn validity_period(mut self, period: impl Into<String>) -> Self {
        self.validity_period = period.into();
        self
    }

    pub fn short_message(mut self, message: impl Into<Bytes>) -> Self {
        self.short_message = message.into();
        self
    }

    pub fn message_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.tlvs.push(Tlv::message_payload(payload));
        self
    }

    pub fn tlv(mut self, tlv: Tlv) -> Self {
        self.tlvs.push(tlv);
        self
    }

    /// Build the SubmitSm, performing validation
    pub fn build(self) -> Result<SubmitSm, SubmitSmValidationError> {
        let submit_sm = SubmitSm {
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
            service_type: self.service_type,
            source_addr_ton: self.source_addr_ton,
            source_addr_npi: self.source_addr_npi,
            source_addr: self.source_addr,
            dest_addr_ton: self.dest_addr_ton,
            dest_addr_npi: self.dest_addr_npi,
            destination_addr: self.destination_addr,
            esm_class: self.esm_class,
            protocol_id: self.protocol_id,
            priority_flag: self.priority_flag,
            schedule_delivery_time: self.schedule_delivery_time,
            validity_period: self.validity_period,
            registered_delivery: self.registered_delivery,
            replace_if_present_flag: 0,
            data_coding: self.data_coding,
            sm_default_msg_id: 0,
            short_message: self.short_message,
            tlvs: self.tlvs,
        };

        submit_sm.validate()?;
        Ok(submit_sm)
    }
}

impl Encodable for SubmitSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.validate().map_err(|e| CodecError::FieldValidation {
            field: "short_message",
            reason: e.to_string(),
        })?;

        PduHeader {
            command_length: 0, // patched by to_bytes
            command_id: CommandId::SubmitSm,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        }
        .encode(buf)?;

        encode_cstring(buf, &self.service_type, MAX_SERVICE_TYPE_LENGTH, "service_type")?;
        encode_u8(buf, self.source_addr_ton as u8);
        encode_u8(buf, self.source_addr_npi as u8);
        encode_cstring(buf, &self.source_addr, MAX_ADDRESS_LENGTH, "source_addr")?;
        encode_u8(buf, self.dest_addr_ton as u8);
        encode_u8(buf, self.dest_addr_npi as u8);
        encode_cstring(
            buf,
            &self.destination_addr,
            MAX_ADDRESS_LENGTH,
            "destination_addr",
        )?;
        encode_u8(buf, self.esm_class);
        encode_u8(buf, self.protocol_id);
        encode_u8(buf, self.priority_flag);
        encode_cstring(
            buf,
            &self.schedule_delivery_time,
            MAX_TIME_LENGTH,
            "schedule_delivery_time",
        )?;
        encode_cstring(buf, &self.validity_period, MAX_TIME_LENGTH, "validity_period")?;
        encode_u8(buf, self.registered_delivery);
        encode_u8(buf, self.replace_if_present_flag);
        encode_u8(buf, self.data_coding);
        encode_u8(buf, self.sm_default_msg_id);
        encode_u8(buf, self.short_message.len() as u8);
        buf.put_slice(&self.short_message);

        for tlv in &self.tlvs {
            tlv.encode(buf)?;
        }

        Ok(())
    }
}

impl Decodable for SubmitSm {
    fn command_id() -> CommandId {
        CommandId::SubmitSm
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let service_type = decode_cstring(buf, MAX_SERVICE_TYPE_LENGTH, "service_type")?;
        let source_addr_ton = decode_ton(buf, "source_addr_ton")?;
        let source_addr_npi = decode_npi(buf, "source_addr_npi")?;
        let source_addr = decode_cstring(buf, MAX_ADDRESS_LENGTH, "source_addr")?;
        let dest_addr_ton = decode_ton(buf, "dest_addr_ton")?;
        let dest_addr_npi = decode_npi(buf, "dest_addr_npi")?;
        let destination_addr = decode_cstring(buf, MAX_ADDRESS_LENGTH, "destination_addr")?;
        let esm_class = decode_u8(buf)?;
        let protocol_id = decode_u8(buf)?;
        let priority_flag = decode_u8(buf)?;
        let schedule_delivery_time =
            decode_cstring(buf, MAX_TIME_LENGTH, "schedule_delivery_time")?;
        let validity_period = decode_cstring(buf, MAX_TIME_LENGTH, "validity_period")?;
        let registered_delivery = decode_u8(buf)?;
        let replace_if_present_flag = decode_u8(buf)?;
        let data_coding = decode_u8(buf)?;
        let sm_default_msg_id = decode_u8(buf)?;
        let sm_length = decode_u8(buf)? as usize;

        if buf.remaining() < sm_length {
            return Err(CodecError::FieldValidation {
                field: "short_message",
                reason: format!(
                    "sm_length is {sm_length}, only {} octets remain",
                    buf.remaining()
                ),
            });
        }
        let short_message = buf.copy_to_bytes(sm_length);
        let tlvs = Tlv::decode_all(buf)?;

        Ok(SubmitSm {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            service_type,
            source_addr_ton,
            source_addr_npi,
            source_addr,
            dest_addr_ton,
            dest_addr_npi,
            destination_addr,
            esm_class,
            protocol_id,
            priority_flag,
            schedule_delivery_time,
            validity_period,
            registered_delivery,
            replace_if_present_flag,
            data_coding,
            sm_default_msg_id,
            short_message,
            tlvs,
        })
    }
}

/// The submit_sm_resp PDU is used to provide a response to the submit_sm request.
/// The body is only returned for a successful submit_sm; failures carry just the
/// header with the reason in command_status.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    /// 4.4.2 message_id: identifier assigned by the SMSC, up to 65 octets
    pub message_id: String,
}

impl SubmitSmResponse {
    pub fn new(sequence_number: u32, message_id: impl Into<String>) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            message_id: message_id.into(),
        }
    }

    pub fn error(sequence_number: u32, status: CommandStatus) -> Self {
        Self {
            command_status: status,
            sequence_number,
            message_id: String::new(),
        }
    }
}

impl Encodable for SubmitSmResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        PduHeader {
            command_length: 0, // patched by to_bytes
            command_id: CommandId::SubmitSmResp,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        }
        .encode(buf)?;

        if self.command_status == CommandStatus::Ok {
            encode_cstring(buf, &self.message_id, MAX_MESSAGE_ID_LENGTH, "message_id")?;
        }
        Ok(())
    }
}

impl Decodable for SubmitSmResponse {
    fn command_id() -> CommandId {
        CommandId::SubmitSmResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let message_id = if buf.has_remaining() {
            decode_cstring(buf, MAX_MESSAGE_ID_LENGTH, "message_id")?
        } else {
            String::new()
        };

        Ok(SubmitSmResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Frame;

    fn hello_world() -> SubmitSm {
        SubmitSm::builder()
            .sequence_number(1)
            .source_addr_ton(TypeOfNumber::International)
            .source_addr_npi(NumericPlanIndicator::Isdn)
            .source_addr("1234567890")
            .dest_addr_ton(TypeOfNumber::International)
            .dest_addr_npi(NumericPlanIndicator::Isdn)
            .destination_addr("0987654321")
            .short_message(&b"Hello World"[..])
            .build()
            .unwrap()
    }

    #[test]
    fn test_submit_sm_to_bytes_basic() {
        let bytes = hello_world().to_bytes().unwrap();

        // Verify header
        assert_eq!(&bytes[0..4], &(bytes.len() as u32).to_be_bytes());
        assert_eq!(&bytes[4..8], &(CommandId::SubmitSm as u32).to_be_bytes());
        assert_eq!(&bytes[8..12], &(CommandStatus::Ok as u32).to_be_bytes());
        assert_eq!(&bytes[12..16], &1u32.to_be_bytes());

        let body_start = 16;
        assert_eq!(bytes[body_start], 0); // service_type null terminator
        assert_eq!(bytes[body_start + 1], TypeOfNumber::International as u8);
        assert_eq!(bytes[body_start + 2], NumericPlanIndicator::Isdn as u8);

        // sm_length immediately precedes the user data at the end of the PDU
        let sm_length_at = bytes.len() - 11 - 1;
        assert_eq!(bytes[sm_length_at], 11);
        assert_eq!(&bytes[sm_length_at + 1..], b"Hello World");
    }

    #[test]
    fn test_submit_sm_decodes_from_its_encoding() {
        let original = hello_world();
        let bytes = original.to_bytes().unwrap();

        match Frame::parse(&bytes).unwrap() {
            Frame::SubmitSm(decoded) => assert_eq!(*decoded, original),
            other => panic!("Expected SubmitSm frame, got {other:?}"),
        }
    }

    #[test]
    fn test_message_payload_sets_sm_length_to_zero() {
        let payload = vec![0x41u8; 300];
        let submit_sm = SubmitSm::builder()
            .destination_addr("0601020304")
            .message_payload(payload.clone())
            .build()
            .unwrap();

        let bytes = submit_sm.to_bytes().unwrap();
        // sm_length (0) then the TLV header
        let tlv_at = bytes.len() - payload.len() - 4;
        assert_eq!(bytes[tlv_at - 1], 0);
        assert_eq!(&bytes[tlv_at..tlv_at + 4], &[0x04, 0x24, 0x01, 0x2C]);
        assert_eq!(submit_sm.user_data(), payload.as_slice());
    }

    #[test]
    fn test_submit_sm_validation_short_message_too_long() {
        let result = SubmitSm::builder()
            .short_message(vec![0u8; MAX_SHORT_MESSAGE_LENGTH + 1])
            .build();
        assert!(matches!(
            result,
            Err(SubmitSmValidationError::ShortMessageTooLong { actual: 255 })
        ));
    }

    #[test]
    fn test_submit_sm_validation_mutual_exclusivity() {
        let result = SubmitSm::builder()
            .short_message(&b"a"[..])
            .message_payload(&b"b"[..])
            .build();
        assert!(matches!(
            result,
            Err(SubmitSmValidationError::MutualExclusivityViolation)
        ));
    }

    #[test]
    fn test_submit_sm_validation_source_addr_too_long() {
        let submit_sm = SubmitSm::builder()
            .source_addr("123456789012345678901")
            .build()
            .unwrap();
        assert!(matches!(
            submit_sm.to_bytes(),
            Err(CodecError::FieldValidation {
                field: "source_addr",
                ..
            })
        ));
    }

    #[test]
    fn test_submit_sm_response_to_bytes() {
        let bytes = SubmitSmResponse::new(7, "msg-1").to_bytes().unwrap();

        let expected: Vec<u8> = vec![
            0x00, 0x00, 0x00, 0x16, // command_length
            0x80, 0x00, 0x00, 0x04, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x07, // sequence_number
            b'm', b's', b'g', b'-', b'1', 0x00, // message_id
        ];
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_submit_sm_response_with_error_status_has_no_body() {
        let bytes = SubmitSmResponse::error(3, CommandStatus::ThrottlingError)
            .to_bytes()
            .unwrap();
        assert_eq!(bytes.len(), 16);

        match Frame::parse(&bytes).unwrap() {
            Frame::SubmitSmResp(decoded) => {
                assert_eq!(decoded.command_status, CommandStatus::ThrottlingError);
                assert!(decoded.message_id.is_empty());
            }
            other => panic!("Expected SubmitSmResp frame, got {other:?}"),
        }
    }
}

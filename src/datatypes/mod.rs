mod bind;
mod command_id;
mod command_status;
mod data_coding;
mod enquire_link;
mod generic_nack;
mod interface_version;
mod numeric_plan_indicator;
mod submit_sm;
mod tlv;
mod type_of_number;
mod unbind;

pub use bind::{
    BindTransceiver, BindTransceiverResponse, BindTransmitter, BindTransmitterResponse,
};
pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use data_coding::{CharacterEncoding, DataCoding, GeneralAlphabet, MessageClass};
pub use enquire_link::{EnquireLink, EnquireLinkResponse};
pub use generic_nack::GenericNack;
pub use interface_version::InterfaceVersion;
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use submit_sm::{
    ESM_CLASS_UDHI, MAX_SHORT_MESSAGE_LENGTH, SubmitSm, SubmitSmBuilder, SubmitSmResponse,
    SubmitSmValidationError,
};
pub use tlv::{Tlv, tags};
pub use type_of_number::TypeOfNumber;
pub use unbind::{Unbind, UnbindResponse};

use crate::codec::{CodecError, decode_u8};
use std::io::Cursor;

// C-Octet String limits, NUL terminator included
pub const MAX_SYSTEM_ID_LENGTH: usize = 16;
pub const MAX_PASSWORD_LENGTH: usize = 9;
pub const MAX_SYSTEM_TYPE_LENGTH: usize = 13;
pub const MAX_ADDRESS_RANGE_LENGTH: usize = 41;
pub const MAX_SERVICE_TYPE_LENGTH: usize = 6;
pub const MAX_ADDRESS_LENGTH: usize = 21;
pub const MAX_TIME_LENGTH: usize = 17;
pub const MAX_MESSAGE_ID_LENGTH: usize = 65;

pub(crate) fn decode_ton(
    buf: &mut Cursor<&[u8]>,
    field: &'static str,
) -> Result<TypeOfNumber, CodecError> {
    let raw = decode_u8(buf)?;
    TypeOfNumber::try_from(raw).map_err(|_| CodecError::FieldValidation {
        field,
        reason: format!("unknown type of number {raw:#04x}"),
    })
}

pub(crate) fn decode_npi(
    buf: &mut Cursor<&[u8]>,
    field: &'static str,
) -> Result<NumericPlanIndicator, CodecError> {
    let raw = decode_u8(buf)?;
    NumericPlanIndicator::try_from(raw).map_err(|_| CodecError::FieldValidation {
        field,
        reason: format!("unknown numbering plan {raw:#04x}"),
    })
}

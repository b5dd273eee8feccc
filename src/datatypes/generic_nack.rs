use crate::datatypes::{CommandId, CommandStatus};

/// GenericNack is used to acknowledge the receipt of a PDU when the receiving
/// entity cannot process the PDU due to errors such as invalid command_id,
/// invalid command_status, or other format errors.
///
/// An SMSC answers a request it cannot parse with a generic_nack carrying the
/// request's sequence number, or 0 when that cannot be determined.
#[derive(Clone, Debug, PartialEq)]
pub struct GenericNack {
    /// The command_status field indicates the reason for the generic_nack
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

crate::macros::impl_complete_header_only_pdu!(GenericNack, CommandId::GenericNack);

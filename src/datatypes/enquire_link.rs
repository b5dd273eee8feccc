use crate::datatypes::{CommandId, CommandStatus};

/// enquire_link (4.11.1) provides a confidence check of the communication
/// path between an ESME and an SMSC. Either side may send it.
#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLink {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

/// enquire_link_resp (4.11.2)
#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLinkResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

crate::macros::impl_complete_header_only_pdu!(EnquireLink, CommandId::EnquireLink);
crate::macros::impl_complete_header_only_pdu!(EnquireLinkResponse, CommandId::EnquireLinkResp);

impl EnquireLink {
    /// The response the SMSC expects for this probe
    pub fn response(&self) -> EnquireLinkResponse {
        EnquireLinkResponse::new(self.sequence_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encodable;

    #[test]
    fn test_enquire_link_to_bytes() {
        let bytes = EnquireLink::new(7).to_bytes().unwrap();

        let expected: Vec<u8> = vec![
            0x00, 0x00, 0x00, 0x10, // command_length
            0x00, 0x00, 0x00, 0x15, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x07, // sequence_number
        ];
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_response_echoes_sequence() {
        let response = EnquireLink::new(99).response();
        assert_eq!(response.sequence_number, 99);
        assert_eq!(response.command_status, CommandStatus::Ok);
    }
}

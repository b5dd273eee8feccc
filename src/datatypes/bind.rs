use crate::datatypes::CommandId;

crate::macros::impl_bind_pdu!(
    BindTransmitter,
    CommandId::BindTransmitter,
    BindTransmitterResponse,
    CommandId::BindTransmitterResp
);

crate::macros::impl_bind_pdu!(
    BindTransceiver,
    CommandId::BindTransceiver,
    BindTransceiverResponse,
    CommandId::BindTransceiverResp
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecError, Encodable, Frame};
    use crate::datatypes::{
        CommandStatus, InterfaceVersion, NumericPlanIndicator, Tlv, TypeOfNumber, tags,
    };

    #[test]
    fn test_bind_transmitter_to_bytes() {
        let mut bind_transmitter =
            BindTransmitter::new(1, "SMPP3TEST", "secret08").with_system_type("SUBMIT1");
        bind_transmitter.addr_ton = TypeOfNumber::International;
        bind_transmitter.addr_npi = NumericPlanIndicator::Isdn;

        let bytes = bind_transmitter.to_bytes().unwrap();

        let expected: Vec<u8> = vec![
            // Header:
            0x00, 0x00, 0x00, 0x2F, // command_length
            0x00, 0x00, 0x00, 0x02, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x01, // sequence_number
            // Body:
            0x53, 0x4D, 0x50, 0x50, 0x33, 0x54, 0x45, 0x53, 0x54, 0x00, // system_id
            0x73, 0x65, 0x63, 0x72, 0x65, 0x74, 0x30, 0x38, 0x00, // password
            0x53, 0x55, 0x42, 0x4D, 0x49, 0x54, 0x31, 0x00, // system_type
            0x34, // interface_version
            0x01, // addr_ton
            0x01, // addr_npi
            0x00, // address_range
        ];
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_bind_transceiver_uses_its_own_command_id() {
        let bytes = BindTransceiver::new(5, "esme", "pw")
            .with_interface_version(InterfaceVersion::SmppV33)
            .to_bytes()
            .unwrap();

        assert_eq!(&bytes[4..8], &[0x00, 0x00, 0x00, 0x09]);
        assert_eq!(Frame::parse(&bytes).unwrap().command_id(), CommandId::BindTransceiver);
    }

    #[test]
    fn test_password_longer_than_eight_octets_is_rejected() {
        let result = BindTransmitter::new(1, "esme", "123456789").to_bytes();
        assert!(matches!(
            result,
            Err(CodecError::FieldValidation {
                field: "password",
                ..
            })
        ));
    }

    #[test]
    fn test_bind_response_with_interface_version() {
        let mut response = BindTransmitterResponse::new(1, "SMSC");
        response
            .tlvs
            .push(Tlv::new(tags::SC_INTERFACE_VERSION, &[0x34][..]));

        let bytes = response.to_bytes().unwrap();
        match Frame::parse(&bytes).unwrap() {
            Frame::BindTransmitterResp(decoded) => {
                assert_eq!(decoded.system_id, "SMSC");
                assert_eq!(decoded.sc_interface_version(), Some(0x34));
            }
            other => panic!("Expected BindTransmitterResp, got {other:?}"),
        }
    }

    #[test]
    fn test_error_response_without_body_decodes() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x10, // command_length
            0x80, 0x00, 0x00, 0x02, // command_id
            0x00, 0x00, 0x00, 0x0E, // ESME_RINVPASWD
            0x00, 0x00, 0x00, 0x01, // sequence_number
        ];

        match Frame::parse(data).unwrap() {
            Frame::BindTransmitterResp(decoded) => {
                assert_eq!(decoded.command_status, CommandStatus::InvalidPassword);
                assert!(decoded.system_id.is_empty());
            }
            other => panic!("Expected BindTransmitterResp, got {other:?}"),
        }
    }
}

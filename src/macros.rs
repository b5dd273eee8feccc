// ABOUTME: This module provides macros to reduce boilerplate in SMPP PDU implementations
// ABOUTME: Covers header-only PDUs, the three bind variants, and builder setters

/// Macro for implementing codec traits on header-only PDUs (no body)
///
/// # Arguments
/// * `$pdu_type` - The PDU struct name (e.g., EnquireLink)
/// * `$command_id` - The CommandId variant (e.g., CommandId::EnquireLink)
macro_rules! impl_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        impl $crate::codec::Decodable for $pdu_type {
            fn command_id() -> $crate::datatypes::CommandId {
                $command_id
            }

            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use bytes::Buf;

                Self::validate_header(&header)?;

                if buf.has_remaining() {
                    return Err($crate::codec::CodecError::FieldValidation {
                        field: concat!(stringify!($pdu_type), "_body"),
                        reason: concat!(stringify!($pdu_type), " PDU should have no body")
                            .to_string(),
                    });
                }

                Ok($pdu_type {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                })
            }
        }

        impl $crate::codec::Encodable for $pdu_type {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                let header = $crate::codec::PduHeader {
                    command_length: $crate::codec::PduHeader::SIZE as u32,
                    command_id: $command_id,
                    command_status: self.command_status,
                    sequence_number: self.sequence_number,
                };
                header.encode(buf)
            }

            fn encoded_size(&self) -> usize {
                $crate::codec::PduHeader::SIZE
            }
        }
    };
}

/// Macro for generating constructor methods for header-only PDUs
///
/// - `new(sequence_number: u32)` - Creates PDU with Ok status
/// - `error(sequence_number: u32, status: CommandStatus)` - Creates PDU with error status
macro_rules! impl_header_only_constructors {
    ($pdu_type:ident) => {
        impl $pdu_type {
            /// Create a new PDU with Ok status
            pub fn new(sequence_number: u32) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                }
            }

            /// Create a PDU with error status
            pub fn error(sequence_number: u32, status: $crate::datatypes::CommandStatus) -> Self {
                Self {
                    command_status: status,
                    sequence_number,
                }
            }
        }
    };
}

/// Codec implementation plus constructors for a header-only PDU
macro_rules! impl_complete_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        $crate::macros::impl_header_only_pdu!($pdu_type, $command_id);
        $crate::macros::impl_header_only_constructors!($pdu_type);
    };
}

/// Macro for the bind_transmitter / bind_receiver / bind_transceiver family
///
/// The three requests share one body layout (4.1.1, 4.1.3, 4.1.5) and the
/// three responses carry system_id plus optional TLVs. Only the command_id
/// differs.
///
/// # Arguments
/// * `$request` / `$request_id` - request struct name and CommandId
/// * `$response` / `$response_id` - response struct name and CommandId
macro_rules! impl_bind_pdu {
    ($request:ident, $request_id:expr, $response:ident, $response_id:expr) => {
        #[derive(Clone, Debug, PartialEq)]
        pub struct $request {
            pub command_status: $crate::datatypes::CommandStatus,
            pub sequence_number: u32,

            /// 5.2.1 system_id: identification of the ESME requesting to bind
            pub system_id: String,
            /// 5.2.2 password used by the SMSC to authenticate the ESME
            pub password: String,
            /// 5.2.3 system_type: categorizes the type of ESME
            pub system_type: String,
            /// 5.2.4 interface_version supported by the ESME
            pub interface_version: $crate::datatypes::InterfaceVersion,
            /// 5.2.5 addr_ton of the ESME address(es) served
            pub addr_ton: $crate::datatypes::TypeOfNumber,
            /// 5.2.6 addr_npi of the ESME address(es) served
            pub addr_npi: $crate::datatypes::NumericPlanIndicator,
            /// 5.2.7 address_range served by the ESME
            pub address_range: String,
        }

        impl $request {
            pub fn new(
                sequence_number: u32,
                system_id: impl Into<String>,
                password: impl Into<String>,
            ) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                    system_id: system_id.into(),
                    password: password.into(),
                    system_type: String::new(),
                    interface_version: $crate::datatypes::InterfaceVersion::SmppV34,
                    addr_ton: $crate::datatypes::TypeOfNumber::Unknown,
                    addr_npi: $crate::datatypes::NumericPlanIndicator::Unknown,
                    address_range: String::new(),
                }
            }

            pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
                self.system_type = system_type.into();
                self
            }

            pub fn with_interface_version(
                mut self,
                interface_version: $crate::datatypes::InterfaceVersion,
            ) -> Self {
                self.interface_version = interface_version;
                self
            }
        }

        impl $crate::codec::Decodable for $request {
            fn command_id() -> $crate::datatypes::CommandId {
                $request_id
            }

            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use $crate::codec::{decode_cstring, decode_u8};
                use $crate::datatypes::*;

                Self::validate_header(&header)?;

                let system_id = decode_cstring(buf, MAX_SYSTEM_ID_LENGTH, "system_id")?;
                let password = decode_cstring(buf, MAX_PASSWORD_LENGTH, "password")?;
                let system_type = decode_cstring(buf, MAX_SYSTEM_TYPE_LENGTH, "system_type")?;

                let raw_version = decode_u8(buf)?;
                let interface_version = InterfaceVersion::try_from(raw_version).map_err(|_| {
                    $crate::codec::CodecError::FieldValidation {
                        field: "interface_version",
                        reason: format!("unsupported version {raw_version:#04x}"),
                    }
                })?;
                let addr_ton = decode_ton(buf, "addr_ton")?;
                let addr_npi = decode_npi(buf, "addr_npi")?;
                let address_range =
                    decode_cstring(buf, MAX_ADDRESS_RANGE_LENGTH, "address_range")?;

                Ok(Self {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                    system_id,
                    password,
                    system_type,
                    interface_version,
                    addr_ton,
                    addr_npi,
                    address_range,
                })
            }
        }

        impl $crate::codec::Encodable for $request {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                use $crate::codec::{encode_cstring, encode_u8};
                use $crate::datatypes::*;

                $crate::codec::PduHeader {
                    command_length: 0, // patched by to_bytes
                    command_id: $request_id,
                    command_status: self.command_status,
                    sequence_number: self.sequence_number,
                }
                .encode(buf)?;

                encode_cstring(buf, &self.system_id, MAX_SYSTEM_ID_LENGTH, "system_id")?;
                encode_cstring(buf, &self.password, MAX_PASSWORD_LENGTH, "password")?;
                encode_cstring(buf, &self.system_type, MAX_SYSTEM_TYPE_LENGTH, "system_type")?;
                encode_u8(buf, self.interface_version as u8);
                encode_u8(buf, self.addr_ton as u8);
                encode_u8(buf, self.addr_npi as u8);
                encode_cstring(
                    buf,
                    &self.address_range,
                    MAX_ADDRESS_RANGE_LENGTH,
                    "address_range",
                )?;
                Ok(())
            }
        }

        #[derive(Clone, Debug, PartialEq)]
        pub struct $response {
            pub command_status: $crate::datatypes::CommandStatus,
            pub sequence_number: u32,
            /// SMSC identifier. Absent on most error responses.
            pub system_id: String,
            /// Optional parameters, typically sc_interface_version
            pub tlvs: Vec<$crate::datatypes::Tlv>,
        }

        impl $response {
            pub fn new(sequence_number: u32, system_id: impl Into<String>) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                    system_id: system_id.into(),
                    tlvs: Vec::new(),
                }
            }

            pub fn error(sequence_number: u32, status: $crate::datatypes::CommandStatus) -> Self {
                Self {
                    command_status: status,
                    sequence_number,
                    system_id: String::new(),
                    tlvs: Vec::new(),
                }
            }

            /// Interface version announced by the SMSC, if any
            pub fn sc_interface_version(&self) -> Option<u8> {
                self.tlvs
                    .iter()
                    .find(|tlv| tlv.tag == $crate::datatypes::tags::SC_INTERFACE_VERSION)
                    .and_then(|tlv| tlv.value.first().copied())
            }
        }

        impl $crate::codec::Decodable for $response {
            fn command_id() -> $crate::datatypes::CommandId {
                $response_id
            }

            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use bytes::Buf;

                Self::validate_header(&header)?;

                let system_id = if buf.has_remaining() {
                    $crate::codec::decode_cstring(
                        buf,
                        $crate::datatypes::MAX_SYSTEM_ID_LENGTH,
                        "system_id",
                    )?
                } else {
                    String::new()
                };
                let tlvs = $crate::datatypes::Tlv::decode_all(buf)?;

                Ok(Self {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                    system_id,
                    tlvs,
                })
            }
        }

        impl $crate::codec::Encodable for $response {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                $crate::codec::PduHeader {
                    command_length: 0, // patched by to_bytes
                    command_id: $response_id,
                    command_status: self.command_status,
                    sequence_number: self.sequence_number,
                }
                .encode(buf)?;

                $crate::codec::encode_cstring(
                    buf,
                    &self.system_id,
                    $crate::datatypes::MAX_SYSTEM_ID_LENGTH,
                    "system_id",
                )?;
                for tlv in &self.tlvs {
                    tlv.encode(buf)?;
                }
                Ok(())
            }
        }
    };
}

/// Macro for generating builder setter methods
///
/// For each `field: Type` pair, generates
/// `pub fn field(mut self, field: Type) -> Self`.
macro_rules! builder_setters {
    ($($field:ident: $type:ty),* $(,)?) => {
        $(
            pub fn $field(mut self, $field: $type) -> Self {
                self.$field = $field;
                self
            }
        )*
    };
}

// Make macros available to the rest of the crate
pub(crate) use {
    builder_setters, impl_bind_pdu, impl_complete_header_only_pdu, impl_header_only_constructors,
    impl_header_only_pdu,
};

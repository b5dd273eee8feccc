use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

/// This parameter is used to indicate the version of the SMPP protocol.
///
/// The version also decides which data_coding table is used when the
/// coding scheme is derived automatically.
#[derive(TryFromPrimitive, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum InterfaceVersion {
    #[serde(rename = "3.3")]
    SmppV33 = 0x33,
    #[default]
    #[serde(rename = "3.4")]
    SmppV34 = 0x34,
    #[serde(rename = "5.0")]
    SmppV50 = 0x50,
}

impl std::fmt::Display for InterfaceVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceVersion::SmppV33 => f.write_str("3.3"),
            InterfaceVersion::SmppV34 => f.write_str("3.4"),
            InterfaceVersion::SmppV50 => f.write_str("5.0"),
        }
    }
}

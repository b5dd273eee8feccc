// ABOUTME: Typed construction of the SMPP data_coding byte for the general and character encoding groups
// ABOUTME: Message classes and alphabet constants used by the coding-scheme resolver

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message class carried by general data coding values (GSM 03.38 section 4)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageClass {
    /// Class 0: displayed immediately, not stored (flash SMS)
    Flash,
    /// Class 1: stored in mobile equipment
    MobileEquipment,
    /// Class 2: SIM specific
    SimSpecific,
    /// Class 3: terminal equipment specific
    TerminalEquipment,
}

impl MessageClass {
    fn bits(self) -> u8 {
        match self {
            MessageClass::Flash => 0b00,
            MessageClass::MobileEquipment => 0b01,
            MessageClass::SimSpecific => 0b10,
            MessageClass::TerminalEquipment => 0b11,
        }
    }
}

/// Alphabets available in the general data coding group (bits 3..2)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeneralAlphabet {
    Default = 0x00,
    EightBit = 0x04,
    Ucs2 = 0x08,
}

/// Values of the SMPP 3.4 character encoding group (5.2.19)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharacterEncoding {
    SmscDefault = 0x00,
    Ia5 = 0x01,
    OctetUnspecified = 0x02,
    Latin1 = 0x03,
    EightBit = 0x04,
    Jis = 0x05,
    Cyrillic = 0x06,
    LatinHebrew = 0x07,
    Ucs2 = 0x08,
}

/// The data_coding byte of a submit_sm
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DataCoding(u8);

impl DataCoding {
    const COMPRESSED: u8 = 0x20;
    const CLASS_PRESENT: u8 = 0x10;

    pub fn from_byte(value: u8) -> Self {
        DataCoding(value)
    }

    /// General data coding group (bits 7..6 = 00), the only layout an
    /// SMPP 3.3 SMSC understands.
    pub fn general_group(
        alphabet: GeneralAlphabet,
        message_class: Option<MessageClass>,
        compressed: bool,
    ) -> Self {
        let mut value = alphabet as u8;
        if compressed {
            value |= Self::COMPRESSED;
        }
        if let Some(class) = message_class {
            value |= Self::CLASS_PRESENT | class.bits();
        }
        DataCoding(value)
    }

    pub fn character_encoding_group(encoding: CharacterEncoding) -> Self {
        DataCoding(encoding as u8)
    }

    pub fn to_byte(&self) -> u8 {
        self.0
    }

    /// Message class bits, when the value belongs to the general group and
    /// announces one
    pub fn message_class(&self) -> Option<MessageClass> {
        if self.0 & 0xC0 != 0 || self.0 & Self::CLASS_PRESENT == 0 {
            return None;
        }
        Some(match self.0 & 0b11 {
            0b00 => MessageClass::Flash,
            0b01 => MessageClass::MobileEquipment,
            0b10 => MessageClass::SimSpecific,
            _ => MessageClass::TerminalEquipment,
        })
    }
}

impl fmt::Debug for DataCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataCoding({:#04x})", self.0)
    }
}

impl fmt::Display for DataCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

impl From<DataCoding> for u8 {
    fn from(value: DataCoding) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_group_alphabets() {
        assert_eq!(
            DataCoding::general_group(GeneralAlphabet::Default, None, false).to_byte(),
            0x00
        );
        assert_eq!(
            DataCoding::general_group(GeneralAlphabet::EightBit, None, false).to_byte(),
            0x04
        );
        assert_eq!(
            DataCoding::general_group(GeneralAlphabet::Ucs2, None, false).to_byte(),
            0x08
        );
    }

    #[test]
    fn test_general_group_with_class_and_compression() {
        let coding = DataCoding::general_group(
            GeneralAlphabet::Ucs2,
            Some(MessageClass::Flash),
            true,
        );
        assert_eq!(coding.to_byte(), 0x38);
        assert_eq!(coding.message_class(), Some(MessageClass::Flash));

        let coding = DataCoding::general_group(
            GeneralAlphabet::Default,
            Some(MessageClass::SimSpecific),
            false,
        );
        assert_eq!(coding.to_byte(), 0x12);
        assert_eq!(coding.message_class(), Some(MessageClass::SimSpecific));
    }

    #[test]
    fn test_character_encoding_group_values() {
        assert_eq!(
            DataCoding::character_encoding_group(CharacterEncoding::Latin1).to_byte(),
            0x03
        );
        assert_eq!(
            DataCoding::character_encoding_group(CharacterEncoding::EightBit).to_byte(),
            0x04
        );
        assert_eq!(
            DataCoding::character_encoding_group(CharacterEncoding::Ucs2).message_class(),
            None
        );
    }
}

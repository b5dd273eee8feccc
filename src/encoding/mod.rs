// ABOUTME: Character encodings usable for SMS user data and the selector choosing between them
// ABOUTME: GSM 03.38 (packed and 8-bit), Latin-1 and UCS-2 plus a trait for custom encoders

mod charset;
pub mod gsm;
mod selector;

pub use charset::{Gsm7PackedEncoder, Gsm8Encoder, Latin1Encoder, Ucs2Encoder};
pub use selector::{EncodingConfig, EncodingPriorities, EncodingSelector};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Identifies the encoding that produced a payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Charset {
    /// GSM 03.38 default alphabet, 7-bit septets packed into octets
    Gsm7Packed,
    /// GSM 03.38 default alphabet, one septet per octet
    Gsm8,
    /// ISO-8859-1
    Latin1,
    /// UCS-2 (UTF-16BE)
    Ucs2,
    /// An encoding supplied by the application
    Custom(&'static str),
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Charset::Gsm7Packed => f.write_str("GSM7-packed"),
            Charset::Gsm8 => f.write_str("GSM8"),
            Charset::Latin1 => f.write_str("ISO-8859-1"),
            Charset::Ucs2 => f.write_str("UCS-2"),
            Charset::Custom(name) => f.write_str(name),
        }
    }
}

/// The encodings shipped with the crate, nameable from configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinCharset {
    Gsm7Packed,
    Gsm8,
    Latin1,
    Ucs2,
}

impl BuiltinCharset {
    pub fn encoder(self) -> Arc<dyn Encoder> {
        match self {
            BuiltinCharset::Gsm7Packed => Arc::new(Gsm7PackedEncoder),
            BuiltinCharset::Gsm8 => Arc::new(Gsm8Encoder),
            BuiltinCharset::Latin1 => Arc::new(Latin1Encoder),
            BuiltinCharset::Ucs2 => Arc::new(Ucs2Encoder),
        }
    }
}

impl From<BuiltinCharset> for Charset {
    fn from(value: BuiltinCharset) -> Self {
        match value {
            BuiltinCharset::Gsm7Packed => Charset::Gsm7Packed,
            BuiltinCharset::Gsm8 => Charset::Gsm8,
            BuiltinCharset::Latin1 => Charset::Latin1,
            BuiltinCharset::Ucs2 => Charset::Ucs2,
        }
    }
}

/// Text converted to user data octets
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedPayload {
    pub charset: Charset,
    pub bytes: Bytes,
    /// Length in the encoding's own units: septets for GSM, octets for
    /// Latin-1, 16-bit code units for UCS-2
    pub units: usize,
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("character {character:?} at index {index} cannot be encoded in {charset}")]
    Unmappable {
        charset: Charset,
        character: char,
        index: usize,
    },

    #[error("no encoding can represent the text (tried: {})", display_list(.tried))]
    Unsupported { tried: Vec<Charset> },
}

fn display_list(charsets: &[Charset]) -> String {
    if charsets.is_empty() {
        return "none".to_string();
    }
    charsets
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A byte-level encoding for SMS text
///
/// Implementations report the cost of each character so the splitter can
/// cut text on character boundaries without encoding it twice.
pub trait Encoder: Send + Sync {
    fn charset(&self) -> Charset;

    /// Units consumed by `c`, or `None` when `c` has no representation
    fn units(&self, c: char) -> Option<usize>;

    fn encode(&self, text: &str) -> Result<EncodedPayload, EncodingError>;

    fn can_encode(&self, text: &str) -> bool {
        text.chars().all(|c| self.units(c).is_some())
    }

    /// Total units for `text`, failing on the first unmappable character
    fn measure(&self, text: &str) -> Result<usize, EncodingError> {
        text.chars().enumerate().try_fold(0, |total, (index, c)| {
            self.units(c)
                .map(|units| total + units)
                .ok_or(EncodingError::Unmappable {
                    charset: self.charset(),
                    character: c,
                    index,
                })
        })
    }
}

impl fmt::Debug for dyn Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Encoder({})", self.charset())
    }
}

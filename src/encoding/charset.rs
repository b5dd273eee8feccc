// ABOUTME: Built-in encoders for GSM 7-bit packed, GSM 8-bit, Latin-1 and UCS-2
// ABOUTME: Each reports per-character unit cost so text can be measured before encoding

use super::gsm;
use super::{Charset, EncodedPayload, Encoder, EncodingError};
use bytes::{BufMut, Bytes, BytesMut};

fn gsm_septets(charset: Charset, text: &str) -> Result<Vec<u8>, EncodingError> {
    gsm::to_septets(text).map_err(|(index, character)| EncodingError::Unmappable {
        charset,
        character,
        index,
    })
}

/// GSM 03.38 default alphabet packed 8 septets into 7 octets
#[derive(Clone, Copy, Debug, Default)]
pub struct Gsm7PackedEncoder;

impl Encoder for Gsm7PackedEncoder {
    fn charset(&self) -> Charset {
        Charset::Gsm7Packed
    }

    fn units(&self, c: char) -> Option<usize> {
        gsm::lookup(c).map(gsm::GsmChar::septets)
    }

    fn encode(&self, text: &str) -> Result<EncodedPayload, EncodingError> {
        let septets = gsm_septets(self.charset(), text)?;
        Ok(EncodedPayload {
            charset: self.charset(),
            bytes: Bytes::from(gsm::pack(&septets)),
            units: septets.len(),
        })
    }
}

/// GSM 03.38 default alphabet, one septet per octet
#[derive(Clone, Copy, Debug, Default)]
pub struct Gsm8Encoder;

impl Encoder for Gsm8Encoder {
    fn charset(&self) -> Charset {
        Charset::Gsm8
    }

    fn units(&self, c: char) -> Option<usize> {
        gsm::lookup(c).map(gsm::GsmChar::septets)
    }

    fn encode(&self, text: &str) -> Result<EncodedPayload, EncodingError> {
        let septets = gsm_septets(self.charset(), text)?;
        let units = septets.len();
        Ok(EncodedPayload {
            charset: self.charset(),
            bytes: Bytes::from(septets),
            units,
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Latin1Encoder;

impl Encoder for Latin1Encoder {
    fn charset(&self) -> Charset {
        Charset::Latin1
    }

    fn units(&self, c: char) -> Option<usize> {
        (u32::from(c) <= 0xFF).then_some(1)
    }

    fn encode(&self, text: &str) -> Result<EncodedPayload, EncodingError> {
        let mut bytes = BytesMut::with_capacity(text.len());
        for (index, character) in text.chars().enumerate() {
            let code = u32::from(character);
            if code > 0xFF {
                return Err(EncodingError::Unmappable {
                    charset: self.charset(),
                    character,
                    index,
                });
            }
            bytes.put_u8(code as u8);
        }
        let units = bytes.len();
        Ok(EncodedPayload {
            charset: self.charset(),
            bytes: bytes.freeze(),
            units,
        })
    }
}

/// UTF-16 big endian. Characters outside the BMP take a surrogate pair.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ucs2Encoder;

impl Encoder for Ucs2Encoder {
    fn charset(&self) -> Charset {
        Charset::Ucs2
    }

    fn units(&self, c: char) -> Option<usize> {
        Some(c.len_utf16())
    }

    fn encode(&self, text: &str) -> Result<EncodedPayload, EncodingError> {
        let mut bytes = BytesMut::with_capacity(text.len() * 2);
        let mut units = 0;
        for unit in text.encode_utf16() {
            bytes.put_u16(unit);
            units += 1;
        }
        Ok(EncodedPayload {
            charset: self.charset(),
            bytes: bytes.freeze(),
            units,
        })
    }
}

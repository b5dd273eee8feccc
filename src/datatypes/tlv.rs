use crate::codec::CodecError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Tags of the optional parameters this client reads or writes (5.3.2)
pub mod tags {
    pub const SC_INTERFACE_VERSION: u16 = 0x0210;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tlv {
    /// The Tag field is used to uniquely identify the particular optional parameter in question.
    pub tag: u16,

    /// The Value field contains the actual data for the optional parameter in question.
    /// Its length is written on the wire as the Length field.
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// message_payload: user data too large for short_message
    pub fn message_payload(value: impl Into<Bytes>) -> Self {
        Self::new(tags::MESSAGE_PAYLOAD, value)
    }

    pub fn encoded_size(&self) -> usize {
        4 + self.value.len()
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let length = u16::try_from(self.value.len()).map_err(|_| {
            CodecError::TlvError(format!(
                "value of tag {:#06x} is {} octets, maximum is 65535",
                self.tag,
                self.value.len()
            ))
        })?;

        buf.put_u16(self.tag);
        buf.put_u16(length);
        buf.put_slice(&self.value);
        Ok(())
    }

    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < 4 {
            return Err(CodecError::TlvError(format!(
                "{} trailing octets are too short for a TLV header",
                buf.remaining()
            )));
        }

        let tag = buf.get_u16();
        let length = buf.get_u16() as usize;
        if buf.remaining() < length {
            return Err(CodecError::TlvError(format!(
                "tag {tag:#06x} declares {length} octets, {} available",
                buf.remaining()
            )));
        }

        Ok(Self {
            tag,
            value: buf.copy_to_bytes(length),
        })
    }

    /// Decode TLVs until the body is exhausted
    pub fn decode_all(buf: &mut Cursor<&[u8]>) -> Result<Vec<Self>, CodecError> {
        let mut tlvs = Vec::new();
        while buf.has_remaining() {
            tlvs.push(Self::decode(buf)?);
        }
        Ok(tlvs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_payload_wire_format() {
        let tlv = Tlv::message_payload(&b"abc"[..]);
        let mut buf = BytesMut::new();
        tlv.encode(&mut buf).unwrap();

        assert_eq!(buf.as_ref(), &[0x04, 0x24, 0x00, 0x03, b'a', b'b', b'c']);
        assert_eq!(tlv.encoded_size(), 7);
    }

    #[test]
    fn test_decode_all_reads_every_parameter() {
        let data: &[u8] = &[0x02, 0x10, 0x00, 0x01, 0x34, 0x04, 0x24, 0x00, 0x02, 0xAA, 0xBB];
        let mut cursor = Cursor::new(data);
        let tlvs = Tlv::decode_all(&mut cursor).unwrap();

        assert_eq!(tlvs.len(), 2);
        assert_eq!(tlvs[0].tag, tags::SC_INTERFACE_VERSION);
        assert_eq!(tlvs[0].value.as_ref(), &[0x34]);
        assert_eq!(tlvs[1].value.as_ref(), &[0xAA, 0xBB]);
    }

    #[test]
    fn test_truncated_value_is_rejected() {
        let data: &[u8] = &[0x04, 0x24, 0x00, 0x05, 0x01];
        let mut cursor = Cursor::new(data);
        assert!(matches!(
            Tlv::decode(&mut cursor),
            Err(CodecError::TlvError(_))
        ));
    }
}

// ABOUTME: Concatenated short message information element (IEI 0x00 and 0x08)
// ABOUTME: Serializes the user data header prefixed to each segment

use super::ReferenceNumber;
use bytes::{BufMut, BytesMut};

const IEI_CONCAT_8BIT: u8 = 0x00;
const IEI_CONCAT_16BIT: u8 = 0x08;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConcatenationHeader {
    pub reference: ReferenceNumber,
    pub total: u8,
    /// 1-based position of the segment
    pub index: u8,
}

impl ConcatenationHeader {
    /// Octets on the wire including the UDH length byte
    pub fn encoded_len(&self) -> usize {
        match self.reference {
            ReferenceNumber::U8(_) => 6,
            ReferenceNumber::U16(_) => 7,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        match self.reference {
            ReferenceNumber::U8(reference) => {
                buf.put_slice(&[0x05, IEI_CONCAT_8BIT, 0x03, reference]);
            }
            ReferenceNumber::U16(reference) => {
                buf.put_slice(&[0x06, IEI_CONCAT_16BIT, 0x04]);
                buf.put_u16(reference);
            }
        }
        buf.put_u8(self.total);
        buf.put_u8(self.index);
    }

    /// Reads a header produced by [`encode`](Self::encode) from the front of
    /// `user_data`, returning it with the number of octets consumed
    pub fn parse(user_data: &[u8]) -> Option<(Self, usize)> {
        match user_data {
            [0x05, IEI_CONCAT_8BIT, 0x03, reference, total, index, ..] => Some((
                Self {
                    reference: ReferenceNumber::U8(*reference),
                    total: *total,
                    index: *index,
                },
                6,
            )),
            [0x06, IEI_CONCAT_16BIT, 0x04, hi, lo, total, index, ..] => Some((
                Self {
                    reference: ReferenceNumber::U16(u16::from_be_bytes([*hi, *lo])),
                    total: *total,
                    index: *index,
                },
                7,
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_bit_reference_layout() {
        let header = ConcatenationHeader {
            reference: ReferenceNumber::U8(0x2A),
            total: 3,
            index: 2,
        };
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(&buf[..], &[0x05, 0x00, 0x03, 0x2A, 0x03, 0x02]);
        assert_eq!(header.encoded_len(), buf.len());
        assert_eq!(ConcatenationHeader::parse(&buf), Some((header, 6)));
    }

    #[test]
    fn test_sixteen_bit_reference_layout() {
        let header = ConcatenationHeader {
            reference: ReferenceNumber::U16(0x1234),
            total: 2,
            index: 1,
        };
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(&buf[..], &[0x06, 0x08, 0x04, 0x12, 0x34, 0x02, 0x01]);
        assert_eq!(ConcatenationHeader::parse(&buf), Some((header, 7)));
    }

    #[test]
    fn test_parse_ignores_other_headers() {
        assert_eq!(ConcatenationHeader::parse(&[0x04, 0x01, 0x02]), None);
        assert_eq!(ConcatenationHeader::parse(b"hello"), None);
    }
}

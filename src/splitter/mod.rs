// ABOUTME: Splits encoded text into concatenated SMS segments with user data headers
// ABOUTME: Capacity is derived per charset and reference width; splitters chain by charset

mod header;
mod reference;

pub use header::ConcatenationHeader;
pub use reference::{
    RandomU16Reference, RandomU8Reference, ReferenceNumber, ReferenceNumberGenerator,
    ReferenceWidth,
};

use crate::encoding::{Charset, Encoder, EncodingError};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Concatenation is limited by the one-octet total field
pub const MAX_SEGMENTS: usize = 255;

const USER_DATA_OCTETS: usize = 140;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("message needs {count} segments, at most 255 are allowed")]
    TooManySegments { count: usize },

    #[error("no segment capacity known for {0}")]
    UnsupportedCharset(Charset),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Units that fit in one segment, per header variant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentSizes {
    pub single: usize,
    pub with_8bit_ref: usize,
    pub with_16bit_ref: usize,
}

impl SegmentSizes {
    /// Scales the single-message capacity by the octets left once the
    /// header (6 or 7 octets) is taken out of the 140-octet user data
    pub const fn from_single(single: usize) -> Self {
        Self {
            single,
            with_8bit_ref: (USER_DATA_OCTETS - 6) * single / USER_DATA_OCTETS,
            with_16bit_ref: (USER_DATA_OCTETS - 7) * single / USER_DATA_OCTETS,
        }
    }

    pub fn for_charset(charset: &Charset) -> Option<Self> {
        match charset {
            Charset::Gsm7Packed => Some(Self::from_single(160)),
            Charset::Gsm8 | Charset::Latin1 => Some(Self::from_single(140)),
            Charset::Ucs2 => Some(Self::from_single(70)),
            Charset::Custom(_) => None,
        }
    }

    pub fn with_reference(&self, reference: &ReferenceNumber) -> usize {
        match reference {
            ReferenceNumber::U8(_) => self.with_8bit_ref,
            ReferenceNumber::U16(_) => self.with_16bit_ref,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub header: Option<ConcatenationHeader>,
    pub payload: Bytes,
}

impl Segment {
    /// Header followed by payload, as carried on the wire
    pub fn user_data(&self) -> Bytes {
        match &self.header {
            None => self.payload.clone(),
            Some(header) => {
                let mut buf = BytesMut::with_capacity(header.encoded_len() + self.payload.len());
                header.encode(&mut buf);
                buf.extend_from_slice(&self.payload);
                buf.freeze()
            }
        }
    }
}

pub trait MessageSplitter: Send + Sync {
    fn supports(&self, charset: &Charset) -> bool;

    fn split(&self, text: &str, encoder: &dyn Encoder) -> Result<Vec<Segment>, SplitError>;
}

/// Splitter for the built-in charsets
///
/// Text is cut greedily on character boundaries, so a GSM escape sequence
/// or a UTF-16 surrogate pair always lands in a single segment. Each chunk
/// is encoded on its own, which means packed GSM segments start on an
/// octet boundary.
#[derive(Clone)]
pub struct StandardSplitter {
    references: Arc<dyn ReferenceNumberGenerator>,
}

impl StandardSplitter {
    pub fn new(references: Arc<dyn ReferenceNumberGenerator>) -> Self {
        Self { references }
    }
}

impl Default for StandardSplitter {
    fn default() -> Self {
        Self::new(Arc::new(RandomU8Reference))
    }
}

impl MessageSplitter for StandardSplitter {
    fn supports(&self, charset: &Charset) -> bool {
        SegmentSizes::for_charset(charset).is_some()
    }

    fn split(&self, text: &str, encoder: &dyn Encoder) -> Result<Vec<Segment>, SplitError> {
        let charset = encoder.charset();
        let sizes =
            SegmentSizes::for_charset(&charset).ok_or(SplitError::UnsupportedCharset(charset))?;
        split_by_units(text, encoder, sizes, self.references.as_ref())
    }
}

/// Greedy unit-based splitting shared by splitters with a fixed capacity
pub fn split_by_units(
    text: &str,
    encoder: &dyn Encoder,
    sizes: SegmentSizes,
    references: &dyn ReferenceNumberGenerator,
) -> Result<Vec<Segment>, SplitError> {
    let total_units = encoder.measure(text)?;
    if total_units <= sizes.single {
        return Ok(vec![Segment {
            header: None,
            payload: encoder.encode(text)?.bytes,
        }]);
    }

    let reference = references.next_reference();
    let capacity = sizes.with_reference(&reference);

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut used = 0;
    for (offset, c) in text.char_indices() {
        // measure() succeeded, so every character has a cost
        let units = encoder.units(c).unwrap_or(1);
        if used + units > capacity {
            chunks.push(&text[start..offset]);
            start = offset;
            used = 0;
        }
        used += units;
    }
    chunks.push(&text[start..]);

    if chunks.len() > MAX_SEGMENTS {
        return Err(SplitError::TooManySegments {
            count: chunks.len(),
        });
    }

    let total = chunks.len() as u8;
    debug!(%reference, segments = total, %total_units, "splitting message");
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            Ok(Segment {
                header: Some(ConcatenationHeader {
                    reference,
                    total,
                    index: (i + 1) as u8,
                }),
                payload: encoder.encode(chunk)?.bytes,
            })
        })
        .collect()
}

/// Ordered splitters; the first one supporting a charset handles it
#[derive(Clone, Default)]
pub struct SplitterChain {
    splitters: Vec<Arc<dyn MessageSplitter>>,
}

impl SplitterChain {
    pub fn new(splitters: Vec<Arc<dyn MessageSplitter>>) -> Self {
        Self { splitters }
    }

    pub fn push(&mut self, splitter: Arc<dyn MessageSplitter>) {
        self.splitters.push(splitter);
    }

    pub fn select(&self, charset: &Charset) -> Option<&dyn MessageSplitter> {
        self.splitters
            .iter()
            .find(|s| s.supports(charset))
            .map(|s| &**s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplittingConfig {
    pub enabled: bool,
    pub reference: ReferenceWidth,
}

impl Default for SplittingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reference: ReferenceWidth::U8,
        }
    }
}

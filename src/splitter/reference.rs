// ABOUTME: Reference numbers shared by all segments of a concatenated message
// ABOUTME: Pluggable generators with random 8-bit and 16-bit defaults

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceNumber {
    U8(u8),
    U16(u16),
}

impl fmt::Display for ReferenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceNumber::U8(value) => write!(f, "{value}"),
            ReferenceNumber::U16(value) => write!(f, "{value}"),
        }
    }
}

/// Width of generated references, selectable from configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceWidth {
    #[default]
    U8,
    U16,
}

impl ReferenceWidth {
    pub fn generator(self) -> std::sync::Arc<dyn ReferenceNumberGenerator> {
        match self {
            ReferenceWidth::U8 => std::sync::Arc::new(RandomU8Reference),
            ReferenceWidth::U16 => std::sync::Arc::new(RandomU16Reference),
        }
    }
}

pub trait ReferenceNumberGenerator: Send + Sync {
    fn next_reference(&self) -> ReferenceNumber;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RandomU8Reference;

impl ReferenceNumberGenerator for RandomU8Reference {
    fn next_reference(&self) -> ReferenceNumber {
        ReferenceNumber::U8(rand::thread_rng().r#gen())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RandomU16Reference;

impl ReferenceNumberGenerator for RandomU16Reference {
    fn next_reference(&self) -> ReferenceNumber {
        ReferenceNumber::U16(rand::thread_rng().r#gen())
    }
}

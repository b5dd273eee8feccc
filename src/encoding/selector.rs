// ABOUTME: Chooses the encoder for a text, either fixed or by priority-ordered guessing
// ABOUTME: Built from EncodingConfig plus any application-supplied encoders

use super::{BuiltinCharset, Charset, EncodedPayload, Encoder, EncodingError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Priority per built-in encoder. A value of zero or below disables it.
///
/// Packed GSM is off by default since few SMSCs accept it; raise
/// `gsm7_packed` above `gsm8` to prefer it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingPriorities {
    pub gsm7_packed: i32,
    pub gsm8: i32,
    pub latin1: i32,
    pub ucs2: i32,
}

impl Default for EncodingPriorities {
    fn default() -> Self {
        Self {
            gsm7_packed: 0,
            gsm8: 99_000,
            latin1: 98_000,
            ucs2: 90_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub auto_guess: bool,
    pub priorities: EncodingPriorities,
    /// Used unconditionally when guessing is off and no custom encoder exists
    pub fallback: BuiltinCharset,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            auto_guess: true,
            priorities: EncodingPriorities::default(),
            fallback: BuiltinCharset::Gsm8,
        }
    }
}

#[derive(Clone, Debug)]
enum Mode {
    Fixed(Arc<dyn Encoder>),
    Guess(Vec<Arc<dyn Encoder>>),
}

#[derive(Clone, Debug)]
pub struct EncodingSelector {
    mode: Mode,
}

impl EncodingSelector {
    pub fn fixed(encoder: Arc<dyn Encoder>) -> Self {
        Self {
            mode: Mode::Fixed(encoder),
        }
    }

    /// Candidates with a priority of zero or below are dropped. The rest are
    /// tried highest priority first; equal priorities keep the given order.
    pub fn guessing(candidates: Vec<(Arc<dyn Encoder>, i32)>) -> Self {
        let mut candidates: Vec<_> = candidates
            .into_iter()
            .filter(|(_, priority)| *priority > 0)
            .collect();
        candidates.sort_by(|(_, a), (_, b)| b.cmp(a));
        Self {
            mode: Mode::Guess(candidates.into_iter().map(|(e, _)| e).collect()),
        }
    }

    pub fn from_config(config: &EncodingConfig, custom: Vec<(Arc<dyn Encoder>, i32)>) -> Self {
        if config.auto_guess {
            let priorities = &config.priorities;
            let mut candidates = vec![
                (BuiltinCharset::Gsm7Packed.encoder(), priorities.gsm7_packed),
                (BuiltinCharset::Gsm8.encoder(), priorities.gsm8),
                (BuiltinCharset::Latin1.encoder(), priorities.latin1),
                (BuiltinCharset::Ucs2.encoder(), priorities.ucs2),
            ];
            candidates.extend(custom);
            Self::guessing(candidates)
        } else if !custom.is_empty() {
            Self::guessing(custom)
        } else {
            Self::fixed(config.fallback.encoder())
        }
    }

    /// Charsets in evaluation order
    pub fn candidates(&self) -> Vec<Charset> {
        match &self.mode {
            Mode::Fixed(encoder) => vec![encoder.charset()],
            Mode::Guess(encoders) => encoders.iter().map(|e| e.charset()).collect(),
        }
    }

    pub fn select(&self, text: &str) -> Result<Arc<dyn Encoder>, EncodingError> {
        match &self.mode {
            Mode::Fixed(encoder) => {
                encoder.measure(text)?;
                Ok(Arc::clone(encoder))
            }
            Mode::Guess(encoders) => {
                let chosen = encoders.iter().find(|e| e.can_encode(text)).ok_or_else(|| {
                    EncodingError::Unsupported {
                        tried: encoders.iter().map(|e| e.charset()).collect(),
                    }
                })?;
                debug!(charset = %chosen.charset(), "selected encoding");
                Ok(Arc::clone(chosen))
            }
        }
    }

    pub fn encode(&self, text: &str) -> Result<EncodedPayload, EncodingError> {
        self.select(text)?.encode(text)
    }
}

impl Default for EncodingSelector {
    fn default() -> Self {
        Self::from_config(&EncodingConfig::default(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{Gsm8Encoder, Latin1Encoder};
    use bytes::Bytes;

    struct Shouting;

    impl Encoder for Shouting {
        fn charset(&self) -> Charset {
            Charset::Custom("SHOUT")
        }

        fn units(&self, c: char) -> Option<usize> {
            c.is_ascii_uppercase().then_some(1)
        }

        fn encode(&self, text: &str) -> Result<EncodedPayload, EncodingError> {
            self.measure(text)?;
            Ok(EncodedPayload {
                charset: self.charset(),
                bytes: Bytes::copy_from_slice(text.as_bytes()),
                units: text.len(),
            })
        }
    }

    #[test]
    fn test_default_prefers_unpacked_gsm() {
        let selector = EncodingSelector::default();
        assert_eq!(selector.select("Hello").unwrap().charset(), Charset::Gsm8);
        assert!(!selector.candidates().contains(&Charset::Gsm7Packed));
    }

    #[test]
    fn test_falls_through_to_latin1_then_ucs2() {
        let selector = EncodingSelector::default();
        assert_eq!(selector.select("façade").unwrap().charset(), Charset::Latin1);
        assert_eq!(selector.select("日本").unwrap().charset(), Charset::Ucs2);
    }

    #[test]
    fn test_raised_packed_priority_wins_over_gsm8() {
        let config = EncodingConfig {
            priorities: EncodingPriorities {
                gsm7_packed: 100_000,
                ..Default::default()
            },
            ..Default::default()
        };
        let selector = EncodingSelector::from_config(&config, Vec::new());
        assert_eq!(
            selector.select("Hello").unwrap().charset(),
            Charset::Gsm7Packed
        );
        assert_eq!(
            selector.candidates(),
            vec![Charset::Gsm7Packed, Charset::Gsm8, Charset::Latin1, Charset::Ucs2]
        );
    }

    #[test]
    fn test_disabled_priority_removes_candidate() {
        let config = EncodingConfig {
            priorities: EncodingPriorities {
                latin1: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let selector = EncodingSelector::from_config(&config, Vec::new());
        assert_eq!(selector.select("façade").unwrap().charset(), Charset::Ucs2);
        assert!(!selector.candidates().contains(&Charset::Latin1));
    }

    #[test]
    fn test_equal_priorities_keep_registration_order() {
        let selector = EncodingSelector::guessing(vec![
            (Arc::new(Latin1Encoder) as Arc<dyn Encoder>, 10),
            (Arc::new(Gsm8Encoder) as Arc<dyn Encoder>, 10),
        ]);
        assert_eq!(selector.select("abc").unwrap().charset(), Charset::Latin1);
    }

    #[test]
    fn test_custom_encoder_joins_the_ordering() {
        let selector = EncodingSelector::from_config(
            &EncodingConfig::default(),
            vec![(Arc::new(Shouting) as Arc<dyn Encoder>, 200_000)],
        );
        assert_eq!(
            selector.select("HELLO").unwrap().charset(),
            Charset::Custom("SHOUT")
        );
        assert_eq!(selector.select("Hello").unwrap().charset(), Charset::Gsm8);
    }

    #[test]
    fn test_guessing_without_match_lists_tried_charsets() {
        let config = EncodingConfig {
            auto_guess: false,
            ..Default::default()
        };
        let custom: Vec<(Arc<dyn Encoder>, i32)> = vec![(Arc::new(Shouting), 1)];
        let selector = EncodingSelector::from_config(&config, custom);
        match selector.select("quiet") {
            Err(EncodingError::Unsupported { tried }) => {
                assert_eq!(tried, vec![Charset::Custom("SHOUT")]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_no_guessing_uses_fallback_and_fails_on_unmappable() {
        let config = EncodingConfig {
            auto_guess: false,
            ..Default::default()
        };
        let selector = EncodingSelector::from_config(&config, Vec::new());
        assert_eq!(selector.candidates(), vec![Charset::Gsm8]);
        assert!(matches!(
            selector.encode("日本"),
            Err(EncodingError::Unmappable { .. })
        ));
    }
}

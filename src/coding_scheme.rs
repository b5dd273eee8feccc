// ABOUTME: Resolves the data_coding byte for an encoded message
// ABOUTME: Fixed value, then custom provider, then automatic mapping per interface version

use crate::datatypes::{
    CharacterEncoding, DataCoding, GeneralAlphabet, InterfaceVersion, MessageClass,
};
use crate::encoding::Charset;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DataCodingError {
    #[error("no data_coding value for {charset} with SMPP {version}")]
    NoCodingScheme {
        charset: Charset,
        version: InterfaceVersion,
    },

    #[error("data coding provider failed")]
    Provider {
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// Computes a data_coding value for a charset. Returning `Ok(None)` defers
/// to the next provider in line.
pub trait DataCodingProvider: Send + Sync {
    fn data_coding(
        &self,
        charset: &Charset,
        version: InterfaceVersion,
    ) -> Result<Option<DataCoding>, DataCodingError>;
}

/// SMPP 3.3 general data coding group (GSM 03.38 section 4)
#[derive(Clone, Copy, Debug, Default)]
pub struct GeneralGroupProvider {
    pub message_class: Option<MessageClass>,
    pub compressed: bool,
}

impl DataCodingProvider for GeneralGroupProvider {
    fn data_coding(
        &self,
        charset: &Charset,
        _version: InterfaceVersion,
    ) -> Result<Option<DataCoding>, DataCodingError> {
        let alphabet = match charset {
            Charset::Gsm7Packed => GeneralAlphabet::Default,
            Charset::Gsm8 => GeneralAlphabet::EightBit,
            Charset::Ucs2 => GeneralAlphabet::Ucs2,
            Charset::Latin1 | Charset::Custom(_) => return Ok(None),
        };
        Ok(Some(DataCoding::general_group(
            alphabet,
            self.message_class,
            self.compressed,
        )))
    }
}

/// SMPP 3.4 / 5.0 character encoding group
#[derive(Clone, Copy, Debug, Default)]
pub struct CharacterEncodingGroupProvider;

impl DataCodingProvider for CharacterEncodingGroupProvider {
    fn data_coding(
        &self,
        charset: &Charset,
        _version: InterfaceVersion,
    ) -> Result<Option<DataCoding>, DataCodingError> {
        let encoding = match charset {
            Charset::Gsm7Packed => CharacterEncoding::SmscDefault,
            Charset::Gsm8 => CharacterEncoding::EightBit,
            Charset::Latin1 => CharacterEncoding::Latin1,
            Charset::Ucs2 => CharacterEncoding::Ucs2,
            Charset::Custom(_) => return Ok(None),
        };
        Ok(Some(DataCoding::character_encoding_group(encoding)))
    }
}

/// Dispatches on the bound interface version
#[derive(Clone, Copy, Debug, Default)]
pub struct AutomaticProvider {
    pub general: GeneralGroupProvider,
    pub character: CharacterEncodingGroupProvider,
}

impl DataCodingProvider for AutomaticProvider {
    fn data_coding(
        &self,
        charset: &Charset,
        version: InterfaceVersion,
    ) -> Result<Option<DataCoding>, DataCodingError> {
        match version {
            InterfaceVersion::SmppV33 => self.general.data_coding(charset, version),
            InterfaceVersion::SmppV34 | InterfaceVersion::SmppV50 => {
                self.character.data_coding(charset, version)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodingSchemeConfig {
    /// Raw data_coding byte used for every message when set
    pub fixed: Option<u8>,
    pub automatic: bool,
    /// Only honoured by the SMPP 3.3 general group
    pub message_class: Option<MessageClass>,
    pub compressed: bool,
}

impl Default for CodingSchemeConfig {
    fn default() -> Self {
        Self {
            fixed: None,
            automatic: true,
            message_class: None,
            compressed: false,
        }
    }
}

#[derive(Clone, Default)]
pub struct CodingSchemeResolver {
    fixed: Option<DataCoding>,
    custom: Option<Arc<dyn DataCodingProvider>>,
    automatic: Option<AutomaticProvider>,
}

impl CodingSchemeResolver {
    pub fn new(
        fixed: Option<DataCoding>,
        custom: Option<Arc<dyn DataCodingProvider>>,
        automatic: Option<AutomaticProvider>,
    ) -> Self {
        Self {
            fixed,
            custom,
            automatic,
        }
    }

    pub fn from_config(
        config: &CodingSchemeConfig,
        custom: Option<Arc<dyn DataCodingProvider>>,
    ) -> Self {
        let automatic = config.automatic.then(|| AutomaticProvider {
            general: GeneralGroupProvider {
                message_class: config.message_class,
                compressed: config.compressed,
            },
            character: CharacterEncodingGroupProvider,
        });
        Self::new(config.fixed.map(DataCoding::from_byte), custom, automatic)
    }

    pub fn resolve(
        &self,
        charset: &Charset,
        version: InterfaceVersion,
    ) -> Result<DataCoding, DataCodingError> {
        if let Some(fixed) = self.fixed {
            return Ok(fixed);
        }
        if let Some(custom) = &self.custom {
            if let Some(value) = custom.data_coding(charset, version)? {
                debug!(%charset, %value, "custom data coding");
                return Ok(value);
            }
        }
        if let Some(automatic) = &self.automatic {
            if let Some(value) = automatic.data_coding(charset, version)? {
                return Ok(value);
            }
        }
        Err(DataCodingError::NoCodingScheme {
            charset: *charset,
            version,
        })
    }
}

impl std::fmt::Debug for CodingSchemeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodingSchemeResolver")
            .field("fixed", &self.fixed)
            .field("custom", &self.custom.is_some())
            .field("automatic", &self.automatic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn automatic() -> CodingSchemeResolver {
        CodingSchemeResolver::from_config(&CodingSchemeConfig::default(), None)
    }

    fn byte(resolver: &CodingSchemeResolver, charset: Charset, version: InterfaceVersion) -> u8 {
        resolver.resolve(&charset, version).unwrap().to_byte()
    }

    #[test]
    fn test_smpp34_uses_character_encoding_group() {
        let resolver = automatic();
        let v34 = InterfaceVersion::SmppV34;
        assert_eq!(byte(&resolver, Charset::Gsm7Packed, v34), 0x00);
        assert_eq!(byte(&resolver, Charset::Gsm8, v34), 0x04);
        assert_eq!(byte(&resolver, Charset::Latin1, v34), 0x03);
        assert_eq!(byte(&resolver, Charset::Ucs2, v34), 0x08);
        assert_eq!(
            byte(&resolver, Charset::Latin1, InterfaceVersion::SmppV50),
            0x03
        );
    }

    #[test]
    fn test_smpp33_uses_general_group() {
        let resolver = automatic();
        let v33 = InterfaceVersion::SmppV33;
        assert_eq!(byte(&resolver, Charset::Gsm7Packed, v33), 0x00);
        assert_eq!(byte(&resolver, Charset::Gsm8, v33), 0x04);
        assert_eq!(byte(&resolver, Charset::Ucs2, v33), 0x08);
    }

    #[test]
    fn test_smpp33_latin1_has_no_mapping() {
        let err = automatic()
            .resolve(&Charset::Latin1, InterfaceVersion::SmppV33)
            .unwrap_err();
        assert!(matches!(
            err,
            DataCodingError::NoCodingScheme {
                charset: Charset::Latin1,
                version: InterfaceVersion::SmppV33
            }
        ));
    }

    #[test]
    fn test_general_group_carries_class_and_compression() {
        let config = CodingSchemeConfig {
            message_class: Some(MessageClass::Flash),
            compressed: true,
            ..Default::default()
        };
        let resolver = CodingSchemeResolver::from_config(&config, None);
        assert_eq!(
            byte(&resolver, Charset::Ucs2, InterfaceVersion::SmppV33),
            0x20 | 0x10 | 0x08
        );
        assert_eq!(
            byte(&resolver, Charset::Ucs2, InterfaceVersion::SmppV34),
            0x08
        );
    }

    #[test]
    fn test_fixed_value_wins() {
        let config = CodingSchemeConfig {
            fixed: Some(0xF0),
            ..Default::default()
        };
        let resolver = CodingSchemeResolver::from_config(&config, None);
        assert_eq!(
            byte(&resolver, Charset::Latin1, InterfaceVersion::SmppV33),
            0xF0
        );
    }

    struct OnlyCustom;

    impl DataCodingProvider for OnlyCustom {
        fn data_coding(
            &self,
            charset: &Charset,
            _version: InterfaceVersion,
        ) -> Result<Option<DataCoding>, DataCodingError> {
            Ok(matches!(charset, Charset::Custom(_)).then(|| DataCoding::from_byte(0x0E)))
        }
    }

    #[test]
    fn test_custom_provider_precedes_automatic_and_may_defer() {
        let resolver = CodingSchemeResolver::from_config(
            &CodingSchemeConfig::default(),
            Some(Arc::new(OnlyCustom)),
        );
        assert_eq!(
            byte(&resolver, Charset::Custom("X"), InterfaceVersion::SmppV34),
            0x0E
        );
        assert_eq!(
            byte(&resolver, Charset::Ucs2, InterfaceVersion::SmppV34),
            0x08
        );
    }

    #[test]
    fn test_disabled_automatic_without_custom_fails() {
        let config = CodingSchemeConfig {
            automatic: false,
            ..Default::default()
        };
        let resolver = CodingSchemeResolver::from_config(&config, None);
        assert!(resolver
            .resolve(&Charset::Gsm7Packed, InterfaceVersion::SmppV34)
            .is_err());
    }
}

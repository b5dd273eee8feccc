// ABOUTME: Turns an SmsMessage into the ordered submit_sm PDUs that carry it
// ABOUTME: Address translation, encoding choice, data_coding resolution and segmentation

mod address;

pub use address::{
    Address, AddressError, AddressTranslator, DefaultAddressTranslator, MAX_SHORT_CODE_LENGTH,
};

use crate::client::{PhoneNumber, SmsMessage};
use crate::coding_scheme::{CodingSchemeResolver, DataCodingError};
use crate::datatypes::{
    ESM_CLASS_UDHI, InterfaceVersion, MAX_SHORT_MESSAGE_LENGTH, SubmitSm,
    SubmitSmValidationError,
};
use crate::encoding::{Charset, EncodingError, EncodingSelector};
use crate::splitter::{Segment, SplitError, SplitterChain};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PreparationError {
    #[error("invalid address")]
    Address(#[from] AddressError),

    #[error("failed to encode message")]
    Encoding(#[from] EncodingError),

    #[error("failed to determine data_coding")]
    DataCoding(#[from] DataCodingError),

    #[error("no splitter supports {0}")]
    NoSplitterAvailable(Charset),

    #[error("failed to split message")]
    Split(#[from] SplitError),

    #[error("user data is {actual} octets, short_message holds at most {MAX_SHORT_MESSAGE_LENGTH}")]
    ShortMessageTooLong { actual: usize },

    #[error("invalid submit_sm")]
    Pdu(#[from] SubmitSmValidationError),
}

/// Produces the PDUs for one message. Replacing it replaces the whole
/// preparation pipeline.
pub trait MessagePreparator: Send + Sync {
    fn prepare(&self, message: &SmsMessage) -> Result<Vec<SubmitSm>, PreparationError>;
}

/// Where user data goes in the submit_sm
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadStrategy {
    #[default]
    ShortMessage,
    /// message_payload TLV with an empty short_message
    MessagePayload,
}

/// Fixed submit_sm fields applied to every PDU
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    pub service_type: String,
    pub registered_delivery: u8,
    pub protocol_id: u8,
    pub priority_flag: u8,
}

impl SubmitOptions {
    pub fn with_delivery_receipt(mut self, requested: bool) -> Self {
        self.registered_delivery = u8::from(requested);
        self
    }
}

#[derive(Clone)]
pub struct DefaultMessagePreparator {
    selector: EncodingSelector,
    resolver: CodingSchemeResolver,
    /// `None` disables splitting
    splitters: Option<SplitterChain>,
    translator: Arc<dyn AddressTranslator>,
    payload: PayloadStrategy,
    interface_version: InterfaceVersion,
    options: SubmitOptions,
}

impl DefaultMessagePreparator {
    pub fn new(
        selector: EncodingSelector,
        resolver: CodingSchemeResolver,
        splitters: Option<SplitterChain>,
        translator: Arc<dyn AddressTranslator>,
    ) -> Self {
        Self {
            selector,
            resolver,
            splitters,
            translator,
            payload: PayloadStrategy::default(),
            interface_version: InterfaceVersion::default(),
            options: SubmitOptions::default(),
        }
    }

    pub fn with_payload(mut self, payload: PayloadStrategy) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_interface_version(mut self, version: InterfaceVersion) -> Self {
        self.interface_version = version;
        self
    }

    pub fn with_options(mut self, options: SubmitOptions) -> Self {
        self.options = options;
        self
    }

    fn address(&self, number: &PhoneNumber) -> Result<Address, AddressError> {
        match number {
            PhoneNumber::Raw(raw) => self.translator.translate(raw),
            PhoneNumber::Addressed(address) => Ok(address.clone()),
        }
    }

    fn segments(&self, text: &str) -> Result<(Charset, Vec<Segment>), PreparationError> {
        let encoder = self.selector.select(text)?;
        let charset = encoder.charset();

        let segments = match &self.splitters {
            Some(chain) => chain
                .select(&charset)
                .ok_or(PreparationError::NoSplitterAvailable(charset))?
                .split(text, encoder.as_ref())?,
            None => vec![Segment {
                header: None,
                payload: encoder.encode(text)?.bytes,
            }],
        };
        Ok((charset, segments))
    }
}

impl MessagePreparator for DefaultMessagePreparator {
    fn prepare(&self, message: &SmsMessage) -> Result<Vec<SubmitSm>, PreparationError> {
        let source = self.address(&message.from)?;
        let destination = self.address(&message.to)?;

        let (charset, segments) = self.segments(&message.content)?;
        let data_coding = self.resolver.resolve(&charset, self.interface_version)?;
        debug!(
            %charset,
            %data_coding,
            segments = segments.len(),
            "prepared message"
        );

        segments
            .iter()
            .map(|segment| {
                let user_data = segment.user_data();
                let esm_class = if segment.header.is_some() {
                    ESM_CLASS_UDHI
                } else {
                    0
                };

                let builder = SubmitSm::builder()
                    .service_type(self.options.service_type.clone())
                    .source_addr_ton(source.ton)
                    .source_addr_npi(source.npi)
                    .source_addr(source.value.clone())
                    .dest_addr_ton(destination.ton)
                    .dest_addr_npi(destination.npi)
                    .destination_addr(destination.value.clone())
                    .esm_class(esm_class)
                    .protocol_id(self.options.protocol_id)
                    .priority_flag(self.options.priority_flag)
                    .registered_delivery(self.options.registered_delivery)
                    .data_coding(data_coding.to_byte());

                let builder = match self.payload {
                    PayloadStrategy::ShortMessage => {
                        if user_data.len() > MAX_SHORT_MESSAGE_LENGTH {
                            return Err(PreparationError::ShortMessageTooLong {
                                actual: user_data.len(),
                            });
                        }
                        builder.short_message(user_data)
                    }
                    PayloadStrategy::MessagePayload => builder.message_payload(user_data),
                };
                Ok(builder.build()?)
            })
            .collect()
    }
}

impl Default for DefaultMessagePreparator {
    fn default() -> Self {
        Self::new(
            EncodingSelector::default(),
            CodingSchemeResolver::from_config(&Default::default(), None),
            Some(SplitterChain::new(vec![Arc::new(
                crate::splitter::StandardSplitter::default(),
            )])),
            Arc::new(DefaultAddressTranslator),
        )
    }
}

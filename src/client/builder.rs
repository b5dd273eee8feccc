// ABOUTME: Builder wiring configuration and custom components into an SmsSender
// ABOUTME: Custom encoders, splitters, providers, translators and preparators are injected here

use super::config::{ConfigError, SenderConfig};
use super::manager::SessionManager;
use super::sender::SmsSender;
use crate::coding_scheme::{CodingSchemeResolver, DataCodingProvider};
use crate::encoding::{Encoder, EncodingSelector};
use crate::preparator::{
    AddressTranslator, DefaultAddressTranslator, DefaultMessagePreparator, MessagePreparator,
    SubmitOptions,
};
use crate::retry::{RetryExecutor, RetryPredicate, can_resend_message, can_retry_connecting};
use crate::splitter::{MessageSplitter, ReferenceNumberGenerator, SplitterChain, StandardSplitter};
use std::sync::Arc;

/// Assembles an [`SmsSender`]
///
/// ```rust,no_run
/// use smpp_sender::client::{SenderConfig, SmsMessage, SmsSenderBuilder};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SenderConfig::load("sender.toml")?;
/// let sender = SmsSenderBuilder::new(config).build().await?;
///
/// sender
///     .send(&SmsMessage::new("ACME", "+33612345678", "Hello!"))
///     .await?;
/// sender.clean().await;
/// # Ok(())
/// # }
/// ```
pub struct SmsSenderBuilder {
    config: SenderConfig,
    encoders: Vec<(Arc<dyn Encoder>, i32)>,
    splitters: Vec<Arc<dyn MessageSplitter>>,
    data_coding: Option<Arc<dyn DataCodingProvider>>,
    translator: Option<Arc<dyn AddressTranslator>>,
    references: Option<Arc<dyn ReferenceNumberGenerator>>,
    preparator: Option<Arc<dyn MessagePreparator>>,
    connect_retryable: RetryPredicate,
    send_retryable: RetryPredicate,
}

impl SmsSenderBuilder {
    pub fn new(config: SenderConfig) -> Self {
        Self {
            config,
            encoders: Vec::new(),
            splitters: Vec::new(),
            data_coding: None,
            translator: None,
            references: None,
            preparator: None,
            connect_retryable: Arc::new(can_retry_connecting),
            send_retryable: Arc::new(can_resend_message),
        }
    }

    /// Adds an encoder competing with the built-ins at `priority`
    pub fn encoder(mut self, encoder: Arc<dyn Encoder>, priority: i32) -> Self {
        self.encoders.push((encoder, priority));
        self
    }

    /// Adds a splitter consulted before the standard one
    pub fn splitter(mut self, splitter: Arc<dyn MessageSplitter>) -> Self {
        self.splitters.push(splitter);
        self
    }

    pub fn data_coding_provider(mut self, provider: Arc<dyn DataCodingProvider>) -> Self {
        self.data_coding = Some(provider);
        self
    }

    pub fn address_translator(mut self, translator: Arc<dyn AddressTranslator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn reference_generator(mut self, generator: Arc<dyn ReferenceNumberGenerator>) -> Self {
        self.references = Some(generator);
        self
    }

    /// Replaces the whole preparation pipeline
    pub fn preparator(mut self, preparator: Arc<dyn MessagePreparator>) -> Self {
        self.preparator = Some(preparator);
        self
    }

    pub fn connect_retryable(mut self, predicate: RetryPredicate) -> Self {
        self.connect_retryable = predicate;
        self
    }

    pub fn send_retryable(mut self, predicate: RetryPredicate) -> Self {
        self.send_retryable = predicate;
        self
    }

    fn default_preparator(&mut self) -> DefaultMessagePreparator {
        let config = &self.config;
        let selector =
            EncodingSelector::from_config(&config.encoding, std::mem::take(&mut self.encoders));
        let resolver = CodingSchemeResolver::from_config(&config.coding_scheme, self.data_coding.take());

        let splitters = config.splitting.enabled.then(|| {
            let references = self
                .references
                .take()
                .unwrap_or_else(|| config.splitting.reference.generator());
            let mut chain = SplitterChain::new(std::mem::take(&mut self.splitters));
            chain.push(Arc::new(StandardSplitter::new(references)));
            chain
        });

        let translator = self
            .translator
            .take()
            .unwrap_or_else(|| Arc::new(DefaultAddressTranslator));

        DefaultMessagePreparator::new(selector, resolver, splitters, translator)
            .with_payload(config.payload)
            .with_interface_version(config.interface_version)
            .with_options(SubmitOptions::default().with_delivery_receipt(config.delivery_receipt))
    }

    /// Validates the configuration, wires the components and, when the
    /// keep-alive strategy requests it, binds the first session
    pub async fn build(mut self) -> Result<SmsSender, ConfigError> {
        self.config.validate()?;

        let preparator: Arc<dyn MessagePreparator> = match self.preparator.take() {
            Some(preparator) => preparator,
            None => Arc::new(self.default_preparator()),
        };

        let config = self.config;
        let manager = SessionManager::new(
            config.address(),
            config.credentials(),
            config.timeouts.clone(),
            config.session.clone(),
            RetryExecutor::new(config.connect_retry.clone(), self.connect_retryable),
        );
        let send_retry = config
            .send_retry
            .clone()
            .map(|policy| RetryExecutor::new(Some(policy), self.send_retryable));

        manager.start().await;
        Ok(SmsSender::new(preparator, manager, send_retry))
    }
}

use std::sync::Arc;

use article_source::ListingPageSource;
use configuration::Settings;
use digest::DigestComposer;
use digest_dispatcher::DigestDispatcher;
use email_client::{DeliveryChannel, EmailClient};
use subscriber_store::{JsonFileSubscriberStore, SubscriberStore};
use summarizer::ChatCompletionSummarizer;

pub mod article_source;
pub mod configuration;
pub mod digest;
pub mod digest_dispatcher;
pub mod domain;
pub mod email_client;
pub mod routes;
pub mod startup;
pub mod subscriber_store;
pub mod summarizer;
pub mod telemetry;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubscriberStore>,
    pub dispatcher: Arc<DigestDispatcher>,
    pub source_name: Arc<str>,
}

impl AppState {
    pub async fn from_configuration(configuration: &Settings) -> anyhow::Result<Self> {
        let email_client = EmailClient::new(&configuration.email)?;
        Self::with_delivery_channel(configuration, Arc::new(email_client)).await
    }

    /// Wires every component from `configuration`, delivering through `channel`.
    pub async fn with_delivery_channel(
        configuration: &Settings,
        channel: Arc<dyn DeliveryChannel>,
    ) -> anyhow::Result<Self> {
        let store: Arc<dyn SubscriberStore> =
            Arc::new(JsonFileSubscriberStore::open(&configuration.store.path).await?);
        let source = ListingPageSource::new(&configuration.source)?;
        let summarizer =
            ChatCompletionSummarizer::new(&configuration.summarizer, &configuration.source.name)?;
        let composer = DigestComposer::new(
            configuration.source.name.clone(),
            configuration.source.base_url.clone(),
        );
        let dispatcher = DigestDispatcher::new(
            Arc::clone(&store),
            Arc::new(source),
            Arc::new(summarizer),
            composer,
            channel,
            configuration.dispatcher.pacing(),
        );
        Ok(Self {
            store,
            dispatcher: Arc::new(dispatcher),
            source_name: configuration.source.name.as_str().into(),
        })
    }
}

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::Span;

use crate::article_source::ArticleSource;
use crate::digest::{DigestComposer, DigestDocument};
use crate::domain::{DigestItem, SubscriberEmail};
use crate::email_client::DeliveryChannel;
use crate::subscriber_store::{StoreError, StoredSubscriber, SubscriberStore};
use crate::summarizer::Summarizer;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to load subscribers.")]
    StorageUnavailable(#[source] StoreError),
    #[error("Failed to render the digest.")]
    Render(#[from] askama::Error),
}

impl std::fmt::Debug for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NoSubscribers,
    Dispatched,
}

/// Stored entries that fail address validation are recorded as undelivered
/// without being attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRecord {
    pub recipient: String,
    pub delivered: bool,
}

/// What happened during one digest run. Individual send failures are part
/// of a successful run.
#[derive(Debug, Clone)]
pub struct DigestRunReport {
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub items: Vec<DigestItem>,
    pub deliveries: Vec<DeliveryRecord>,
}

impl DigestRunReport {
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.delivered).count()
    }

    pub fn failed(&self) -> usize {
        self.deliveries.iter().filter(|d| !d.delivered).count()
    }
}

pub struct DigestDispatcher {
    store: Arc<dyn SubscriberStore>,
    source: Arc<dyn ArticleSource>,
    summarizer: Arc<dyn Summarizer>,
    composer: DigestComposer,
    channel: Arc<dyn DeliveryChannel>,
    pacing: Duration,
}

impl DigestDispatcher {
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        source: Arc<dyn ArticleSource>,
        summarizer: Arc<dyn Summarizer>,
        composer: DigestComposer,
        channel: Arc<dyn DeliveryChannel>,
        pacing: Duration,
    ) -> Self {
        Self {
            store,
            source,
            summarizer,
            composer,
            channel,
            pacing,
        }
    }

    /// Loads subscribers, builds the digest once and sends it to each
    /// subscriber in store order, pausing `pacing` between sends.
    #[tracing::instrument(
        name = "Run daily digest",
        skip_all,
        fields(subscribers = tracing::field::Empty, delivered = tracing::field::Empty, failed = tracing::field::Empty),
        err
    )]
    pub async fn run_daily_digest(&self) -> Result<DigestRunReport, DispatchError> {
        let started_at = Utc::now();
        let subscribers = self
            .store
            .load()
            .await
            .map_err(DispatchError::StorageUnavailable)?;
        Span::current().record("subscribers", subscribers.len());

        if subscribers.is_empty() {
            tracing::info!("No subscribers. Skipping the digest run");
            return Ok(DigestRunReport {
                outcome: RunOutcome::NoSubscribers,
                started_at,
                finished_at: Utc::now(),
                items: Vec::new(),
                deliveries: Vec::new(),
            });
        }

        let items = self.build_items().await;
        let document = self.composer.compose(&items)?;
        let deliveries = self.deliver(&subscribers, &document).await;

        let report = DigestRunReport {
            outcome: RunOutcome::Dispatched,
            started_at,
            finished_at: Utc::now(),
            items,
            deliveries,
        };
        Span::current()
            .record("delivered", report.delivered())
            .record("failed", report.failed());
        tracing::info!("Digest run finished");
        Ok(report)
    }

    #[tracing::instrument(skip_all)]
    async fn build_items(&self) -> Vec<DigestItem> {
        let mut items = Vec::new();
        for candidate in self.source.fetch().await {
            let summary = match candidate.diagnostic {
                Some(diagnostic) => diagnostic,
                None => self.summarizer.summarize(&candidate.title).await,
            };
            items.push(DigestItem {
                title: candidate.title,
                summary,
                link: candidate.link,
            });
        }
        items
    }

    #[tracing::instrument(skip_all)]
    async fn deliver(
        &self,
        subscribers: &[StoredSubscriber],
        document: &DigestDocument,
    ) -> Vec<DeliveryRecord> {
        let mut deliveries = Vec::with_capacity(subscribers.len());
        let mut attempted = false;
        for subscriber in subscribers {
            let delivered = match subscriber {
                StoredSubscriber::Valid(recipient) => {
                    if attempted && !self.pacing.is_zero() {
                        tokio::time::sleep(self.pacing).await;
                    }
                    attempted = true;
                    self.send_one(recipient, document).await
                }
                StoredSubscriber::Invalid(raw) => {
                    tracing::warn!(
                        subscriber_email = %raw,
                        "Skipping a stored subscriber. Their address is invalid"
                    );
                    false
                }
            };
            deliveries.push(DeliveryRecord {
                recipient: subscriber.address().to_string(),
                delivered,
            });
        }
        deliveries
    }

    async fn send_one(&self, recipient: &SubscriberEmail, document: &DigestDocument) -> bool {
        let delivered = self.channel.send(recipient, document).await;
        if !delivered {
            tracing::warn!(subscriber_email = %recipient, "Delivery failed. Moving on");
        }
        delivered
    }
}

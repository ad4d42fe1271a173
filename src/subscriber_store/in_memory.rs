use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{parse_address, AddOutcome, StoreError, StoredSubscriber, SubscriberStore};
use crate::domain::SubscriberEmail;

#[derive(Default)]
pub struct InMemorySubscriberStore {
    subscribers: Mutex<Vec<SubscriberEmail>>,
}

impl InMemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscribers(subscribers: Vec<SubscriberEmail>) -> Self {
        Self {
            subscribers: Mutex::new(subscribers),
        }
    }
}

#[async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    async fn load(&self) -> Result<Vec<StoredSubscriber>, StoreError> {
        let subscribers = self.subscribers.lock().await;
        Ok(subscribers.iter().cloned().map(StoredSubscriber::Valid).collect())
    }

    async fn add_if_absent(&self, address: String) -> Result<AddOutcome, StoreError> {
        let email = parse_address(address)?;
        let mut subscribers = self.subscribers.lock().await;
        if subscribers.contains(&email) {
            return Ok(AddOutcome::AlreadyPresent);
        }
        subscribers.push(email);
        Ok(AddOutcome::Added)
    }
}

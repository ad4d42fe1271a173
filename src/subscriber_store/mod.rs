//! The set of opted-in recipients.
//!
//! Every implementation guarantees that concurrent `add_if_absent` calls for
//! the same address leave exactly one copy behind.

mod in_memory;
mod json_file;

pub use in_memory::InMemorySubscriberStore;
pub use json_file::JsonFileSubscriberStore;

use async_trait::async_trait;

use crate::domain::SubscriberEmail;
use crate::utils::error_chain_fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// One entry of the stored list. Entries that no longer pass validation are
/// still handed out so callers can account for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredSubscriber {
    Valid(SubscriberEmail),
    Invalid(String),
}

impl StoredSubscriber {
    pub fn from_raw(address: String) -> Self {
        match SubscriberEmail::parse(address.clone()) {
            Ok(email) => Self::Valid(email),
            Err(_) => Self::Invalid(address),
        }
    }

    pub fn address(&self) -> &str {
        match self {
            Self::Valid(email) => email.as_ref(),
            Self::Invalid(raw) => raw,
        }
    }
}

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    InvalidAddress(String),
    #[error("Subscriber storage is unavailable.")]
    StorageUnavailable(#[source] anyhow::Error),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Every stored entry, in insertion order. Never returns partial data.
    async fn load(&self) -> Result<Vec<StoredSubscriber>, StoreError>;

    /// Validates `address`, then appends it unless it is already stored.
    async fn add_if_absent(&self, address: String) -> Result<AddOutcome, StoreError>;
}

pub(crate) fn parse_address(address: String) -> Result<SubscriberEmail, StoreError> {
    SubscriberEmail::parse(address).map_err(StoreError::InvalidAddress)
}

mod article;
mod source_base_url;
mod subscriber_email;

pub use article::{ArticleCandidate, DigestItem, NO_NEWS_TITLE};
pub use source_base_url::SourceBaseUrl;
pub use subscriber_email::SubscriberEmail;

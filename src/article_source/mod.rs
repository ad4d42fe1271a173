//! Discovery of today's articles on the source listing page.

mod extraction;

pub use extraction::{default_rules, extract_with_fallback, ExtractionRule, ExtractionRuleError};

use async_trait::async_trait;
use reqwest::{header, Client, ClientBuilder};

use crate::configuration::SourceSettings;
use crate::domain::{ArticleCandidate, SourceBaseUrl};
use crate::utils::truncate_graphemes;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const DIAGNOSTIC_CHARS: usize = 50;

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// At most `max_articles` candidates in document order.
    ///
    /// Degrades to a single [`ArticleCandidate::no_news`] pointing at the
    /// source home page; never fails.
    async fn fetch(&self) -> Vec<ArticleCandidate>;
}

pub struct ListingPageSource {
    http_client: Client,
    base_url: SourceBaseUrl,
    max_articles: usize,
    rules: Vec<ExtractionRule>,
}

impl ListingPageSource {
    pub fn new(config: &SourceSettings) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9".parse()?);

        let http_client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            max_articles: config.max_articles,
            rules: default_rules(),
        })
    }

    pub fn with_rules(mut self, rules: Vec<ExtractionRule>) -> Self {
        self.rules = rules;
        self
    }

    async fn fetch_listing(&self) -> anyhow::Result<String> {
        let bytes = self
            .http_client
            .get(self.base_url.as_ref().clone())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn no_news(&self, diagnostic: String) -> Vec<ArticleCandidate> {
        vec![ArticleCandidate::no_news(
            &self.base_url,
            truncate_graphemes(&diagnostic, DIAGNOSTIC_CHARS),
        )]
    }
}

#[async_trait]
impl ArticleSource for ListingPageSource {
    #[tracing::instrument(name = "Fetch article candidates", skip(self), fields(url = %self.base_url))]
    async fn fetch(&self) -> Vec<ArticleCandidate> {
        let html = match self.fetch_listing().await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(error.cause_chain = ?e, "Failed to fetch the source listing page");
                return self.no_news(format!("Fetch failed: {e}"));
            }
        };

        let candidates: Vec<_> = extract_with_fallback(&self.rules, &html)
            .into_iter()
            .take(self.max_articles)
            .map(|(title, href)| ArticleCandidate::new(title, self.base_url.resolve(&href)))
            .collect();

        if candidates.is_empty() {
            tracing::warn!("No extraction rule matched the source listing page");
            return self.no_news("No articles found on the source page".to_string());
        }
        tracing::info!(count = candidates.len(), "Collected article candidates");
        candidates
    }
}

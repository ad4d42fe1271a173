use super::SourceBaseUrl;

pub const NO_NEWS_TITLE: &str = "No news today";

/// A (title, link) pair pulled off the source listing page.
///
/// `diagnostic` is only set on the placeholder produced when the source
/// could not be read; it then stands in for the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleCandidate {
    pub title: String,
    pub link: String,
    pub diagnostic: Option<String>,
}

impl ArticleCandidate {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            diagnostic: None,
        }
    }

    pub fn no_news(home: &SourceBaseUrl, diagnostic: impl Into<String>) -> Self {
        Self {
            title: NO_NEWS_TITLE.to_string(),
            link: home.to_string(),
            diagnostic: Some(diagnostic.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestItem {
    pub title: String,
    pub summary: String,
    pub link: String,
}

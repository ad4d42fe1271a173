use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

#[derive(thiserror::Error, Debug)]
pub enum ExtractionRuleError {
    #[error("Extraction rule {0} has an invalid pattern")]
    InvalidPattern(&'static str, #[source] regex::Error),
    #[error("Extraction rule {0} needs `href` and `title` named groups")]
    MissingGroups(&'static str),
}

/// One way of recognising article anchors on the listing page.
///
/// The pattern must expose `href` and `title` named groups.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub name: &'static str,
    pattern: Regex,
}

impl ExtractionRule {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, ExtractionRuleError> {
        let pattern =
            Regex::new(pattern).map_err(|e| ExtractionRuleError::InvalidPattern(name, e))?;
        let names: Vec<_> = pattern.capture_names().flatten().collect();
        if !names.contains(&"href") || !names.contains(&"title") {
            return Err(ExtractionRuleError::MissingGroups(name));
        }
        Ok(Self { name, pattern })
    }

    /// (title, href) pairs in document order.
    pub fn extract(&self, html: &str) -> Vec<(String, String)> {
        self.pattern
            .captures_iter(html)
            .filter_map(|c| {
                let href = c.name("href")?.as_str().trim();
                let title = decode_entities(c.name("title")?.as_str()).trim().to_string();
                (!href.is_empty() && !title.is_empty()).then(|| (title, href.to_string()))
            })
            .collect()
    }
}

static DEFAULT_RULES: Lazy<Vec<ExtractionRule>> = Lazy::new(|| {
    vec![
        ExtractionRule::new(
            "class-then-href",
            r#"<a class="article-title" href="(?P<href>.*?)" target="_blank">(?P<title>.*?)</a>"#,
        )
        .expect("built-in extraction rule is valid"),
        ExtractionRule::new(
            "href-then-class",
            r#"<a href="(?P<href>.*?)" class="article-title" target="_blank">(?P<title>.*?)</a>"#,
        )
        .expect("built-in extraction rule is valid"),
    ]
});

/// Rules tried in order until one matches anything.
pub fn default_rules() -> Vec<ExtractionRule> {
    DEFAULT_RULES.clone()
}

/// Runs each rule in turn and keeps the first non-empty result.
pub fn extract_with_fallback(rules: &[ExtractionRule], html: &str) -> Vec<(String, String)> {
    for rule in rules {
        let matches = rule.extract(html);
        if !matches.is_empty() {
            tracing::debug!(rule = rule.name, count = matches.len(), "Extraction rule matched");
            return matches;
        }
    }
    Vec::new()
}

/// Text content of an HTML fragment, with character references resolved.
fn decode_entities(s: &str) -> String {
    Html::parse_fragment(s).root_element().text().collect()
}

use askama_axum::Template;

use crate::domain::{DigestItem, SourceBaseUrl, NO_NEWS_TITLE};

const NO_NEWS_SUMMARY: &str = "No articles were collected today.";

#[derive(Template)]
#[template(path = "digest.html")]
struct DigestHtml<'a> {
    heading: &'a str,
    items: &'a [DigestItem],
}

#[derive(Template)]
#[template(path = "digest.txt")]
struct DigestText<'a> {
    heading: &'a str,
    items: &'a [DigestItem],
}

/// A rendered digest, ready to be addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestDocument {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Renders digest items into a self-contained message. Pure, no I/O.
pub struct DigestComposer {
    source_name: String,
    home: SourceBaseUrl,
}

impl DigestComposer {
    pub fn new(source_name: impl Into<String>, home: SourceBaseUrl) -> Self {
        Self {
            source_name: source_name.into(),
            home,
        }
    }

    pub fn subject(&self) -> String {
        format!("[Daily Picks] {} digest", self.source_name)
    }

    /// Items are rendered in the given order. An empty list renders a single
    /// "no news" entry linking to the source home page.
    pub fn compose(&self, items: &[DigestItem]) -> Result<DigestDocument, askama::Error> {
        let placeholder;
        let items = if items.is_empty() {
            placeholder = [DigestItem {
                title: NO_NEWS_TITLE.to_string(),
                summary: NO_NEWS_SUMMARY.to_string(),
                link: self.home.to_string(),
            }];
            &placeholder[..]
        } else {
            items
        };

        let heading = format!("Daily {} news picks", self.source_name);
        Ok(DigestDocument {
            subject: self.subject(),
            html_body: DigestHtml {
                heading: &heading,
                items,
            }
            .render()?,
            text_body: DigestText {
                heading: &heading,
                items,
            }
            .render()?,
        })
    }
}

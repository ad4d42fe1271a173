use reqwest::Url;
use serde::{de::Visitor, Deserialize, Deserializer};

/// Home page of the news source. Relative article links resolve against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBaseUrl(Url);

impl AsRef<Url> for SourceBaseUrl {
    fn as_ref(&self) -> &Url {
        &self.0
    }
}

impl std::fmt::Display for SourceBaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for SourceBaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SourceBaseUrlVisitor;

        impl<'de> Visitor<'de> for SourceBaseUrlVisitor {
            type Value = SourceBaseUrl;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a valid base url string")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                SourceBaseUrl::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(SourceBaseUrlVisitor)
    }
}

impl SourceBaseUrl {
    pub fn parse(url: &str) -> Result<Self, String> {
        let url = Url::parse(url).map_err(|e| e.to_string())?;
        if !url.path().eq("/") {
            return Err(format!("expected base url. found: {url}"));
        }
        Ok(Self(url))
    }

    /// Absolute links are returned verbatim, anything else is joined onto
    /// the base url. A link that cannot be joined is kept as it was found.
    pub fn resolve(&self, link: &str) -> String {
        if Url::parse(link).is_ok() {
            return link.to_string();
        }
        self.0
            .join(link)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| link.to_string())
    }
}

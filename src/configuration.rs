use std::path::PathBuf;
use std::time::Duration;

use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::{SourceBaseUrl, SubscriberEmail};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub store: StoreSettings,
    pub source: SourceSettings,
    pub summarizer: SummarizerSettings,
    pub email: EmailSettings,
    pub dispatcher: DispatcherSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct StoreSettings {
    pub path: PathBuf,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SourceSettings {
    pub base_url: SourceBaseUrl,
    pub name: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_millis: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_articles: usize,
}

impl SourceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct SummarizerSettings {
    pub endpoint: String,
    pub api_key: Secret<String>,
    pub model: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_millis: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_tokens: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub temperature: f32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub fallback_chars: usize,
}

impl SummarizerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Implicit TLS from the first byte (SMTPS, usually port 465).
    #[default]
    Tls,
    /// Plain connection upgraded with STARTTLS (usually port 587).
    StartTls,
}

#[derive(Deserialize, Clone, Debug)]
pub struct EmailSettings {
    pub smtp_host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub smtp_port: u16,
    #[serde(default)]
    pub security: SmtpSecurity,
    pub sender: SubscriberEmail,
    pub sender_name: String,
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_millis: u64,
}

impl EmailSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct DispatcherSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub pacing_millis: u64,
}

impl DispatcherSettings {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_millis)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    pub enabled: bool,
    pub endpoint: String,
    pub api_key_header: String,
    pub api_key: Secret<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            api_key_header: "x-honeycomb-team".to_string(),
            api_key: Secret::new(String::new()),
        }
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}

/// Layers `configuration/base.yaml`, the environment-specific file and
/// `APP_`-prefixed variables (`APP_SUMMARIZER__API_KEY=...`).
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use news_digest::configuration::{
    ApplicationSettings, DispatcherSettings, EmailSettings, Settings, SmtpSecurity,
    SourceSettings, StoreSettings, SummarizerSettings, TelemetrySettings,
};
use news_digest::digest::DigestDocument;
use news_digest::domain::{SourceBaseUrl, SubscriberEmail};
use news_digest::email_client::DeliveryChannel;
use news_digest::startup::Application;
use news_digest::telemetry::init_subscriber;
use news_digest::AppState;
use once_cell::sync::Lazy;
use secrecy::Secret;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::MockServer;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    let telemetry = TelemetrySettings::default();

    if std::env::var("TEST_LOG").is_ok() {
        init_subscriber(subscriber_name, default_filter_level, std::io::stdout, &telemetry);
    } else {
        init_subscriber(subscriber_name, default_filter_level, std::io::sink, &telemetry);
    };
});

/// Delivery channel that records every digest instead of sending it.
#[derive(Default)]
pub struct RecordingChannel {
    failing: Vec<String>,
    sent: Mutex<Vec<(String, DigestDocument, bool)>>,
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<(String, DigestDocument, bool)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn send(&self, recipient: &SubscriberEmail, document: &DigestDocument) -> bool {
        let delivered = !self.failing.iter().any(|f| f == recipient.as_ref());
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), document.clone(), delivered));
        delivered
    }
}

pub struct TestApp {
    pub address: String,
    pub store_path: PathBuf,
    pub source_server: MockServer,
    pub ai_server: MockServer,
    pub channel: Arc<RecordingChannel>,
}

impl TestApp {
    pub async fn post_subscribe(&self, body: &Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/api/subscribe", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_subscribe_raw(
        &self,
        body: &'static str,
        content_type: &str,
    ) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/api/subscribe", &self.address))
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_send_news(&self) -> reqwest::Response {
        reqwest::Client::new()
            .get(&format!("{}/api/send_news", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_home(&self) -> reqwest::Response {
        reqwest::Client::new()
            .get(&format!("{}/", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub fn stored_subscribers(&self) -> Vec<String> {
        let content = std::fs::read_to_string(&self.store_path).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    /// Polls the recording channel until `count` sends happened.
    pub async fn wait_for_deliveries(&self, count: usize) -> Vec<(String, DigestDocument, bool)> {
        for _ in 0..100 {
            let sent = self.channel.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!(
            "Expected {count} deliveries, saw {}",
            self.channel.sent().len()
        );
    }
}

pub fn chat_completion(content: &str) -> Value {
    json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
}

pub async fn spawn_app() -> TestApp {
    spawn_app_failing_for(&[]).await
}

pub async fn spawn_app_failing_for(failing: &[&str]) -> TestApp {
    Lazy::force(&TRACING);

    let source_server = MockServer::start().await;
    let ai_server = MockServer::start().await;
    let store_path = std::env::temp_dir()
        .join(format!("news-digest-api-{}", Uuid::new_v4()))
        .join("subscribers.json");

    let configuration = Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        store: StoreSettings {
            path: store_path.clone(),
        },
        source: SourceSettings {
            base_url: SourceBaseUrl::parse(&source_server.uri()).unwrap(),
            name: "Test source".into(),
            timeout_millis: 1000,
            max_articles: 5,
        },
        summarizer: SummarizerSettings {
            endpoint: format!("{}/v1/chat/completions", ai_server.uri()),
            api_key: Secret::new("test-key".into()),
            model: "test-model".into(),
            timeout_millis: 1000,
            max_tokens: 150,
            temperature: 0.7,
            fallback_chars: 100,
        },
        email: EmailSettings {
            smtp_host: "127.0.0.1".into(),
            smtp_port: 1,
            security: SmtpSecurity::Tls,
            sender: SubscriberEmail::parse("digest@example.com".into()).unwrap(),
            sender_name: "Daily Digest".into(),
            password: Secret::new("password".into()),
            timeout_millis: 1000,
        },
        dispatcher: DispatcherSettings { pacing_millis: 0 },
        telemetry: TelemetrySettings::default(),
    };

    let channel = Arc::new(RecordingChannel {
        failing: failing.iter().map(|f| f.to_string()).collect(),
        ..Default::default()
    });
    let app_state = AppState::with_delivery_channel(&configuration, channel.clone())
        .await
        .expect("Failed to build application state.");
    let application = Application::build_with_state(&configuration.application, app_state)
        .await
        .expect("Failed to build application.");
    let port = application.port();
    tokio::spawn(application.run_until_stopped());

    TestApp {
        address: format!("http://127.0.0.1:{port}"),
        store_path,
        source_server,
        ai_server,
        channel,
    }
}

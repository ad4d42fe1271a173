use std::time::Duration;

use linkify::{LinkFinder, LinkKind};
use news_digest::routes::ApiResponse;
use serde_json::json;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{chat_completion, spawn_app, spawn_app_failing_for, TestApp};

fn listing(count: usize) -> String {
    let anchors: String = (1..=count)
        .map(|i| {
            format!(
                r#"<div><a class="article-title" href="/pd/{i}.html" target="_blank">Article {i}</a></div>"#
            )
        })
        .collect();
    format!("<html><body>{anchors}</body></html>")
}

async fn subscribe_all(app: &TestApp, addresses: &[&str]) {
    for address in addresses {
        let response = app.post_subscribe(&json!({ "email": address })).await;
        assert_eq!(response.status().as_u16(), 200);
    }
}

fn links(text: &str) -> Vec<String> {
    LinkFinder::new()
        .links(text)
        .filter(|l| *l.kind() == LinkKind::Url)
        .map(|l| l.as_str().to_owned())
        .collect()
}

#[tokio::test]
async fn send_news_answers_immediately_and_delivers_to_every_subscriber() {
    let app = spawn_app_failing_for(&["two@b.com"]).await;
    subscribe_all(&app, &["one@b.com", "two@b.com", "three@b.com"]).await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(7)))
        .expect(1)
        .mount(&app.source_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("An AI summary.")))
        .expect(5)
        .mount(&app.ai_server)
        .await;

    let response = app.get_send_news().await;

    assert_eq!(response.status().as_u16(), 200);
    let body: ApiResponse = response.json().await.unwrap();
    assert!(body.success);

    let sent = app.wait_for_deliveries(3).await;
    let outcomes: Vec<_> = sent.iter().map(|(r, _, ok)| (r.as_str(), *ok)).collect();
    assert_eq!(
        outcomes,
        vec![("one@b.com", true), ("two@b.com", false), ("three@b.com", true)]
    );
    assert!(sent.iter().all(|(_, document, _)| *document == sent[0].1));

    let document = &sent[0].1;
    assert!(document.html_body.contains("An AI summary."));
    let expected: Vec<_> = (1..=5)
        .map(|i| format!("{}/pd/{i}.html", app.source_server.uri()))
        .collect();
    assert_eq!(links(&document.text_body), expected);
}

#[tokio::test]
async fn send_news_with_no_subscribers_sends_nothing() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(3)))
        .expect(0)
        .mount(&app.source_server)
        .await;

    let response = app.get_send_news().await;

    assert_eq!(response.status().as_u16(), 200);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(app.channel.sent().is_empty());
}

#[tokio::test]
async fn an_unavailable_source_still_produces_a_digest() {
    let app = spawn_app().await;
    subscribe_all(&app, &["one@b.com"]).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.source_server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("unused")))
        .expect(0)
        .mount(&app.ai_server)
        .await;

    app.get_send_news().await;

    let sent = app.wait_for_deliveries(1).await;
    let document = &sent[0].1;
    assert!(document.text_body.contains("No news today"));
    assert_eq!(
        links(&document.text_body),
        vec![format!("{}/", app.source_server.uri())]
    );
}

#[tokio::test]
async fn an_unavailable_summarizer_falls_back_to_titles() {
    let app = spawn_app().await;
    subscribe_all(&app, &["one@b.com"]).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(2)))
        .mount(&app.source_server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&app.ai_server)
        .await;

    app.get_send_news().await;

    let sent = app.wait_for_deliveries(1).await;
    let text = &sent[0].1.text_body;
    assert_eq!(text.matches("Article 1").count(), 2);
    assert_eq!(text.matches("Article 2").count(), 2);
}

use news_digest::routes::ApiResponse;
use serde_json::json;

use crate::helpers::spawn_app;

#[tokio::test]
async fn subscribe_returns_a_200_for_a_valid_address() {
    let app = spawn_app().await;

    let response = app.post_subscribe(&json!({ "email": "a@b.com" })).await;

    assert_eq!(200, response.status().as_u16());
    let body: ApiResponse = response.json().await.unwrap();
    assert!(body.success);
    assert_eq!(app.stored_subscribers(), vec!["a@b.com"]);
}

#[tokio::test]
async fn subscribing_twice_is_acknowledged_without_a_duplicate() {
    let app = spawn_app().await;
    app.post_subscribe(&json!({ "email": "a@b.com" })).await;

    let response = app.post_subscribe(&json!({ "email": "a@b.com" })).await;

    assert_eq!(200, response.status().as_u16());
    let body: ApiResponse = response.json().await.unwrap();
    assert!(body.success);
    assert!(body.msg.contains("already subscribed"), "{}", body.msg);
    assert_eq!(app.stored_subscribers().len(), 1);
}

#[tokio::test]
async fn subscribe_returns_a_400_for_invalid_addresses() {
    let app = spawn_app().await;
    let test_cases = vec![
        (json!({ "email": "bad" }), "missing the @"),
        (json!({ "email": "" }), "empty address"),
        (json!({ "email": "   " }), "whitespace only"),
        (json!({}), "missing the email field"),
    ];

    for (invalid_body, description) in test_cases {
        let response = app.post_subscribe(&invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
        let body: ApiResponse = response.json().await.unwrap();
        assert!(!body.success);
    }
    assert!(app.stored_subscribers().is_empty());
}

#[tokio::test]
async fn subscribe_answers_malformed_bodies_with_a_json_400() {
    let app = spawn_app().await;
    let test_cases = vec![
        ("{not json", "application/json", "invalid JSON"),
        (r#"{"email": 42}"#, "application/json", "a non-string email"),
        (r#"["a@b.com"]"#, "application/json", "a JSON array"),
        (r#"{"email": "a@b.com"}"#, "text/plain", "the wrong content type"),
    ];

    for (raw_body, content_type, description) in test_cases {
        let response = app.post_subscribe_raw(raw_body, content_type).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
        let body: ApiResponse = response
            .json()
            .await
            .unwrap_or_else(|e| panic!("No JSON body for {description}: {e}"));
        assert!(!body.success);
    }
    assert!(app.stored_subscribers().is_empty());
}

#[tokio::test]
async fn surrounding_whitespace_is_trimmed_but_case_is_kept() {
    let app = spawn_app().await;

    app.post_subscribe(&json!({ "email": "  Ursula@Example.com \n" }))
        .await;

    assert_eq!(app.stored_subscribers(), vec!["Ursula@Example.com"]);
}

#[tokio::test]
async fn subscribe_returns_a_500_when_the_store_is_corrupt() {
    let app = spawn_app().await;
    std::fs::write(&app.store_path, "this is not json").unwrap();

    let response = app.post_subscribe(&json!({ "email": "a@b.com" })).await;

    assert_eq!(500, response.status().as_u16());
    let body: ApiResponse = response.json().await.unwrap();
    assert!(!body.success);
    assert_eq!(
        std::fs::read_to_string(&app.store_path).unwrap(),
        "this is not json"
    );
}

#[tokio::test]
async fn concurrent_subscriptions_of_one_address_are_stored_once() {
    let app = spawn_app().await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let url = format!("{}/api/subscribe", app.address);
            tokio::spawn(async move {
                reqwest::Client::new()
                    .post(url)
                    .json(&json!({ "email": "race@b.com" }))
                    .send()
                    .await
                    .expect("Failed to execute request.")
                    .status()
                    .as_u16()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }

    assert_eq!(app.stored_subscribers(), vec!["race@b.com"]);
}

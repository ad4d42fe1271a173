use crate::helpers::spawn_app;

#[tokio::test]
async fn the_subscription_page_is_served() {
    let app = spawn_app().await;

    let response = app.get_home().await;

    assert_eq!(response.status().as_u16(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains("Daily Test source digest"));
    assert!(html.contains("/api/subscribe"));
}

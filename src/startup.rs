use axum::extract::Request;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::configuration::{ApplicationSettings, Settings};
use crate::routes::{health_check, home, send_news, subscribe};
use crate::AppState;

pub struct Application {
    port: u16,
    listener: TcpListener,
    app_state: AppState,
}

impl Application {
    pub async fn build(configuration: Settings) -> anyhow::Result<Self> {
        let app_state = AppState::from_configuration(&configuration).await?;
        Self::build_with_state(&configuration.application, app_state).await
    }

    pub async fn build_with_state(
        settings: &ApplicationSettings,
        app_state: AppState,
    ) -> anyhow::Result<Self> {
        let address = format!("{}:{}", settings.host, settings.port);
        let listener = TcpListener::bind(&address).await?;
        let port = listener.local_addr()?.port();
        Ok(Self {
            port,
            listener,
            app_state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        tracing::info!(port = self.port, "Listening");
        axum::serve(self.listener, router(self.app_state)).await
    }
}

pub fn router(app_state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id());

    Router::new()
        .route("/", get(home))
        .route("/health_check", get(health_check))
        .route("/api/subscribe", post(subscribe))
        .route("/api/send_news", get(send_news))
        .layer(middleware)
        .with_state(app_state)
}

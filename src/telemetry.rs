use opentelemetry_otlp::WithExportConfig;
use secrecy::ExposeSecret;
use tokio::task::JoinHandle;
use tonic::metadata::{Ascii, MetadataKey, MetadataMap};
use tracing::subscriber::set_global_default;
use tracing_log::LogTracer;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

use crate::configuration::TelemetrySettings;
use opentelemetry_sdk::trace::Tracer;

pub fn init_subscriber<Sink>(
    name: String,
    env_filter: String,
    sink: Sink,
    settings: &TelemetrySettings,
) where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    LogTracer::init().expect("Failed to set logger");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let formatting_layer = fmt::layer().with_target(true).with_writer(sink);

    let registry = Registry::default().with(env_filter).with(formatting_layer);
    match telemetry_layer(settings) {
        Ok(Some(open_telemetry_tracer)) => {
            let telemetry_layer = tracing_opentelemetry::layer().with_tracer(open_telemetry_tracer);
            set_global_default(registry.with(telemetry_layer)).expect("Failed to set subscriber");
        }
        Ok(None) => set_global_default(registry).expect("Failed to set subscriber"),
        Err(e) => {
            set_global_default(registry).expect("Failed to set subscriber");
            tracing::warn!(service = %name, error = ?e, "Trace export is disabled");
        }
    }
}

pub fn telemetry_layer(settings: &TelemetrySettings) -> anyhow::Result<Option<Tracer>> {
    if !settings.enabled {
        return Ok(None);
    }
    let mut meta_data = MetadataMap::new();
    meta_data.insert(
        MetadataKey::<Ascii>::from_bytes(settings.api_key_header.as_bytes())?,
        settings.api_key.expose_secret().parse()?,
    );
    let open_telemetry_tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_metadata(meta_data)
                .with_endpoint(&settings.endpoint)
                .with_tls_config(Default::default()),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;
    Ok(Some(open_telemetry_tracer))
}

/// `tokio::task::spawn` that keeps the caller's span as the parent.
pub fn spawn_with_tracing<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    use tracing::Instrument;
    tokio::spawn(future.instrument(tracing::Span::current()))
}

use news_digest::configuration::get_configuration;
use news_digest::startup::Application;
use news_digest::telemetry::init_subscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().expect("Failed to read configuration.");
    init_subscriber(
        "news_digest".into(),
        "info".into(),
        std::io::stdout,
        &configuration.telemetry,
    );

    let application = Application::build(configuration).await?;
    application.run_until_stopped().await?;
    Ok(())
}

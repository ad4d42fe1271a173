//! Runs one digest run and exits. Meant to be invoked by an external scheduler.

use news_digest::configuration::get_configuration;
use news_digest::digest_dispatcher::RunOutcome;
use news_digest::telemetry::init_subscriber;
use news_digest::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().expect("Failed to read configuration.");
    init_subscriber(
        "send_digest".into(),
        "info".into(),
        std::io::stdout,
        &configuration.telemetry,
    );

    let state = AppState::from_configuration(&configuration).await?;
    let report = state.dispatcher.run_daily_digest().await?;
    match report.outcome {
        RunOutcome::NoSubscribers => println!("No subscribers. Nothing was sent."),
        RunOutcome::Dispatched => println!(
            "Sent {} digest(s), {} failed.",
            report.delivered(),
            report.failed()
        ),
    }
    Ok(())
}

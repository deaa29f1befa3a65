use anyhow::Result;
use chat_push_core::load_config;
use chat_push_core::metrics::gather_metrics;
use chat_push_core::tracing::init_tracing_from_config;
use chat_push_notifier::initialize;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = load_config(Some("config"));
    init_tracing_from_config(Some(&app_config.logging));
    app_config.validate_references()?;

    let context = initialize(app_config)?;

    info!("Starting chat push notifier");
    context.consumer.run().await?;

    info!("Trigger consumer stopped, final metrics:\n{}", gather_metrics());
    Ok(())
}

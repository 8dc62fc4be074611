//! `switchyard dispatch`: run one event through the pipeline.

use {
    anyhow::Context,
    switchyard_middleware::{ChannelType, DispatchOutcome, PipelineManager},
    tracing::info,
};

pub async fn dispatch(manager: &PipelineManager, channel: &str, event: &str) -> anyhow::Result<()> {
    let channel: ChannelType = channel.parse()?;
    let value: serde_json::Value =
        serde_json::from_str(event).context("--event must be a JSON object")?;

    let summary = manager.reload();
    info!(
        incoming = summary.incoming.main.len(),
        outgoing = summary.outgoing.main.len(),
        "pipeline loaded"
    );

    let outcome = manager.dispatch_value(channel, value).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if matches!(outcome, DispatchOutcome::Unhandled { .. }) {
        anyhow::bail!("event was not handled by any recovery middleware");
    }
    Ok(())
}

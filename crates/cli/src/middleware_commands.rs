//! CLI commands for inspecting and customizing middleware order.

use {
    switchyard_middleware::{CustomizationEntry, EffectiveMiddleware, PipelineManager},
    tracing::warn,
};

pub fn list(manager: &PipelineManager, json: bool) -> anyhow::Result<()> {
    let list = manager.effective_list();

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if list.is_empty() {
        println!("No middleware registered.");
        return Ok(());
    }
    for m in &list {
        println!("{}", format_row(m));
    }
    Ok(())
}

fn format_row(m: &EffectiveMiddleware) -> String {
    let status = if m.enabled {
        "✓"
    } else {
        "✗"
    };
    let mut row = format!(
        "  {status} {name} [{channel}] order={order}",
        name = m.name,
        channel = m.channel,
        order = m.order,
    );
    if m.customized {
        row.push_str(" (customized)");
    }
    if let Some(ref desc) = m.description {
        row.push_str(" - ");
        row.push_str(desc);
    }
    row
}

pub fn set(
    manager: &PipelineManager,
    name: &str,
    order: Option<i32>,
    enabled: bool,
) -> anyhow::Result<()> {
    let current = manager.effective_list().into_iter().find(|m| m.name == name);
    if current.is_none() {
        warn!(name, "no middleware with this name is registered; saving override anyway");
    }
    let order = order
        .or(current.as_ref().map(|m| m.order))
        .unwrap_or_default();

    manager.set_customizations([CustomizationEntry::new(name, order, enabled)])?;
    println!(
        "{name}: order={order} {}",
        if enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    Ok(())
}

pub fn reset(manager: &PipelineManager) -> anyhow::Result<()> {
    manager.reset_customizations()?;
    println!("Middleware customizations reset to defaults.");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use switchyard_middleware::{ChainHandler, ChannelType};

    use super::*;

    fn entry(enabled: bool, customized: bool, description: Option<&str>) -> EffectiveMiddleware {
        EffectiveMiddleware {
            name: "event-logger".into(),
            channel: ChannelType::Incoming,
            order: -5,
            enabled,
            customized,
            description: description.map(Into::into),
            handler: ChainHandler::main_fn(|_| Ok(())),
        }
    }

    #[test]
    fn row_shows_state_and_order() {
        assert_eq!(
            format_row(&entry(true, false, None)),
            "  ✓ event-logger [incoming] order=-5"
        );
        assert_eq!(
            format_row(&entry(false, true, Some("log events"))),
            "  ✗ event-logger [incoming] order=-5 (customized) - log events"
        );
    }
}

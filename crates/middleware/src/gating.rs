//! Gate installed at the head of every chain on reload.

use std::sync::Arc;

use {async_trait::async_trait, switchyard_config::GateConfig, tracing::debug};

use crate::{
    chain::MiddlewareChain,
    channel::ChannelType,
    error::Error,
    event::Event,
    handler::{ChainHandler, Middleware},
};

/// Installs handlers that must run before every user middleware.
///
/// [`PipelineManager::reload`](crate::manager::PipelineManager::reload)
/// calls [`ChainGate::install`] exactly once per chain it builds, before any
/// registered middleware is added. Each channel gets its own install, so a
/// reload calls it once for `incoming` and once for `outgoing`.
pub trait ChainGate: Send + Sync {
    fn install(&self, channel: ChannelType, chain: &mut MiddlewareChain);
}

/// Gate that installs nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenGate;

impl ChainGate for OpenGate {
    fn install(&self, _channel: ChannelType, _chain: &mut MiddlewareChain) {}
}

/// Gate that only lets events from allowlisted platforms through.
///
/// An empty allowlist allows every platform and installs nothing. Refused
/// events fail with [`Error::PlatformNotAllowed`] and go to the recovery
/// chain like any other handler failure.
#[derive(Debug, Clone, Default)]
pub struct PlatformGate {
    allowed: Arc<[String]>,
}

impl PlatformGate {
    pub const HANDLER_NAME: &'static str = "platform-gate";

    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.allowed_platforms.iter().cloned())
    }
}

impl ChainGate for PlatformGate {
    fn install(&self, channel: ChannelType, chain: &mut MiddlewareChain) {
        if self.allowed.is_empty() {
            return;
        }
        chain.register(
            Self::HANDLER_NAME,
            ChainHandler::Main(Arc::new(PlatformGateMiddleware {
                channel,
                allowed: Arc::clone(&self.allowed),
            })),
        );
    }
}

struct PlatformGateMiddleware {
    channel: ChannelType,
    allowed: Arc<[String]>,
}

#[async_trait]
impl Middleware for PlatformGateMiddleware {
    async fn handle(&self, event: &mut Event) -> anyhow::Result<()> {
        if is_allowed(&event.platform, &self.allowed) {
            return Ok(());
        }
        debug!(channel = %self.channel, platform = %event.platform, "platform gate refused event");
        Err(Error::PlatformNotAllowed {
            platform: event.platform.clone(),
            channel: self.channel.to_string(),
        }
        .into())
    }
}

/// Case-insensitive allowlist check; entries may contain `*` wildcards.
/// An empty allowlist allows everything.
pub fn is_allowed(platform: &str, allowlist: &[String]) -> bool {
    if allowlist.is_empty() {
        return true;
    }
    let platform = platform.to_lowercase();
    allowlist
        .iter()
        .any(|pattern| wildcard_match(&pattern.to_lowercase(), &platform))
}

/// Match `text` against `pattern`, where `*` stands for any run of characters.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut segments = pattern.split('*');
    // split always yields at least one item.
    let first = segments.next().unwrap_or_default();
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let tail: Vec<&str> = segments.collect();
    let Some((last, middle)) = tail.split_last() else {
        // No wildcard: the whole pattern must equal the text.
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

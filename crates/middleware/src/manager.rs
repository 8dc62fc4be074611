//! Pipeline manager: owns the registry, the customization store and the two
//! active chains, and rebuilds the chains on reload.

use std::sync::{Arc, RwLock};

use {
    serde::Serialize,
    serde_json::Value,
    switchyard_config::SwitchyardConfig,
    tracing::{debug, info, warn},
};

use crate::{
    chain::{DispatchOutcome, MiddlewareChain},
    channel::ChannelType,
    customizations::{CustomizationEntry, CustomizationStore},
    error::Result,
    event::{Event, HostContext},
    gating::{ChainGate, PlatformGate},
    handler::MiddlewareDefinition,
    registry::MiddlewareRegistry,
    resolver::{self, EffectiveMiddleware},
};

/// What a reload installed on one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainSummary {
    pub main: Vec<String>,
    pub recovery: Vec<String>,
    /// Middleware left out because they are disabled.
    pub skipped: Vec<String>,
}

/// Result of [`PipelineManager::reload`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    pub incoming: ChainSummary,
    pub outgoing: ChainSummary,
}

type ActiveChain = RwLock<Option<Arc<MiddlewareChain>>>;

/// Single owner of all pipeline state. Construct once at startup and share
/// by reference (typically `Arc<PipelineManager>`).
///
/// Until [`reload`](Self::reload) has run, dispatching on a channel is a
/// logged no-op.
pub struct PipelineManager {
    host: Arc<HostContext>,
    gate: Arc<dyn ChainGate>,
    registry: RwLock<MiddlewareRegistry>,
    customizations: RwLock<CustomizationStore>,
    incoming: ActiveChain,
    outgoing: ActiveChain,
}

impl PipelineManager {
    pub fn new(host: HostContext, customizations: CustomizationStore, gate: Arc<dyn ChainGate>) -> Self {
        Self {
            host: Arc::new(host),
            gate,
            registry: RwLock::new(MiddlewareRegistry::new()),
            customizations: RwLock::new(customizations),
            incoming: RwLock::new(None),
            outgoing: RwLock::new(None),
        }
    }

    /// Build a manager from config: resolve the data directory, open (or
    /// create) the customization store and install the platform gate.
    pub fn from_config(config: SwitchyardConfig) -> Result<Self> {
        let data_dir = config
            .data_dir
            .clone()
            .unwrap_or_else(switchyard_config::data_dir);
        let store = CustomizationStore::open(config.customizations_path(&data_dir))?;
        let gate = Arc::new(PlatformGate::from_config(&config.gate));
        Ok(Self::new(HostContext::new(data_dir, config), store, gate))
    }

    pub fn host_context(&self) -> Arc<HostContext> {
        Arc::clone(&self.host)
    }

    // ── Registry ────────────────────────────────────────────────────────────

    /// Declare a middleware. Returns `false` (and logs) if rejected.
    ///
    /// Takes effect on the next [`reload`](Self::reload).
    pub fn register(&self, definition: MiddlewareDefinition) -> bool {
        self.registry
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .register(definition)
    }

    /// Every registered middleware with customizations applied, sorted by
    /// effective order.
    pub fn effective_list(&self) -> Vec<EffectiveMiddleware> {
        let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
        let customizations = self
            .customizations
            .read()
            .unwrap_or_else(|e| e.into_inner());
        resolver::effective_list(&registry, customizations.all())
    }

    // ── Customizations ──────────────────────────────────────────────────────

    /// Upsert and persist overrides. Reloads the chains if they were loaded.
    pub fn set_customizations(
        &self,
        entries: impl IntoIterator<Item = CustomizationEntry>,
    ) -> Result<()> {
        self.customizations
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .set_customizations(entries)?;
        self.reload_if_loaded();
        Ok(())
    }

    /// Clear and persist an empty override mapping. Reloads the chains if
    /// they were loaded.
    pub fn reset_customizations(&self) -> Result<()> {
        self.customizations
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .reset_customizations()?;
        self.reload_if_loaded();
        Ok(())
    }

    fn reload_if_loaded(&self) {
        if ChannelType::ALL.iter().any(|&c| self.is_loaded(c)) {
            self.reload();
        }
    }

    // ── Reload ──────────────────────────────────────────────────────────────

    /// Discard both chains and build fresh ones: the gate first, then every
    /// enabled middleware in effective order.
    pub fn reload(&self) -> ReloadSummary {
        let effective = self.effective_list();
        let (incoming, incoming_summary) = self.build_chain(ChannelType::Incoming, &effective);
        let (outgoing, outgoing_summary) = self.build_chain(ChannelType::Outgoing, &effective);

        *self.slot(ChannelType::Incoming).write().unwrap_or_else(|e| e.into_inner()) =
            Some(Arc::new(incoming));
        *self.slot(ChannelType::Outgoing).write().unwrap_or_else(|e| e.into_inner()) =
            Some(Arc::new(outgoing));

        info!(
            incoming = incoming_summary.main.len() + incoming_summary.recovery.len(),
            outgoing = outgoing_summary.main.len() + outgoing_summary.recovery.len(),
            skipped = incoming_summary.skipped.len() + outgoing_summary.skipped.len(),
            "middleware chains reloaded"
        );
        ReloadSummary {
            incoming: incoming_summary,
            outgoing: outgoing_summary,
        }
    }

    fn build_chain(
        &self,
        channel: ChannelType,
        effective: &[EffectiveMiddleware],
    ) -> (MiddlewareChain, ChainSummary) {
        let mut chain = MiddlewareChain::new(channel).with_host(Arc::clone(&self.host));
        self.gate.install(channel, &mut chain);

        let mut skipped = Vec::new();
        for middleware in resolver::for_channel(effective, channel) {
            if !middleware.enabled {
                debug!(channel = %channel, middleware = %middleware.name, "skipping disabled middleware");
                skipped.push(middleware.name.clone());
                continue;
            }
            chain.register(middleware.name.clone(), middleware.handler.clone());
        }

        let summary = ChainSummary {
            main: chain.main_names().into_iter().map(String::from).collect(),
            recovery: chain.recovery_names().into_iter().map(String::from).collect(),
            skipped,
        };
        (chain, summary)
    }

    fn slot(&self, channel: ChannelType) -> &ActiveChain {
        match channel {
            ChannelType::Incoming => &self.incoming,
            ChannelType::Outgoing => &self.outgoing,
        }
    }

    fn active(&self, channel: ChannelType) -> Option<Arc<MiddlewareChain>> {
        self.slot(channel)
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_loaded(&self, channel: ChannelType) -> bool {
        self.active(channel).is_some()
    }

    // ── Dispatch ────────────────────────────────────────────────────────────

    /// Run `event` through the active chain for `channel`.
    ///
    /// The chain is captured when dispatch starts, so a concurrent reload
    /// never changes the handlers an in-flight event sees.
    pub async fn dispatch(&self, channel: ChannelType, event: Event) -> DispatchOutcome {
        match self.active(channel) {
            Some(chain) => chain.dispatch(event).await,
            None => {
                warn!(
                    channel = %channel,
                    event = %event.snapshot(),
                    "{channel} middleware called before the pipeline was loaded"
                );
                DispatchOutcome::NotLoaded
            },
        }
    }

    pub async fn dispatch_incoming(&self, event: Event) -> DispatchOutcome {
        self.dispatch(ChannelType::Incoming, event).await
    }

    pub async fn dispatch_outgoing(&self, event: Event) -> DispatchOutcome {
        self.dispatch(ChannelType::Outgoing, event).await
    }

    /// Validate an untyped record and dispatch it on `channel`.
    ///
    /// Before the first reload this is a logged no-op for any value, valid
    /// or not: nothing is validated and `NotLoaded` is returned.
    pub async fn dispatch_value(&self, channel: ChannelType, value: Value) -> Result<DispatchOutcome> {
        match self.active(channel) {
            Some(chain) => chain.dispatch_value(value).await,
            None => {
                warn_not_loaded(channel, &value);
                Ok(DispatchOutcome::NotLoaded)
            },
        }
    }

    /// Validate every record, then dispatch each independently on `channel`.
    ///
    /// Before the first reload every record is logged and answered with
    /// `NotLoaded`, without validation.
    pub async fn dispatch_batch(
        &self,
        channel: ChannelType,
        values: Vec<Value>,
    ) -> Result<Vec<DispatchOutcome>> {
        let Some(chain) = self.active(channel) else {
            if values.is_empty() {
                warn_not_loaded(channel, &Value::Array(Vec::new()));
            }
            return Ok(values
                .iter()
                .map(|value| {
                    warn_not_loaded(channel, value);
                    DispatchOutcome::NotLoaded
                })
                .collect());
        };
        chain.dispatch_batch(values).await
    }
}

fn warn_not_loaded(channel: ChannelType, value: &Value) {
    let event = serde_json::to_string(value).unwrap_or_else(|_| value.to_string());
    warn!(
        channel = %channel,
        event = %event,
        "{channel} middleware called before the pipeline was loaded"
    );
}

//! Handler traits and the registration input type.

use std::{fmt, sync::Arc};

use {anyhow::Result, async_trait::async_trait};

use crate::event::Event;

// ── Middleware traits ───────────────────────────────────────────────────────

/// A main-chain handler.
///
/// Returning `Ok(())` advances the chain to the next handler. Returning an
/// error stops the main chain for this event and hands the error to the
/// recovery chain. A handler that never completes stalls its event; the
/// chain imposes no timeout.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, event: &mut Event) -> Result<()>;
}

/// What a recovery handler did with the error it received.
#[derive(Debug)]
pub enum Recovery {
    /// The error is dealt with; dispatch for this event is done.
    Resolved,
    /// Pass the (possibly rewritten) error to the next recovery handler.
    Propagate(anyhow::Error),
}

/// A recovery-chain handler, run only after a main handler fails.
#[async_trait]
pub trait ErrorMiddleware: Send + Sync {
    async fn recover(&self, error: anyhow::Error, event: &mut Event) -> Recovery;
}

// ── Closure adapters ────────────────────────────────────────────────────────

struct MiddlewareFn<F>(F);

#[async_trait]
impl<F> Middleware for MiddlewareFn<F>
where
    F: Fn(&mut Event) -> Result<()> + Send + Sync,
{
    async fn handle(&self, event: &mut Event) -> Result<()> {
        (self.0)(event)
    }
}

struct ErrorMiddlewareFn<F>(F);

#[async_trait]
impl<F> ErrorMiddleware for ErrorMiddlewareFn<F>
where
    F: Fn(anyhow::Error, &mut Event) -> Recovery + Send + Sync,
{
    async fn recover(&self, error: anyhow::Error, event: &mut Event) -> Recovery {
        (self.0)(error, event)
    }
}

// ── ChainHandler ────────────────────────────────────────────────────────────

/// A handler tagged with the chain it belongs to.
#[derive(Clone)]
pub enum ChainHandler {
    Main(Arc<dyn Middleware>),
    Recovery(Arc<dyn ErrorMiddleware>),
}

impl ChainHandler {
    /// Wrap a synchronous closure as a main-chain handler.
    pub fn main_fn<F>(f: F) -> Self
    where
        F: Fn(&mut Event) -> Result<()> + Send + Sync + 'static,
    {
        Self::Main(Arc::new(MiddlewareFn(f)))
    }

    /// Wrap a synchronous closure as a recovery handler.
    pub fn recovery_fn<F>(f: F) -> Self
    where
        F: Fn(anyhow::Error, &mut Event) -> Recovery + Send + Sync + 'static,
    {
        Self::Recovery(Arc::new(ErrorMiddlewareFn(f)))
    }

    pub fn is_recovery(&self) -> bool {
        matches!(self, Self::Recovery(_))
    }
}

impl fmt::Debug for ChainHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main(_) => f.write_str("ChainHandler::Main"),
            Self::Recovery(_) => f.write_str("ChainHandler::Recovery"),
        }
    }
}

// ── MiddlewareDefinition ────────────────────────────────────────────────────

/// Registration input, validated by
/// [`MiddlewareRegistry::register`](crate::registry::MiddlewareRegistry::register).
///
/// `channel` is kept as a string so that definitions assembled from plugin
/// manifests can be rejected with a diagnostic instead of failing to build.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareDefinition {
    pub name: String,
    pub channel: String,
    pub handler: Option<ChainHandler>,
    /// Defaults to 0. Lower values run first.
    pub order: Option<i32>,
    /// Defaults to true.
    pub enabled: Option<bool>,
    pub description: Option<String>,
}

impl MiddlewareDefinition {
    pub fn new(name: impl Into<String>, channel: impl Into<String>, handler: ChainHandler) -> Self {
        Self {
            name: name.into(),
            channel: channel.into(),
            handler: Some(handler),
            ..Self::default()
        }
    }

    pub fn incoming(name: impl Into<String>, handler: ChainHandler) -> Self {
        Self::new(name, "incoming", handler)
    }

    pub fn outgoing(name: impl Into<String>, handler: ChainHandler) -> Self {
        Self::new(name, "outgoing", handler)
    }

    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

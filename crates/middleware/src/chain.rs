//! One channel's middleware chain.
//!
//! A chain is built once per reload: handlers are appended with
//! [`MiddlewareChain::register`] and the chain is then frozen behind an `Arc`
//! and shared by every dispatch until the next reload. Registration must
//! therefore happen before dispatch, in the order handlers should run.

use std::{fmt, sync::Arc};

#[cfg(feature = "metrics")]
use metrics::counter;
use {
    serde::Serialize,
    serde_json::Value,
    tracing::{debug, error},
};

use crate::{
    channel::ChannelType,
    error::Result,
    event::{Event, HostContext},
    handler::{ChainHandler, ErrorMiddleware, Middleware, Recovery},
};

/// How a single event's traversal ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Every main handler advanced.
    Completed,
    /// A main handler failed and a recovery handler resolved the error.
    Recovered { error: String },
    /// A main handler failed and no recovery handler resolved the error.
    /// The error has been logged and absorbed.
    Unhandled { error: String },
    /// The channel has not been loaded yet; no handler ran.
    NotLoaded,
}

impl DispatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

struct Entry<H: ?Sized> {
    name: String,
    handler: Arc<H>,
}

/// Ordered main and recovery handlers for one channel.
pub struct MiddlewareChain {
    channel: ChannelType,
    main: Vec<Entry<dyn Middleware>>,
    recovery: Vec<Entry<dyn ErrorMiddleware>>,
    host: Option<Arc<HostContext>>,
}

impl MiddlewareChain {
    pub fn new(channel: ChannelType) -> Self {
        Self {
            channel,
            main: Vec::new(),
            recovery: Vec::new(),
            host: None,
        }
    }

    /// Attach the host context handed to every dispatched event.
    #[must_use]
    pub fn with_host(mut self, host: Arc<HostContext>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn channel(&self) -> ChannelType {
        self.channel
    }

    /// Append a handler to the chain its tag names. There is no removal.
    pub fn register(&mut self, name: impl Into<String>, handler: ChainHandler) {
        let name = name.into();
        match handler {
            ChainHandler::Main(handler) => {
                debug!(channel = %self.channel, handler = %name, position = self.main.len(), "main handler added");
                self.main.push(Entry { name, handler });
            },
            ChainHandler::Recovery(handler) => {
                debug!(channel = %self.channel, handler = %name, position = self.recovery.len(), "recovery handler added");
                self.recovery.push(Entry { name, handler });
            },
        }
    }

    /// Append several handlers, preserving iteration order.
    pub fn register_all<I, N>(&mut self, handlers: I)
    where
        I: IntoIterator<Item = (N, ChainHandler)>,
        N: Into<String>,
    {
        for (name, handler) in handlers {
            self.register(name, handler);
        }
    }

    pub fn main_names(&self) -> Vec<&str> {
        self.main.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn recovery_names(&self) -> Vec<&str> {
        self.recovery.iter().map(|e| e.name.as_str()).collect()
    }

    /// Validate one untyped record and dispatch it.
    ///
    /// Validation failures are returned before any handler runs and never
    /// reach the recovery chain.
    pub async fn dispatch_value(&self, value: Value) -> Result<DispatchOutcome> {
        let event = Event::from_value(value)?;
        Ok(self.dispatch(event).await)
    }

    /// Validate every record up front, then dispatch each independently.
    ///
    /// One event failing inside the chain does not stop the others.
    pub async fn dispatch_batch(&self, values: Vec<Value>) -> Result<Vec<DispatchOutcome>> {
        let events = Event::from_batch(values)?;

        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            outcomes.push(self.dispatch(event).await);
        }
        Ok(outcomes)
    }

    /// Run one event through the main chain, diverting to the recovery chain
    /// on the first failure. Runtime handler errors never escape.
    pub async fn dispatch(&self, mut event: Event) -> DispatchOutcome {
        event.host = self.host.clone();

        #[cfg(feature = "metrics")]
        counter!("switchyard_dispatch_total", "channel" => self.channel.as_str()).increment(1);

        let err = match self.run_main(&mut event).await {
            Ok(()) => return DispatchOutcome::Completed,
            Err(e) => e,
        };
        self.run_recovery(err, &mut event).await
    }

    async fn run_main(&self, event: &mut Event) -> anyhow::Result<()> {
        for entry in &self.main {
            if let Err(e) = entry.handler.handle(event).await {
                debug!(channel = %self.channel, handler = %entry.name, error = %e, "middleware failed, entering recovery chain");
                return Err(e);
            }
        }
        Ok(())
    }

    async fn run_recovery(&self, err: anyhow::Error, event: &mut Event) -> DispatchOutcome {
        let original = err.to_string();
        let mut err = err;

        for entry in &self.recovery {
            match entry.handler.recover(err, event).await {
                Recovery::Resolved => {
                    debug!(channel = %self.channel, handler = %entry.name, error = %original, "middleware error recovered");
                    return DispatchOutcome::Recovered { error: original };
                },
                Recovery::Propagate(next) => err = next,
            }
        }

        #[cfg(feature = "metrics")]
        counter!("switchyard_unhandled_errors_total", "channel" => self.channel.as_str())
            .increment(1);

        error!(
            channel = %self.channel,
            error = %err,
            "unhandled error in {} middleware: {err}",
            self.channel
        );
        DispatchOutcome::Unhandled {
            error: err.to_string(),
        }
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("channel", &self.channel)
            .field("main", &self.main_names())
            .field("recovery", &self.recovery_names())
            .finish()
    }
}

//! Middleware pipeline: ordered handler chains for incoming and outgoing events.
//!
//! Handlers are declared in a [`MiddlewareRegistry`], ordered by the
//! [`resolver`] against persisted [`CustomizationStore`] overrides, and
//! assembled into one [`MiddlewareChain`] per [`ChannelType`] by the
//! [`PipelineManager`]. A failing main handler diverts its event to the
//! chain's recovery handlers; errors nobody resolves are logged and absorbed.

pub mod bundled;
pub mod chain;
pub mod channel;
pub mod customizations;
pub mod error;
pub mod event;
pub mod gating;
pub mod handler;
pub mod manager;
pub mod registry;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_support;

pub use {
    bundled::register_bundled,
    chain::{DispatchOutcome, MiddlewareChain},
    channel::ChannelType,
    customizations::{Customization, CustomizationEntry, CustomizationStore},
    error::{Error, Result},
    event::{Event, HostContext},
    gating::{ChainGate, OpenGate, PlatformGate},
    handler::{ChainHandler, ErrorMiddleware, Middleware, MiddlewareDefinition, Recovery},
    manager::{PipelineManager, ReloadSummary},
    registry::{MiddlewareRegistry, RegisteredMiddleware},
    resolver::EffectiveMiddleware,
};

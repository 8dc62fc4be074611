use std::collections::HashMap;

use tracing::{debug, error};

use crate::{
    channel::ChannelType,
    error::{Error, Result},
    handler::{ChainHandler, MiddlewareDefinition},
};

/// A validated, registered middleware. Immutable once registered.
#[derive(Debug, Clone)]
pub struct RegisteredMiddleware {
    pub name: String,
    pub channel: ChannelType,
    pub order: i32,
    pub enabled: bool,
    pub description: Option<String>,
    pub handler: ChainHandler,
}

/// Catalogue of every known middleware, in registration order.
#[derive(Default)]
pub struct MiddlewareRegistry {
    entries: Vec<RegisteredMiddleware>,
    by_name: HashMap<String, usize>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a middleware, logging and returning `false` when the
    /// definition is rejected. The registry is left unchanged on rejection.
    pub fn register(&mut self, definition: MiddlewareDefinition) -> bool {
        match self.try_register(definition) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "middleware registration rejected");
                false
            },
        }
    }

    /// Register a middleware, returning the reason on rejection.
    pub fn try_register(&mut self, definition: MiddlewareDefinition) -> Result<()> {
        let MiddlewareDefinition {
            name,
            channel,
            handler,
            order,
            enabled,
            description,
        } = definition;

        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::MissingName);
        }
        let Some(handler) = handler else {
            return Err(Error::MissingHandler { name });
        };
        let channel = channel
            .parse::<ChannelType>()
            .map_err(|_| Error::invalid_channel(&name, channel))?;
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateName { name });
        }

        let entry = RegisteredMiddleware {
            name: name.clone(),
            channel,
            order: order.unwrap_or(0),
            enabled: enabled.unwrap_or(true),
            description,
            handler,
        };
        debug!(
            middleware = %entry.name,
            channel = %entry.channel,
            order = entry.order,
            enabled = entry.enabled,
            "middleware registered"
        );
        self.by_name.insert(name, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredMiddleware> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// All registered middleware in registration order.
    pub fn list(&self) -> &[RegisteredMiddleware] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::test_support::capture_logs};

    fn noop() -> ChainHandler {
        ChainHandler::main_fn(|_| Ok(()))
    }

    #[test]
    fn register_applies_defaults() {
        let mut registry = MiddlewareRegistry::new();
        assert!(registry.register(MiddlewareDefinition::incoming("auth", noop())));

        let entry = registry.get("auth").unwrap();
        assert_eq!(entry.channel, ChannelType::Incoming);
        assert_eq!(entry.order, 0);
        assert!(entry.enabled);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_keeps_declared_values() {
        let mut registry = MiddlewareRegistry::new();
        assert!(
            registry.register(
                MiddlewareDefinition::outgoing("typing", noop())
                    .with_order(-5)
                    .with_enabled(false)
                    .with_description("typing indicator")
            )
        );
        let entry = registry.get("typing").unwrap();
        assert_eq!(entry.order, -5);
        assert!(!entry.enabled);
        assert_eq!(entry.description.as_deref(), Some("typing indicator"));
    }

    #[test]
    fn duplicate_name_is_rejected_and_registry_unchanged() {
        let (logs, _guard) = capture_logs();
        let mut registry = MiddlewareRegistry::new();
        assert!(registry.register(MiddlewareDefinition::incoming("auth", noop()).with_order(3)));
        assert!(!registry.register(MiddlewareDefinition::outgoing("auth", noop()).with_order(9)));

        assert_eq!(registry.len(), 1);
        let entry = registry.get("auth").unwrap();
        assert_eq!(entry.channel, ChannelType::Incoming);
        assert_eq!(entry.order, 3);
        assert_eq!(logs.at_level(tracing::Level::ERROR).len(), 1);
    }

    #[test]
    fn rejection_reasons() {
        let mut registry = MiddlewareRegistry::new();

        let err = registry
            .try_register(MiddlewareDefinition::incoming("  ", noop()))
            .unwrap_err();
        assert!(matches!(err, Error::MissingName));

        let err = registry
            .try_register(MiddlewareDefinition {
                name: "no-handler".into(),
                channel: "incoming".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::MissingHandler { ref name } if name == "no-handler"));

        let err = registry
            .try_register(MiddlewareDefinition::new("sideways", "sideways", noop()))
            .unwrap_err();
        assert!(
            matches!(err, Error::InvalidChannel { ref name, ref channel } if name == "sideways" && channel == "sideways")
        );

        assert!(registry.is_empty());
    }

    #[test]
    fn list_preserves_registration_order() {
        let mut registry = MiddlewareRegistry::new();
        for name in ["c", "a", "b"] {
            assert!(registry.register(MiddlewareDefinition::incoming(name, noop())));
        }
        let names: Vec<_> = registry.list().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}

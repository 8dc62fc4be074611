//! Effective ordering: registry defaults merged with persisted overrides.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    channel::ChannelType,
    customizations::Customization,
    handler::ChainHandler,
    registry::MiddlewareRegistry,
};

/// A registered middleware with any customization applied.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveMiddleware {
    pub name: String,
    #[serde(rename = "type")]
    pub channel: ChannelType,
    pub order: i32,
    pub enabled: bool,
    /// True when a persisted override contributed `order`/`enabled`.
    pub customized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip)]
    pub handler: ChainHandler,
}

/// Overlay `customizations` onto every registered middleware and sort
/// ascending by effective order. Ties keep registration order.
pub fn effective_list(
    registry: &MiddlewareRegistry,
    customizations: &BTreeMap<String, Customization>,
) -> Vec<EffectiveMiddleware> {
    let mut list: Vec<EffectiveMiddleware> = registry
        .list()
        .iter()
        .map(|m| {
            let custom = customizations.get(&m.name);
            EffectiveMiddleware {
                name: m.name.clone(),
                channel: m.channel,
                order: custom.map_or(m.order, |c| c.order),
                enabled: custom.map_or(m.enabled, |c| c.enabled),
                customized: custom.is_some(),
                description: m.description.clone(),
                handler: m.handler.clone(),
            }
        })
        .collect();
    // Stable sort: equal orders stay in registration order.
    list.sort_by_key(|m| m.order);
    list
}

/// The subset of `list` that belongs to `channel`, order preserved.
pub fn for_channel(
    list: &[EffectiveMiddleware],
    channel: ChannelType,
) -> impl Iterator<Item = &EffectiveMiddleware> {
    list.iter().filter(move |m| m.channel == channel)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::handler::MiddlewareDefinition};

    fn noop() -> ChainHandler {
        ChainHandler::main_fn(|_| Ok(()))
    }

    fn registry(defs: Vec<MiddlewareDefinition>) -> MiddlewareRegistry {
        let mut registry = MiddlewareRegistry::new();
        for def in defs {
            assert!(registry.register(def));
        }
        registry
    }

    fn names(list: &[EffectiveMiddleware]) -> Vec<&str> {
        list.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn sorts_ascending_with_stable_ties() {
        let registry = registry(vec![
            MiddlewareDefinition::incoming("late", noop()).with_order(10),
            MiddlewareDefinition::incoming("tie-first", noop()),
            MiddlewareDefinition::outgoing("early", noop()).with_order(-1),
            MiddlewareDefinition::incoming("tie-second", noop()),
        ]);

        let list = effective_list(&registry, &BTreeMap::new());

        assert_eq!(names(&list), vec!["early", "tie-first", "tie-second", "late"]);
        assert!(list.iter().all(|m| !m.customized));
    }

    #[test]
    fn customizations_override_only_named_entries() {
        let registry = registry(vec![
            MiddlewareDefinition::incoming("a", noop()).with_order(1),
            MiddlewareDefinition::incoming("b", noop()).with_order(2),
            MiddlewareDefinition::incoming("c", noop()).with_order(3),
        ]);
        let mut custom = BTreeMap::new();
        custom.insert("c".to_string(), Customization {
            order: 0,
            enabled: false,
        });

        let list = effective_list(&registry, &custom);

        assert_eq!(names(&list), vec!["c", "a", "b"]);
        assert_eq!(list[0].order, 0);
        assert!(!list[0].enabled);
        assert!(list[0].customized);
        assert_eq!((list[1].order, list[1].enabled), (1, true));
        assert_eq!((list[2].order, list[2].enabled), (2, true));
    }

    #[test]
    fn unknown_customizations_are_ignored() {
        let registry = registry(vec![MiddlewareDefinition::incoming("a", noop())]);
        let mut custom = BTreeMap::new();
        custom.insert("ghost".to_string(), Customization {
            order: -100,
            enabled: true,
        });

        let list = effective_list(&registry, &custom);
        assert_eq!(names(&list), vec!["a"]);
    }

    #[test]
    fn for_channel_filters_and_keeps_order() {
        let registry = registry(vec![
            MiddlewareDefinition::incoming("in-2", noop()).with_order(2),
            MiddlewareDefinition::outgoing("out", noop()),
            MiddlewareDefinition::incoming("in-1", noop()).with_order(1),
        ]);
        let list = effective_list(&registry, &BTreeMap::new());

        let incoming: Vec<_> = for_channel(&list, ChannelType::Incoming)
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(incoming, vec!["in-1", "in-2"]);
    }

    #[test]
    fn serializes_without_handler() {
        let registry = registry(vec![MiddlewareDefinition::outgoing("out", noop())]);
        let list = effective_list(&registry, &BTreeMap::new());
        let value = serde_json::to_value(&list[0]).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "out",
                "type": "outgoing",
                "order": 0,
                "enabled": true,
                "customized": false,
            })
        );
    }
}

//! Ability resolution: activate permission sets and merge their rules
//!
//! Resolution is a pure computation over one registry snapshot. It runs on
//! any thread without additional synchronization and performs no I/O.

use crate::ability::{Ability, KeyEntry};
use crate::error::{ConfigurationError, Result};
use crate::registry::RoleRegistry;
use crate::rule::{CapabilityRule, Effect, RuleKey};
use crate::types::{Actor, Context};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Resolves consolidated abilities from the role registry
#[derive(Clone)]
pub struct AbilityResolver {
    registry: Arc<RoleRegistry>,
}

impl AbilityResolver {
    /// Create a resolver over a shared registry
    pub fn new(registry: Arc<RoleRegistry>) -> Self {
        Self { registry }
    }

    /// Registry this resolver reads from
    pub fn registry(&self) -> &Arc<RoleRegistry> {
        &self.registry
    }

    /// Resolve the consolidated ability for `actor`
    ///
    /// Takes one immutable snapshot, activates every permission set bound
    /// to each of the actor's roles, and merges the collected rules into a
    /// decision table with explicit-deny-wins precedence. The super-user
    /// wildcard matches only keys with no deny recorded against them.
    ///
    /// An actor with zero roles resolves to an empty ability that denies
    /// everything; that is not an error.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::UnknownRole` if the actor declares a role name
    /// that has never been assigned in the registry.
    pub fn resolve(&self, actor: &Actor, context: &Context) -> Result<Ability> {
        let snapshot = self.registry.snapshot();

        let mut collected: Vec<CapabilityRule> = Vec::new();
        for role in &actor.roles {
            let Some(ids) = snapshot.lookup(role) else {
                return Err(ConfigurationError::UnknownRole(role.clone()));
            };
            for id in ids {
                let set = self.registry.catalog().get(id)?;
                let rules = set.activate(actor, context);
                debug!(
                    "Permission set '{}' contributed {} rules for actor '{}'",
                    id,
                    rules.len(),
                    actor.id
                );
                collected.extend(rules);
            }
        }

        if collected.is_empty() {
            return Ok(Ability::empty(snapshot.generation()));
        }

        let mut table: HashMap<RuleKey, KeyEntry> = HashMap::new();
        let mut wildcard: Option<CapabilityRule> = None;
        for rule in collected {
            if rule.is_wildcard() {
                wildcard.get_or_insert(rule);
                continue;
            }
            let entry = table.entry(rule.key()).or_default();
            match rule.effect {
                Effect::Allow => entry.allows.push(rule),
                Effect::Deny => entry.denies.push(rule),
            }
        }

        debug!(
            "Resolved ability for actor '{}': {} keys, wildcard={}, generation {}",
            actor.id,
            table.len(),
            wildcard.is_some(),
            snapshot.generation()
        );

        Ok(Ability::new(snapshot.generation(), table, wildcard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission_set::{
        PermissionSetCatalog, DEFAULT_CUSTOMER, ORDER_MANAGEMENT, PRODUCT_MANAGEMENT,
    };
    use crate::types::Subject;

    fn resolver() -> AbilityResolver {
        let registry = RoleRegistry::new(PermissionSetCatalog::builtin()).unwrap();
        AbilityResolver::new(Arc::new(registry))
    }

    #[test]
    fn test_zero_roles_resolves_to_empty_ability() {
        let resolver = resolver();
        let actor = Actor::new("user:nobody");

        let ability = resolver.resolve(&actor, &Context::new()).unwrap();
        assert!(ability.is_empty());
    }

    #[test]
    fn test_unknown_role_is_loud() {
        let resolver = resolver();
        let actor = Actor::new("user:ghost").with_role("ghost");

        let err = resolver.resolve(&actor, &Context::new()).unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownRole("ghost".to_string()));
    }

    #[test]
    fn test_empty_role_denies_silently() {
        let resolver = resolver();
        resolver
            .registry()
            .assign_permissions("auditor", Vec::new())
            .unwrap();
        let actor = Actor::new("user:carol").with_role("auditor");

        let ability = resolver.resolve(&actor, &Context::new()).unwrap();
        assert!(ability.is_empty());
        assert!(!ability.can("view", &Subject::kind("order")));
    }

    #[test]
    fn test_multi_role_union() {
        let resolver = resolver();
        resolver
            .registry()
            .assign_permissions(
                "manager",
                vec![ORDER_MANAGEMENT.to_string(), PRODUCT_MANAGEMENT.to_string()],
            )
            .unwrap();
        let actor = Actor::new("user:mia").with_role("manager");

        let ability = resolver.resolve(&actor, &Context::new()).unwrap();
        assert!(ability.can("ship", &Subject::kind("order")));
        assert!(ability.can("delete", &Subject::kind("catalog_item")));
        assert!(!ability.can("delete", &Subject::kind("order")));
    }

    #[test]
    fn test_resolution_is_order_independent() {
        let resolver = resolver();
        resolver
            .registry()
            .assign_permissions(
                "forward",
                vec![ORDER_MANAGEMENT.to_string(), PRODUCT_MANAGEMENT.to_string()],
            )
            .unwrap();
        resolver
            .registry()
            .assign_permissions(
                "reverse",
                vec![PRODUCT_MANAGEMENT.to_string(), ORDER_MANAGEMENT.to_string()],
            )
            .unwrap();

        let forward = resolver
            .resolve(&Actor::new("user:a").with_role("forward"), &Context::new())
            .unwrap();
        let reverse = resolver
            .resolve(&Actor::new("user:a").with_role("reverse"), &Context::new())
            .unwrap();

        assert_eq!(forward.rules(), reverse.rules());
    }

    #[test]
    fn test_ability_outlives_snapshot() {
        let resolver = resolver();
        let actor = Actor::new("user:alice").with_role("default");

        let ability = resolver.resolve(&actor, &Context::new()).unwrap();
        let generation = ability.generation();

        // Reconfigure after resolution; the resolved ability is unaffected
        resolver
            .registry()
            .assign_permissions("default", Vec::new())
            .unwrap();

        assert!(ability.can("view", &Subject::kind("catalog_item")));
        assert_eq!(ability.generation(), generation);
        assert!(resolver.registry().generation() > generation);
    }

    #[test]
    fn test_default_customer_via_registry() {
        let resolver = resolver();
        let actor = Actor::new("user:alice").with_role("default");

        let ability = resolver.resolve(&actor, &Context::new()).unwrap();
        let summaries = ability.rules();

        assert!(summaries.iter().all(|s| s.source == DEFAULT_CUSTOMER));
        assert!(ability.can("view", &Subject::kind("catalog_item")));
        assert!(!ability.can("delete", &Subject::kind("catalog_item")));
    }
}

//! Permission set variants and the startup catalog

use crate::error::{ConfigurationError, Result};
use crate::rule::{CapabilityRule, WILDCARD};
use crate::types::{Actor, Context, PermissionSetId};
use std::collections::HashMap;

/// Identifier the super-user permission set registers under
pub const SUPER_USER: &str = "super_user";
/// Identifier the default-customer permission set registers under
pub const DEFAULT_CUSTOMER: &str = "default_customer";
/// Identifier the order-management permission set registers under
pub const ORDER_MANAGEMENT: &str = "order_management";
/// Identifier the product-management permission set registers under
pub const PRODUCT_MANAGEMENT: &str = "product_management";
/// Identifier the catalog-freeze restriction set registers under
pub const CATALOG_FREEZE: &str = "catalog_freeze";

/// Closed set of capability providers
///
/// Variants are fixed at build time so the catalog can validate role
/// assignments exhaustively at configuration time. Adding a
/// business-specific permission set means adding a variant here and
/// registering it under a new identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionSet {
    /// Universal grant: a single wildcard allow rule
    SuperUser,
    /// Baseline storefront customer capabilities
    DefaultCustomer,
    /// Back-office order handling
    OrderManagement,
    /// Back-office catalog curation
    ProductManagement,
    /// Restriction set: freezes catalog writes during inventory audits
    ///
    /// Emits explicit deny rules; assigning it alongside any granting set
    /// (including the super user) locks the frozen keys.
    CatalogFreeze,
}

impl PermissionSet {
    /// Stable identifier this variant registers under
    pub fn id(&self) -> &'static str {
        match self {
            Self::SuperUser => SUPER_USER,
            Self::DefaultCustomer => DEFAULT_CUSTOMER,
            Self::OrderManagement => ORDER_MANAGEMENT,
            Self::ProductManagement => PRODUCT_MANAGEMENT,
            Self::CatalogFreeze => CATALOG_FREEZE,
        }
    }

    /// Produce this set's capability rules for one actor and context
    ///
    /// Activation is pure with respect to (actor, context): identical
    /// inputs yield an identical rule sequence, so results may be cached.
    /// Neither input is mutated.
    pub fn activate(&self, actor: &Actor, _context: &Context) -> Vec<CapabilityRule> {
        let rules = match self {
            Self::SuperUser => vec![CapabilityRule::allow(WILDCARD, WILDCARD)],
            Self::DefaultCustomer => {
                let viewer = actor.id.clone();
                let canceller = actor.id.clone();
                vec![
                    CapabilityRule::allow("view", "catalog_item"),
                    CapabilityRule::allow("view", "order").with_scope(move |subject| {
                        subject.attribute("customer_id") == Some(viewer.as_str())
                    }),
                    CapabilityRule::allow("cancel", "order").with_scope(move |subject| {
                        subject.attribute("customer_id") == Some(canceller.as_str())
                    }),
                ]
            }
            Self::OrderManagement => vec![
                CapabilityRule::allow("view", "order"),
                CapabilityRule::allow("update", "order"),
                CapabilityRule::allow("ship", "order"),
                CapabilityRule::allow("cancel", "order"),
                CapabilityRule::allow("view", "customer"),
            ],
            Self::ProductManagement => vec![
                CapabilityRule::allow("view", "catalog_item"),
                CapabilityRule::allow("create", "catalog_item"),
                CapabilityRule::allow("update", "catalog_item"),
                CapabilityRule::allow("delete", "catalog_item"),
                CapabilityRule::allow("view", "taxonomy"),
                CapabilityRule::allow("update", "taxonomy"),
            ],
            Self::CatalogFreeze => vec![
                CapabilityRule::deny("create", "catalog_item"),
                CapabilityRule::deny("update", "catalog_item"),
                CapabilityRule::deny("delete", "catalog_item"),
            ],
        };

        rules.into_iter().map(|rule| rule.tagged(self.id())).collect()
    }
}

/// Registry of permission set instances keyed by stable identifier
///
/// Populated once at startup. The role registry validates every
/// assignment against the catalog, so an unknown identifier fails at the
/// point the role is assigned, never at resolution time.
#[derive(Debug, Clone, Default)]
pub struct PermissionSetCatalog {
    sets: HashMap<PermissionSetId, PermissionSet>,
}

impl PermissionSetCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-loaded with every built-in variant under its canonical id
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for set in [
            PermissionSet::SuperUser,
            PermissionSet::DefaultCustomer,
            PermissionSet::OrderManagement,
            PermissionSet::ProductManagement,
            PermissionSet::CatalogFreeze,
        ] {
            // Canonical ids are distinct, so registration cannot fail here
            let _ = catalog.register(set.id(), set);
        }
        catalog
    }

    /// Register a permission set under a stable identifier
    pub fn register(&mut self, id: impl Into<String>, set: PermissionSet) -> Result<()> {
        let id = id.into();
        if self.sets.contains_key(&id) {
            return Err(ConfigurationError::DuplicatePermissionSet(id));
        }
        self.sets.insert(id, set);
        Ok(())
    }

    /// Whether an identifier is registered
    pub fn contains(&self, id: &str) -> bool {
        self.sets.contains_key(id)
    }

    /// Look up a permission set by identifier
    pub fn get(&self, id: &str) -> Result<PermissionSet> {
        self.sets
            .get(id)
            .copied()
            .ok_or_else(|| ConfigurationError::UnknownPermissionSet(id.to_string()))
    }

    /// All registered identifiers, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sets.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Effect;
    use crate::types::Subject;

    #[test]
    fn test_super_user_wildcard() {
        let actor = Actor::new("user:root");
        let rules = PermissionSet::SuperUser.activate(&actor, &Context::new());

        assert_eq!(rules.len(), 1);
        assert!(rules[0].is_wildcard());
        assert_eq!(rules[0].effect, Effect::Allow);
        assert_eq!(rules[0].source, SUPER_USER);
    }

    #[test]
    fn test_default_customer_scoped_to_own_orders() {
        let actor = Actor::new("user:alice");
        let rules = PermissionSet::DefaultCustomer.activate(&actor, &Context::new());

        let own = Subject::instance("order", "order:1").with_attribute("customer_id", "user:alice");
        let foreign = Subject::instance("order", "order:2").with_attribute("customer_id", "user:bob");

        let view_order = rules
            .iter()
            .find(|r| r.action == "view" && r.subject_kind == "order")
            .unwrap();
        assert!(view_order.matches_scope(&own));
        assert!(!view_order.matches_scope(&foreign));
    }

    #[test]
    fn test_activation_is_repeatable() {
        let actor = Actor::new("user:alice");
        let context = Context::new();

        let first = PermissionSet::ProductManagement.activate(&actor, &context);
        let second = PermissionSet::ProductManagement.activate(&actor, &context);

        let keys = |rules: &[CapabilityRule]| {
            rules.iter().map(|r| (r.key(), r.effect)).collect::<Vec<_>>()
        };
        assert_eq!(keys(&first), keys(&second));
    }

    #[test]
    fn test_catalog_freeze_emits_denies() {
        let actor = Actor::new("user:auditor");
        let rules = PermissionSet::CatalogFreeze.activate(&actor, &Context::new());

        assert_eq!(rules.len(), 3);
        assert!(rules.iter().all(|r| r.effect == Effect::Deny));
        assert!(rules.iter().all(|r| r.subject_kind == "catalog_item"));
    }

    #[test]
    fn test_catalog_builtin_ids() {
        let catalog = PermissionSetCatalog::builtin();
        assert_eq!(
            catalog.ids(),
            vec![
                CATALOG_FREEZE,
                DEFAULT_CUSTOMER,
                ORDER_MANAGEMENT,
                PRODUCT_MANAGEMENT,
                SUPER_USER
            ]
        );
        assert!(catalog.contains(SUPER_USER));
        assert!(!catalog.contains("warehouse_management"));
    }

    #[test]
    fn test_catalog_duplicate_registration() {
        let mut catalog = PermissionSetCatalog::builtin();
        let result = catalog.register(SUPER_USER, PermissionSet::SuperUser);

        assert_eq!(
            result,
            Err(ConfigurationError::DuplicatePermissionSet(SUPER_USER.to_string()))
        );
    }

    #[test]
    fn test_catalog_unknown_lookup() {
        let catalog = PermissionSetCatalog::builtin();
        let result = catalog.get("warehouse_management");

        assert_eq!(
            result,
            Err(ConfigurationError::UnknownPermissionSet(
                "warehouse_management".to_string()
            ))
        );
    }
}

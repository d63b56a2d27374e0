//! Core actor, subject, and context types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Role name assigned to an actor
pub type RoleName = String;

/// Stable identifier a permission set is registered under
pub type PermissionSetId = String;

/// Actor (user or service) whose authorization is being evaluated
///
/// The actor value is supplied by an external authentication/session
/// collaborator; this engine never fetches role assignments itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Actor identifier (e.g., "user:alice@example.com", "service:billing")
    pub id: String,

    /// Assigned role names (exactly one is the common case)
    #[serde(default)]
    pub roles: Vec<RoleName>,

    /// Additional attributes (e.g., department, locale)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Actor {
    /// Create a new actor with no roles
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            roles: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    /// Add a role to the actor
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add an attribute to the actor
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Subject of an authorization check
///
/// A subject is always a type tag (`kind`); a concrete instance carries an
/// id and attributes in addition. Scope predicates are evaluated only
/// against concrete instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Subject type tag (e.g., "catalog_item", "order")
    pub kind: String,

    /// Instance identifier, present only for concrete instances
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Instance attributes (e.g., customer_id, owner)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Subject {
    /// Type-level subject ("may this actor delete catalog items at all")
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            attributes: HashMap::new(),
        }
    }

    /// Concrete subject instance
    pub fn instance(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.into()),
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute to the subject
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether this subject is a concrete instance
    pub fn is_instance(&self) -> bool {
        self.id.is_some()
    }

    /// Look up an attribute by key
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Request-scoped context passed through to permission set activation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Additional context values (channel, store id, etc.)
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a context value
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_creation() {
        let actor = Actor::new("user:alice@example.com")
            .with_role("default")
            .with_attribute("locale", "en");

        assert_eq!(actor.id, "user:alice@example.com");
        assert_eq!(actor.roles, vec!["default".to_string()]);
        assert_eq!(actor.attributes.get("locale"), Some(&"en".to_string()));
    }

    #[test]
    fn test_subject_kind_vs_instance() {
        let kind = Subject::kind("order");
        assert!(!kind.is_instance());
        assert!(kind.attribute("customer_id").is_none());

        let instance = Subject::instance("order", "order:42")
            .with_attribute("customer_id", "user:alice@example.com");
        assert!(instance.is_instance());
        assert_eq!(instance.attribute("customer_id"), Some("user:alice@example.com"));
    }

    #[test]
    fn test_context_values() {
        let context = Context::new()
            .with_attribute("channel", "web")
            .with_attribute("store_id", 7);

        assert_eq!(
            context.attributes.get("channel"),
            Some(&serde_json::json!("web"))
        );
        assert_eq!(context.attributes.get("store_id"), Some(&serde_json::json!(7)));
    }
}

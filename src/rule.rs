//! Capability rules and decision-table keys

use crate::types::{PermissionSetId, Subject};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Wildcard token, emitted only by the super-user permission set
pub const WILDCARD: &str = "*";

/// Rule effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Effect {
    /// Allow the action
    Allow,
    /// Deny the action
    Deny,
}

/// Predicate over a concrete subject instance
///
/// Scope logic is first-class code, not an expression language; rules that
/// carry a predicate are consulted only when the check supplies a concrete
/// instance.
pub type ScopePredicate = Arc<dyn Fn(&Subject) -> bool + Send + Sync>;

/// One authorization statement: (action, subject kind, optional scope, effect)
///
/// Rules are ephemeral values, produced fresh by each permission set
/// activation and consumed by the resolver's merge.
#[derive(Clone)]
pub struct CapabilityRule {
    /// Action name (e.g., "view", "update") or the wildcard token
    pub action: String,

    /// Subject type tag the rule applies to, or the wildcard token
    pub subject_kind: String,

    /// Optional predicate narrowing the rule to matching instances
    pub scope: Option<ScopePredicate>,

    /// Whether the rule allows or denies
    pub effect: Effect,

    /// Identifier of the permission set that produced the rule
    pub source: PermissionSetId,
}

impl CapabilityRule {
    /// Create an allow rule
    pub fn allow(action: impl Into<String>, subject_kind: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            subject_kind: subject_kind.into(),
            scope: None,
            effect: Effect::Allow,
            source: PermissionSetId::new(),
        }
    }

    /// Create a deny rule
    pub fn deny(action: impl Into<String>, subject_kind: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            subject_kind: subject_kind.into(),
            scope: None,
            effect: Effect::Deny,
            source: PermissionSetId::new(),
        }
    }

    /// Attach a scope predicate to the rule
    pub fn with_scope(mut self, scope: impl Fn(&Subject) -> bool + Send + Sync + 'static) -> Self {
        self.scope = Some(Arc::new(scope));
        self
    }

    /// Stamp the rule with the permission set id that produced it
    pub(crate) fn tagged(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// Decision-table key this rule is recorded under
    pub fn key(&self) -> RuleKey {
        RuleKey {
            action: self.action.clone(),
            subject_kind: self.subject_kind.clone(),
        }
    }

    /// Whether this is the universal-grant wildcard rule
    pub fn is_wildcard(&self) -> bool {
        self.action == WILDCARD && self.subject_kind == WILDCARD
    }

    /// Evaluate the scope predicate against a concrete instance
    ///
    /// A rule without a scope matches every instance of its subject kind.
    pub fn matches_scope(&self, subject: &Subject) -> bool {
        match &self.scope {
            Some(predicate) => predicate(subject),
            None => true,
        }
    }

    /// Serializable projection of this rule
    pub fn summary(&self) -> RuleSummary {
        RuleSummary {
            action: self.action.clone(),
            subject_kind: self.subject_kind.clone(),
            effect: self.effect,
            scoped: self.scope.is_some(),
            source: self.source.clone(),
        }
    }
}

impl fmt::Debug for CapabilityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRule")
            .field("action", &self.action)
            .field("subject_kind", &self.subject_kind)
            .field("effect", &self.effect)
            .field("scoped", &self.scope.is_some())
            .field("source", &self.source)
            .finish()
    }
}

/// Decision-table key: two rules overlap iff action and subject kind are equal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleKey {
    /// Action name
    pub action: String,
    /// Subject type tag
    pub subject_kind: String,
}

impl RuleKey {
    /// Create a key from an action and subject kind
    pub fn new(action: impl Into<String>, subject_kind: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            subject_kind: subject_kind.into(),
        }
    }
}

/// Read-only, serializable projection of a merged rule
///
/// Used by the administrative "what can this role do" report; the scope
/// predicate itself is opaque and is reported only as a `scoped` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    /// Action name or wildcard
    pub action: String,
    /// Subject type tag or wildcard
    pub subject_kind: String,
    /// Rule effect
    pub effect: Effect,
    /// Whether the rule carries a scope predicate
    pub scoped: bool,
    /// Permission set the rule came from
    pub source: PermissionSetId,
}

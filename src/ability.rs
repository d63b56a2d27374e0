//! Consolidated decision surface for one actor
//!
//! An `Ability` is built once per resolution, is immutable afterwards, and
//! carries no reference back to the registry snapshot it was resolved
//! from, so it is safe to cache for a request or a short TTL and to
//! outlive a reconfiguration (the generation tag lets caches detect that).

use crate::rule::{CapabilityRule, Effect, RuleKey, RuleSummary};
use crate::types::Subject;
use std::collections::HashMap;

/// Rules recorded under one decision-table key, split by effect
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyEntry {
    pub(crate) allows: Vec<CapabilityRule>,
    pub(crate) denies: Vec<CapabilityRule>,
}

/// The resolved, consolidated rule set for one actor
///
/// Evaluation applies explicit-deny-wins precedence: any deny recorded
/// under a key beats every allow for that key, and a key carrying a deny
/// is never rescued by the super-user wildcard.
#[derive(Debug, Clone)]
pub struct Ability {
    generation: u64,
    table: HashMap<RuleKey, KeyEntry>,
    wildcard: Option<CapabilityRule>,
}

impl Ability {
    pub(crate) fn new(
        generation: u64,
        table: HashMap<RuleKey, KeyEntry>,
        wildcard: Option<CapabilityRule>,
    ) -> Self {
        Self {
            generation,
            table,
            wildcard,
        }
    }

    /// An ability that denies everything
    pub(crate) fn empty(generation: u64) -> Self {
        Self::new(generation, HashMap::new(), None)
    }

    /// Registry generation this ability was resolved under
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the ability grants nothing at all
    pub fn is_empty(&self) -> bool {
        self.table.is_empty() && self.wildcard.is_none()
    }

    /// Evaluate one (action, subject) query against the merged table
    ///
    /// Type-level subjects are decided at key granularity: a recorded deny
    /// wins, otherwise any allow (scoped or not) or the wildcard grants.
    /// Concrete instances additionally consult scope predicates: among the
    /// rules whose key matched, only those whose scope holds for the
    /// instance are actionable, and deny still wins among those.
    pub fn can(&self, action: &str, subject: &Subject) -> bool {
        let key = RuleKey::new(action, subject.kind.clone());
        let Some(entry) = self.table.get(&key) else {
            return self.wildcard.is_some();
        };

        if subject.is_instance() {
            if entry.denies.iter().any(|rule| rule.matches_scope(subject)) {
                return false;
            }
            if entry.allows.iter().any(|rule| rule.matches_scope(subject)) {
                return true;
            }
            // No actionable rule for this instance; the wildcard applies
            // only to keys with no deny recorded at all
            entry.denies.is_empty() && self.wildcard.is_some()
        } else {
            if !entry.denies.is_empty() {
                return false;
            }
            !entry.allows.is_empty() || self.wildcard.is_some()
        }
    }

    /// Read-only projection of the merged rule table
    ///
    /// Sorted by (subject kind, action, effect) so reports are stable.
    /// This is a diagnostics view, never a mutation path.
    pub fn rules(&self) -> Vec<RuleSummary> {
        let mut summaries: Vec<RuleSummary> = self
            .table
            .values()
            .flat_map(|entry| entry.denies.iter().chain(entry.allows.iter()))
            .map(CapabilityRule::summary)
            .collect();
        if let Some(wildcard) = &self.wildcard {
            summaries.push(wildcard.summary());
        }
        summaries.sort_by(|a, b| {
            (&a.subject_kind, &a.action, a.effect == Effect::Allow).cmp(&(
                &b.subject_kind,
                &b.action,
                b.effect == Effect::Allow,
            ))
        });
        summaries
    }
}

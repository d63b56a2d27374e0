//! Authorization gate: the public query surface with per-generation caching

use crate::ability::Ability;
use crate::error::{ConfigurationError, Result};
use crate::registry::RoleRegistry;
use crate::resolver::AbilityResolver;
use crate::rule::RuleSummary;
use crate::types::{Actor, Context, Subject};
use dashmap::DashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Gate configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Enable the ability cache
    pub enable_cache: bool,

    /// Maximum number of cached abilities
    pub cache_capacity: usize,

    /// Time-to-live for cached abilities
    pub cache_ttl: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enable_cache: true,
            cache_capacity: 10_000,
            cache_ttl: Duration::from_secs(60),
        }
    }
}

/// Cache key for resolved abilities
///
/// Roles are sorted so two actors carrying the same set in different
/// order share an entry; the context is hashed because activation is keyed
/// by (actor, context).
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    actor_id: String,
    roles: Vec<String>,
    context_hash: u64,
}

impl CacheKey {
    fn new(actor: &Actor, context: &Context) -> Self {
        let mut roles = actor.roles.clone();
        roles.sort();

        Self {
            actor_id: actor.id.clone(),
            roles,
            context_hash: Self::hash_context(context),
        }
    }

    fn hash_context(context: &Context) -> u64 {
        let mut hasher = DefaultHasher::new();

        let mut keys: Vec<_> = context.attributes.keys().collect();
        keys.sort();

        for key in keys {
            key.hash(&mut hasher);
            if let Some(value) = context.attributes.get(key) {
                value.to_string().hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}

/// Cached ability with its insertion time
#[derive(Clone)]
struct CachedAbility {
    ability: Arc<Ability>,
    cached_at: Instant,
}

impl CachedAbility {
    fn new(ability: Arc<Ability>) -> Self {
        Self {
            ability,
            cached_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Generation-checked ability cache
///
/// An entry is served only while its generation equals the current
/// registry generation and its TTL has not elapsed. A reconfiguration
/// therefore invalidates every cached ability structurally; stale
/// authorization decisions are never served.
struct AbilityCache {
    entries: DashMap<CacheKey, CachedAbility>,
    stats: DashMap<&'static str, usize>,
    capacity: usize,
    ttl: Duration,
}

impl AbilityCache {
    fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            stats: DashMap::new(),
            capacity,
            ttl,
        }
    }

    fn get(&self, key: &CacheKey, current_generation: u64) -> Option<Arc<Ability>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.ability.generation() != current_generation {
                drop(entry);
                self.entries.remove(key);
                self.increment_stat("stale_generation");
                return None;
            }
            if entry.is_expired(self.ttl) {
                drop(entry);
                self.entries.remove(key);
                self.increment_stat("expirations");
                return None;
            }

            self.increment_stat("hits");
            return Some(entry.ability.clone());
        }

        self.increment_stat("misses");
        None
    }

    fn put(&self, key: CacheKey, ability: Arc<Ability>) {
        if self.entries.len() >= self.capacity {
            self.evict_batch();
        }
        self.entries.insert(key, CachedAbility::new(ability));
    }

    fn clear(&self) {
        self.entries.clear();
        self.stats.clear();
    }

    /// Remove up to 10% of entries to make room
    fn evict_batch(&self) {
        let to_remove = (self.capacity / 10).max(1);
        let mut removed = 0;

        self.entries.retain(|_, _| {
            if removed < to_remove {
                removed += 1;
                false
            } else {
                true
            }
        });
    }

    fn increment_stat(&self, key: &'static str) {
        self.stats
            .entry(key)
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    fn get_stat(&self, key: &str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            stale_generation: self.get_stat("stale_generation"),
            expirations: self.get_stat("expirations"),
            entries: self.entries.len(),
            max_entries: self.capacity,
        }
    }
}

/// Ability cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub stale_generation: usize,
    pub expirations: usize,
    pub entries: usize,
    pub max_entries: usize,
}

impl CacheStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// The public query surface: "may this actor do X to Y"
///
/// Wraps the resolver with a per-actor ability cache. A denied check is a
/// normal `Ok(false)`; the only error is `ConfigurationError` for a role
/// name never declared in the registry.
pub struct AuthorizationGate {
    resolver: AbilityResolver,
    registry: Arc<RoleRegistry>,
    cache: Option<AbilityCache>,
}

impl AuthorizationGate {
    /// Create a gate with the default configuration
    pub fn new(registry: Arc<RoleRegistry>) -> Self {
        Self::with_config(registry, GateConfig::default())
    }

    /// Create a gate with a custom configuration
    pub fn with_config(registry: Arc<RoleRegistry>, config: GateConfig) -> Self {
        let cache = config
            .enable_cache
            .then(|| AbilityCache::new(config.cache_capacity, config.cache_ttl));

        Self {
            resolver: AbilityResolver::new(registry.clone()),
            registry,
            cache,
        }
    }

    /// May `actor` perform `action` on `subject`?
    ///
    /// Deny-by-default: any (action, subject kind) pair absent from the
    /// actor's ability answers `false`.
    pub fn can_perform(&self, actor: &Actor, action: &str, subject: &Subject) -> Result<bool> {
        self.can_perform_with(actor, action, subject, &Context::default())
    }

    /// [`can_perform`](Self::can_perform) with a request context threaded
    /// through to permission set activation
    pub fn can_perform_with(
        &self,
        actor: &Actor,
        action: &str,
        subject: &Subject,
        context: &Context,
    ) -> Result<bool> {
        let ability = self.ability(actor, context)?;
        let allowed = ability.can(action, subject);

        debug!(
            "{} actor '{}' action '{}' on '{}'",
            if allowed { "ALLOW" } else { "DENY" },
            actor.id,
            action,
            subject.kind
        );

        Ok(allowed)
    }

    /// Obtain the actor's ability, from the cache when fresh
    pub fn ability(&self, actor: &Actor, context: &Context) -> Result<Arc<Ability>> {
        let Some(cache) = &self.cache else {
            return Ok(Arc::new(self.resolver.resolve(actor, context)?));
        };

        let key = CacheKey::new(actor, context);
        let current_generation = self.registry.generation();

        if let Some(ability) = cache.get(&key, current_generation) {
            debug!("Ability cache hit for actor '{}'", actor.id);
            return Ok(ability);
        }

        let ability = Arc::new(self.resolver.resolve(actor, context)?);
        cache.put(key, ability.clone());
        Ok(ability)
    }

    /// Administrative "what can this role do" report
    ///
    /// Resolves a synthetic actor holding just `role` and returns the
    /// read-only rule projection. Bypasses the cache so the report always
    /// reflects the current table.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::UnknownRole` if the role name has never been
    /// assigned in the registry.
    pub fn ability_report(&self, role: &str) -> Result<Vec<RuleSummary>> {
        if !self.registry.snapshot().contains_role(role) {
            return Err(ConfigurationError::UnknownRole(role.to_string()));
        }

        let probe = Actor::new(format!("report:{role}")).with_role(role);
        let ability = self.resolver.resolve(&probe, &Context::default())?;
        Ok(ability.rules())
    }

    /// Cache statistics, if caching is enabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(AbilityCache::stats)
    }

    /// Drop every cached ability
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Registry this gate reads from
    pub fn registry(&self) -> &Arc<RoleRegistry> {
        &self.registry
    }
}

//! Role registry with copy-on-write snapshots
//!
//! The registry is a read-mostly shared resource: resolutions read an
//! immutable snapshot, administrative reassignment replaces the snapshot
//! wholesale. A resolution in progress always sees the old or the new
//! table in full, never a mix.

use crate::error::{ConfigurationError, Result};
use crate::permission_set::{PermissionSetCatalog, DEFAULT_CUSTOMER, SUPER_USER};
use crate::types::{PermissionSetId, RoleName};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Role name every actor falls back to: deny-by-default baseline
pub const DEFAULT_ROLE: &str = "default";
/// Universal-grant baseline role name
pub const ADMIN_ROLE: &str = "admin";

/// Immutable view of the role table at one generation
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    generation: u64,
    roles: HashMap<RoleName, Vec<PermissionSetId>>,
}

impl RegistrySnapshot {
    /// Generation this snapshot was published at
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Permission set ids bound to `role`
    ///
    /// `Some(&[])` means the role was declared with an empty list and
    /// denies silently; `None` means the name was never declared at all.
    pub fn lookup(&self, role: &str) -> Option<&[PermissionSetId]> {
        self.roles.get(role).map(Vec::as_slice)
    }

    /// Whether the role name has ever been declared
    pub fn contains_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// All declared role names, sorted
    pub fn role_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.roles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Process-wide mapping from role names to permission set id lists
///
/// Writers serialize against each other through the lock; readers hold it
/// only long enough to clone the current `Arc`, so resolutions never block
/// on a reassignment in progress.
pub struct RoleRegistry {
    catalog: PermissionSetCatalog,
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl RoleRegistry {
    /// Create a registry with the bootstrap bindings
    ///
    /// Pre-populates `default` (baseline customer capabilities) and
    /// `admin` (universal grant). Either may be overridden later via
    /// [`assign_permissions`](Self::assign_permissions).
    ///
    /// # Errors
    ///
    /// Fails with `ConfigurationError::UnknownPermissionSet` if the
    /// supplied catalog lacks the bootstrap identifiers.
    pub fn new(catalog: PermissionSetCatalog) -> Result<Self> {
        let registry = Self {
            catalog,
            current: RwLock::new(Arc::new(RegistrySnapshot {
                generation: 0,
                roles: HashMap::new(),
            })),
        };

        registry.assign_permissions(DEFAULT_ROLE, vec![DEFAULT_CUSTOMER.to_string()])?;
        registry.assign_permissions(ADMIN_ROLE, vec![SUPER_USER.to_string()])?;

        Ok(registry)
    }

    /// Replace the full permission-set list bound to `role`
    ///
    /// Not additive: the call declares the complete policy for the role.
    /// Every id is validated against the catalog before anything is
    /// published, so a bad assignment fails fast and leaves the registry
    /// untouched.
    pub fn assign_permissions(
        &self,
        role: impl Into<String>,
        permission_set_ids: Vec<PermissionSetId>,
    ) -> Result<()> {
        let role = role.into();
        for id in &permission_set_ids {
            if !self.catalog.contains(id) {
                return Err(ConfigurationError::UnknownPermissionSet(id.clone()));
            }
        }

        let mut guard = self.current.write();
        let mut roles = guard.roles.clone();
        roles.insert(role.clone(), permission_set_ids);
        let next = Arc::new(RegistrySnapshot {
            generation: guard.generation + 1,
            roles,
        });
        info!(
            "Role '{}' reassigned, registry generation {} -> {}",
            role,
            guard.generation,
            next.generation
        );
        *guard = next;

        Ok(())
    }

    /// Current immutable snapshot of the role table
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.read().clone()
    }

    /// Current registry generation
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Catalog the registry validates assignments against
    pub fn catalog(&self) -> &PermissionSetCatalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission_set::{ORDER_MANAGEMENT, PRODUCT_MANAGEMENT};

    #[test]
    fn test_bootstrap_bindings() {
        let registry = RoleRegistry::new(PermissionSetCatalog::builtin()).unwrap();
        let snapshot = registry.snapshot();

        assert_eq!(
            snapshot.lookup(DEFAULT_ROLE),
            Some(&[DEFAULT_CUSTOMER.to_string()][..])
        );
        assert_eq!(snapshot.lookup(ADMIN_ROLE), Some(&[SUPER_USER.to_string()][..]));
        assert_eq!(snapshot.role_names(), vec![ADMIN_ROLE, DEFAULT_ROLE]);
    }

    #[test]
    fn test_assignment_replaces_not_appends() {
        let registry = RoleRegistry::new(PermissionSetCatalog::builtin()).unwrap();

        registry
            .assign_permissions("manager", vec![ORDER_MANAGEMENT.to_string()])
            .unwrap();
        registry
            .assign_permissions("manager", vec![PRODUCT_MANAGEMENT.to_string()])
            .unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(
            snapshot.lookup("manager"),
            Some(&[PRODUCT_MANAGEMENT.to_string()][..])
        );
    }

    #[test]
    fn test_unknown_permission_set_fails_fast() {
        let registry = RoleRegistry::new(PermissionSetCatalog::builtin()).unwrap();
        let generation = registry.generation();

        let result = registry.assign_permissions(
            "warehouse",
            vec![ORDER_MANAGEMENT.to_string(), "warehouse_management".to_string()],
        );

        assert_eq!(
            result,
            Err(ConfigurationError::UnknownPermissionSet(
                "warehouse_management".to_string()
            ))
        );
        // The bad assignment published nothing
        assert_eq!(registry.generation(), generation);
        assert!(!registry.snapshot().contains_role("warehouse"));
    }

    #[test]
    fn test_empty_assignment_is_declared_but_grants_nothing() {
        let registry = RoleRegistry::new(PermissionSetCatalog::builtin()).unwrap();
        registry.assign_permissions("auditor", Vec::new()).unwrap();

        let snapshot = registry.snapshot();
        assert!(snapshot.contains_role("auditor"));
        assert_eq!(snapshot.lookup("auditor"), Some(&[][..]));
        assert_eq!(snapshot.lookup("ghost"), None);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let registry = RoleRegistry::new(PermissionSetCatalog::builtin()).unwrap();
        let before = registry.snapshot();

        registry
            .assign_permissions("manager", vec![ORDER_MANAGEMENT.to_string()])
            .unwrap();

        assert!(!before.contains_role("manager"));
        assert!(registry.snapshot().contains_role("manager"));
        assert_eq!(registry.generation(), before.generation() + 1);
    }
}

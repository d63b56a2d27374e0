//! # Storefront Authorization Engine
//!
//! Role-to-capability resolution for storefront services.
//!
//! ## Features
//!
//! - **Closed permission set variants** validated exhaustively at
//!   configuration time (unknown identifiers fail when a role is
//!   assigned, never inside a request)
//! - **Copy-on-write role registry** with atomic snapshots, so
//!   resolutions in flight never observe a half-applied reconfiguration
//! - **Explicit-deny-wins merging** across every role an actor holds
//! - **Scope predicates** as first-class code, consulted only against
//!   concrete subject instances
//! - **Generation-checked ability cache**: a reconfiguration invalidates
//!   every cached decision surface
//!
//! ## Example
//!
//! ```rust
//! use storefront_authz::{
//!     Actor, AuthorizationGate, PermissionSetCatalog, RoleRegistry, Subject,
//! };
//! use std::sync::Arc;
//!
//! fn main() -> storefront_authz::Result<()> {
//!     let registry = Arc::new(RoleRegistry::new(PermissionSetCatalog::builtin())?);
//!     let gate = AuthorizationGate::new(registry);
//!
//!     let customer = Actor::new("user:alice@example.com").with_role("default");
//!     let item = Subject::instance("catalog_item", "item:42");
//!
//!     assert!(gate.can_perform(&customer, "view", &item)?);
//!     assert!(!gate.can_perform(&customer, "delete", &item)?);
//!
//!     Ok(())
//! }
//! ```

pub mod ability;
pub mod error;
pub mod gate;
pub mod permission_set;
pub mod registry;
pub mod resolver;
pub mod rule;
pub mod types;

// Re-export commonly used types
pub use ability::Ability;
pub use error::{ConfigurationError, Result};
pub use gate::{AuthorizationGate, CacheStats, GateConfig};
pub use permission_set::{PermissionSet, PermissionSetCatalog};
pub use registry::{RegistrySnapshot, RoleRegistry};
pub use resolver::AbilityResolver;
pub use rule::{CapabilityRule, Effect, RuleKey, RuleSummary, WILDCARD};
pub use types::{Actor, Context, PermissionSetId, RoleName, Subject};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Deterministic namespace assembly from independently loaded contributors.
//!
//! Several independently packaged units may want to populate the same dotted
//! namespace (`azurefunctions.agents.durable`, `azurefunctions.agents.framework`).
//! Whether that works out usually depends on installation or import order.
//! This crate makes the outcome explicit and order-independent:
//!
//! - Each contributor declares a [`BindMode`]: `Exclusive` (sole ownership of
//!   every node on its path) or `Shared` (open to other `Shared` contributors)
//! - Incompatible claims fail registration with a [`RegistryError::NamespaceConflict`]
//!   naming both contributors and the deepest colliding prefix
//! - Duplicate leaf symbols resolve per a declared [`ResolvePolicy`] instead
//!   of silently shadowing each other
//!
//! # Quick Start
//!
//! ```
//! use graft_registry::{BindMode, Contributor, ContributorId, NsPath, Registry};
//!
//! # fn main() -> graft_registry::RegistryResult<()> {
//! let mut registry = Registry::new();
//!
//! let durable = Contributor::new(
//!     ContributorId::new("durable-extension", "1.0.0")?,
//!     NsPath::parse("azurefunctions.agents.durable")?,
//!     BindMode::Shared,
//! )
//! .with_symbol("start_durable_task", "durable task started");
//!
//! registry.register(durable)?;
//!
//! let hit = registry.resolve("azurefunctions.agents.durable.start_durable_task")?;
//! assert_eq!(*hit.value, "durable task started");
//! assert_eq!(hit.owner.to_string(), "durable-extension@1.0.0");
//! # Ok(())
//! # }
//! ```
//!
//! The registry is built once at startup (registration is the only mutation)
//! and read-only afterward. `Registry<V>` is `Send + Sync` whenever `V` is;
//! callers that must register concurrently wrap it in their own lock.

pub mod contributor;
pub mod error;
pub mod node;
pub mod path;
pub mod registry;

// Re-export main types
pub use contributor::{BindMode, Contributor, ContributorId};
pub use error::{RegistryError, RegistryResult};
pub use node::{Binding, NamespaceNode, NodeClaim};
pub use path::NsPath;
pub use registry::{RegisterOutcome, Registry, ResolvePolicy, Resolved, SymbolShadowed};

//! Namespace assembly and lookup.
//!
//! A [`Registry`] is built once at startup: the loader registers each
//! discovered contributor in sequence, then the registry is only read.
//! Registration is atomic per contributor: conflicts are detected in a
//! read-only pass before the tree is touched, so a failed `register` leaves
//! the registry exactly as it was.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::contributor::{BindMode, Contributor, ContributorId};
use crate::error::{RegistryError, RegistryResult};
use crate::node::{Binding, NamespaceNode, NodeClaim};
use crate::path::{validate_segment, NsPath};

/// What happens when two contributors bind the same leaf symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolvePolicy {
    /// Keep the earlier binding and record a warning.
    #[default]
    FirstWins,

    /// Replace with the later binding and record a warning.
    LastWins,

    /// Fail the registration that introduces the duplicate.
    ErrorOnConflict,
}

impl std::fmt::Display for ResolvePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstWins => write!(f, "first-wins"),
            Self::LastWins => write!(f, "last-wins"),
            Self::ErrorOnConflict => write!(f, "error-on-conflict"),
        }
    }
}

/// A duplicate leaf binding resolved by policy rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolShadowed {
    /// Full dotted path of the symbol.
    pub path: String,

    /// The contributor whose binding won.
    pub kept: ContributorId,

    /// The contributor whose binding lost.
    pub shadowed: ContributorId,
}

/// Outcome of a successful [`Registry::register`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// First-time registration, with any policy-resolved duplicates.
    Registered { warnings: Vec<SymbolShadowed> },

    /// The contributor was already registered with identical content; no-op.
    AlreadyRegistered,
}

impl RegisterOutcome {
    /// Warnings attached to the registration, if any.
    pub fn warnings(&self) -> &[SymbolShadowed] {
        match self {
            Self::Registered { warnings } => warnings,
            Self::AlreadyRegistered => &[],
        }
    }

    /// Whether this call actually mutated the registry.
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Registered { .. })
    }
}

/// A resolved symbol: the bound value and the contributor that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a, V> {
    /// The bound value.
    pub value: &'a V,

    /// The contributor whose binding won.
    pub owner: &'a ContributorId,
}

/// Shape of a completed registration, recorded for idempotence checks.
/// Values are generic and deliberately not part of the comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    path: NsPath,
    mode: BindMode,
    symbols: Vec<String>,
}

/// The namespace registry: root of the tree plus the duplicate-symbol policy.
#[derive(Debug, Clone)]
pub struct Registry<V> {
    root: NamespaceNode<V>,
    policy: ResolvePolicy,
    registered: BTreeMap<ContributorId, Fingerprint>,
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Registry<V> {
    /// Create a registry with the default policy (first-wins).
    pub fn new() -> Self {
        Self::with_policy(ResolvePolicy::default())
    }

    /// Create a registry with an explicit duplicate-symbol policy.
    pub fn with_policy(policy: ResolvePolicy) -> Self {
        Self {
            root: NamespaceNode::new(),
            policy,
            registered: BTreeMap::new(),
        }
    }

    /// The duplicate-symbol policy.
    pub fn policy(&self) -> ResolvePolicy {
        self.policy
    }

    /// Register a contributor, claiming every node along its path.
    ///
    /// Re-registering a contributor whose id and shape (path, mode, symbol
    /// names) match a completed registration is a no-op.
    pub fn register(&mut self, contributor: Contributor<V>) -> RegistryResult<RegisterOutcome> {
        let (id, path, mode, symbols) = contributor.into_parts();

        for name in symbols.keys() {
            validate_segment(name).map_err(|reason| RegistryError::InvalidContributor {
                name: id.name().to_string(),
                reason: format!("symbol '{name}': {reason}"),
            })?;
        }

        let fingerprint = Fingerprint {
            path: path.clone(),
            mode,
            symbols: symbols.keys().cloned().collect(),
        };
        if let Some(existing) = self.registered.get(&id) {
            if *existing == fingerprint {
                debug!(contributor = %id, "already registered, skipping");
                return Ok(RegisterOutcome::AlreadyRegistered);
            }
            return Err(RegistryError::ContributorMismatch { id });
        }

        self.check_conflicts(&id, &path, mode, &symbols)?;

        let policy = self.policy;
        let mut warnings = Vec::new();
        let mut node = &mut self.root;
        for segment in path.segments() {
            node = node.child_or_insert(segment);
            node.claim_for(&id, mode);
        }

        for (name, value) in symbols {
            let full = format!("{path}.{name}");
            match node.symbols.entry(name) {
                Entry::Vacant(entry) => {
                    entry.insert(Binding::new(value, id.clone()));
                }
                Entry::Occupied(mut entry) => {
                    let binding = entry.get_mut();
                    let record = match policy {
                        ResolvePolicy::FirstWins => {
                            binding.shadowed.push(id.clone());
                            SymbolShadowed {
                                path: full,
                                kept: binding.owner.clone(),
                                shadowed: id.clone(),
                            }
                        }
                        ResolvePolicy::LastWins => {
                            let loser = std::mem::replace(&mut binding.owner, id.clone());
                            binding.value = value;
                            binding.shadowed.push(loser.clone());
                            SymbolShadowed {
                                path: full,
                                kept: id.clone(),
                                shadowed: loser,
                            }
                        }
                        ResolvePolicy::ErrorOnConflict => {
                            unreachable!("duplicate symbols are rejected before mutation")
                        }
                    };
                    warn!(
                        symbol = %record.path,
                        kept = %record.kept,
                        shadowed = %record.shadowed,
                        "duplicate symbol resolved by {policy} policy"
                    );
                    warnings.push(record);
                }
            }
        }

        info!(contributor = %id, path = %path, mode = %mode, "registered contributor");
        self.registered.insert(id, fingerprint);
        Ok(RegisterOutcome::Registered { warnings })
    }

    /// Resolve a dotted symbol path to its bound value and owner.
    ///
    /// Under the `error-on-conflict` policy a multiply-bound symbol fails
    /// with [`RegistryError::AmbiguousSymbol`]; the permissive policies
    /// return the policy-selected winner.
    pub fn resolve(&self, path: &str) -> RegistryResult<Resolved<'_, V>> {
        self.resolve_inner(path, self.policy == ResolvePolicy::ErrorOnConflict)
    }

    /// Resolve, failing on any multiply-bound symbol regardless of policy.
    ///
    /// Lets a registry assembled under `first-wins` be audited for symbols
    /// that would have been rejected under `error-on-conflict`.
    pub fn resolve_strict(&self, path: &str) -> RegistryResult<Resolved<'_, V>> {
        self.resolve_inner(path, true)
    }

    fn resolve_inner(&self, raw: &str, strict: bool) -> RegistryResult<Resolved<'_, V>> {
        let path = NsPath::parse(raw)?;

        let (nodes, symbol) = path.split_symbol();
        let mut node = &self.root;
        for segment in nodes {
            node = node.child(segment).ok_or_else(|| RegistryError::SymbolNotFound {
                path: path.to_string(),
            })?;
        }
        let binding = node.symbol(symbol).ok_or_else(|| RegistryError::SymbolNotFound {
            path: path.to_string(),
        })?;

        if strict && !binding.shadowed().is_empty() {
            return Err(RegistryError::AmbiguousSymbol {
                path: path.to_string(),
                owners: binding.all_owners(),
            });
        }

        debug!(path = %path, owner = %binding.owner(), "resolved symbol");
        Ok(Resolved {
            value: binding.value(),
            owner: binding.owner(),
        })
    }

    /// Whether a dotted symbol path is bound, ignoring ambiguity.
    pub fn contains(&self, path: &str) -> bool {
        self.resolve_inner(path, false).is_ok()
    }

    /// Claim state of the node at `path`, if the node exists.
    pub fn claim_at(&self, path: &NsPath) -> Option<&NodeClaim> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = node.child(segment)?;
        }
        Some(node.claim())
    }

    /// Ids of all registered contributors, in order.
    pub fn contributors(&self) -> impl Iterator<Item = &ContributorId> {
        self.registered.keys()
    }

    /// Number of completed registrations.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// Whether no contributor has registered yet.
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Read-only pass over the existing tree.
    ///
    /// Reports the deepest colliding prefix: when an exclusive claim covers
    /// several ancestors, naming the longest shared prefix pinpoints where
    /// the two contributors actually diverge.
    fn check_conflicts(
        &self,
        id: &ContributorId,
        path: &NsPath,
        mode: BindMode,
        symbols: &BTreeMap<String, V>,
    ) -> RegistryResult<()> {
        let mut node = &self.root;
        let mut walked: Vec<String> = Vec::new();
        let mut deepest: Option<(ContributorId, usize)> = None;
        let mut terminal_exists = true;

        for segment in path.segments() {
            let Some(child) = node.child(segment) else {
                // Everything below here is new; nothing left to collide with.
                terminal_exists = false;
                break;
            };
            walked.push(segment.to_string());
            if !child.claim().admits(id, mode) {
                let holder = child.claim().holder().cloned().unwrap_or_else(|| id.clone());
                deepest = Some((holder, walked.len()));
            }
            node = child;
        }

        if let Some((holder, depth)) = deepest {
            walked.truncate(depth);
            return Err(RegistryError::NamespaceConflict {
                holder,
                contender: id.clone(),
                path: NsPath::from_validated(walked),
            });
        }

        if terminal_exists && self.policy == ResolvePolicy::ErrorOnConflict {
            for name in symbols.keys() {
                if let Some(binding) = node.symbol(name) {
                    let mut segments = walked.clone();
                    segments.push(name.clone());
                    return Err(RegistryError::DuplicateSymbol {
                        path: NsPath::from_validated(segments),
                        first: binding.owner().clone(),
                        second: id.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> ContributorId {
        ContributorId::new(name, "1.0.0").unwrap()
    }

    fn contributor(name: &str, path: &str, mode: BindMode) -> Contributor<&'static str> {
        Contributor::new(id(name), NsPath::parse(path).unwrap(), mode)
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = Registry::new();
        registry
            .register(contributor("pkg", "a.b", BindMode::Exclusive).with_symbol("f", "value"))
            .unwrap();

        let hit = registry.resolve("a.b.f").unwrap();
        assert_eq!(*hit.value, "value");
        assert_eq!(hit.owner, &id("pkg"));
        assert!(registry.contains("a.b.f"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_exclusive_prefix_rejects_extension() {
        let mut registry: Registry<&str> = Registry::new();
        registry
            .register(contributor("holder", "a.b", BindMode::Exclusive))
            .unwrap();

        let err = registry
            .register(contributor("contender", "a.b.c", BindMode::Shared))
            .unwrap_err();
        match err {
            RegistryError::NamespaceConflict {
                holder,
                contender,
                path,
            } => {
                assert_eq!(holder, id("holder"));
                assert_eq!(contender, id("contender"));
                assert_eq!(path.to_string(), "a.b");
            }
            other => panic!("expected NamespaceConflict, got {other:?}"),
        }
    }

    #[test]
    fn test_conflict_leaves_registry_unchanged() {
        let mut registry: Registry<&str> = Registry::new();
        registry
            .register(contributor("holder", "a.b", BindMode::Exclusive).with_symbol("f", "v"))
            .unwrap();

        let before = registry.len();
        let _ = registry
            .register(contributor("contender", "a.b.c", BindMode::Shared).with_symbol("g", "w"))
            .unwrap_err();

        assert_eq!(registry.len(), before);
        assert!(!registry.contains("a.b.c.g"));
        assert!(registry.contains("a.b.f"));
    }

    #[test]
    fn test_shared_siblings_coexist() {
        let mut registry = Registry::new();
        registry
            .register(contributor("one", "a.b.c1", BindMode::Shared).with_symbol("f", "f1"))
            .unwrap();
        registry
            .register(contributor("two", "a.b.c2", BindMode::Shared).with_symbol("g", "g2"))
            .unwrap();

        assert_eq!(*registry.resolve("a.b.c1.f").unwrap().value, "f1");
        assert_eq!(*registry.resolve("a.b.c2.g").unwrap().value, "g2");

        let prefix = NsPath::parse("a.b").unwrap();
        assert!(matches!(
            registry.claim_at(&prefix),
            Some(NodeClaim::Shared(members)) if members.len() == 2
        ));
    }

    #[test]
    fn test_exclusive_contender_rejected_at_shared_node() {
        let mut registry: Registry<&str> = Registry::new();
        registry
            .register(contributor("open", "a.b", BindMode::Shared))
            .unwrap();

        let err = registry
            .register(contributor("closed", "a.b.c", BindMode::Exclusive))
            .unwrap_err();
        match err {
            RegistryError::NamespaceConflict { holder, path, .. } => {
                assert_eq!(holder, id("open"));
                assert_eq!(path.to_string(), "a.b");
            }
            other => panic!("expected NamespaceConflict, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_unknown_path() {
        let registry: Registry<&str> = Registry::new();
        assert!(matches!(
            registry.resolve("x.y.z"),
            Err(RegistryError::SymbolNotFound { path }) if path == "x.y.z"
        ));
    }

    #[test]
    fn test_resolve_missing_symbol_at_existing_node() {
        let mut registry = Registry::new();
        registry
            .register(contributor("pkg", "a.b", BindMode::Shared).with_symbol("f", "v"))
            .unwrap();
        assert!(matches!(
            registry.resolve("a.b.g"),
            Err(RegistryError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn test_idempotent_re_registration() {
        let mut registry = Registry::new();
        let first = registry
            .register(contributor("pkg", "a.b", BindMode::Shared).with_symbol("f", "v"))
            .unwrap();
        assert!(first.is_new());

        let second = registry
            .register(contributor("pkg", "a.b", BindMode::Shared).with_symbol("f", "v"))
            .unwrap();
        assert_eq!(second, RegisterOutcome::AlreadyRegistered);
        assert_eq!(registry.len(), 1);

        // And no shadow warning was produced for the re-bound symbol.
        assert!(second.warnings().is_empty());
        assert!(registry.resolve_strict("a.b.f").is_ok());
    }

    #[test]
    fn test_re_registration_with_different_shape() {
        let mut registry = Registry::new();
        registry
            .register(contributor("pkg", "a.b", BindMode::Shared).with_symbol("f", "v"))
            .unwrap();

        let err = registry
            .register(contributor("pkg", "a.b", BindMode::Shared).with_symbol("g", "w"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::ContributorMismatch { id: mismatched } if mismatched == id("pkg")));
    }

    #[test]
    fn test_first_wins_keeps_earlier_binding() {
        let mut registry = Registry::new();
        registry
            .register(contributor("early", "a.b", BindMode::Shared).with_symbol("f", "early"))
            .unwrap();
        let outcome = registry
            .register(contributor("late", "a.b", BindMode::Shared).with_symbol("f", "late"))
            .unwrap();

        assert_eq!(outcome.warnings().len(), 1);
        let warning = &outcome.warnings()[0];
        assert_eq!(warning.path, "a.b.f");
        assert_eq!(warning.kept, id("early"));
        assert_eq!(warning.shadowed, id("late"));

        let hit = registry.resolve("a.b.f").unwrap();
        assert_eq!(*hit.value, "early");
        assert_eq!(hit.owner, &id("early"));
    }

    #[test]
    fn test_last_wins_replaces_binding() {
        let mut registry = Registry::with_policy(ResolvePolicy::LastWins);
        registry
            .register(contributor("early", "a.b", BindMode::Shared).with_symbol("f", "early"))
            .unwrap();
        let outcome = registry
            .register(contributor("late", "a.b", BindMode::Shared).with_symbol("f", "late"))
            .unwrap();

        assert_eq!(outcome.warnings()[0].kept, id("late"));
        let hit = registry.resolve("a.b.f").unwrap();
        assert_eq!(*hit.value, "late");
        assert_eq!(hit.owner, &id("late"));
    }

    #[test]
    fn test_error_on_conflict_rejects_duplicate() {
        let mut registry = Registry::with_policy(ResolvePolicy::ErrorOnConflict);
        registry
            .register(contributor("early", "a.b", BindMode::Shared).with_symbol("f", "early"))
            .unwrap();
        let err = registry
            .register(contributor("late", "a.b", BindMode::Shared).with_symbol("f", "late"))
            .unwrap_err();

        match err {
            RegistryError::DuplicateSymbol {
                path,
                first,
                second,
            } => {
                assert_eq!(path.to_string(), "a.b.f");
                assert_eq!(first, id("early"));
                assert_eq!(second, id("late"));
            }
            other => panic!("expected DuplicateSymbol, got {other:?}"),
        }

        // The failed registration bound nothing, not even its fresh symbols.
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_strict_flags_shadowed_symbol() {
        let mut registry = Registry::new();
        registry
            .register(contributor("early", "a.b", BindMode::Shared).with_symbol("f", "early"))
            .unwrap();
        registry
            .register(contributor("late", "a.b", BindMode::Shared).with_symbol("f", "late"))
            .unwrap();

        // Permissive resolve picks the winner.
        assert!(registry.resolve("a.b.f").is_ok());

        // Strict resolve surfaces both binders.
        match registry.resolve_strict("a.b.f").unwrap_err() {
            RegistryError::AmbiguousSymbol { path, owners } => {
                assert_eq!(path, "a.b.f");
                assert_eq!(owners, vec![id("early"), id("late")]);
            }
            other => panic!("expected AmbiguousSymbol, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_symbol_name_rejected() {
        let mut registry = Registry::new();
        let err = registry
            .register(contributor("pkg", "a.b", BindMode::Shared).with_symbol("bad-name", "v"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidContributor { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_contributors_listing() {
        let mut registry: Registry<&str> = Registry::new();
        registry
            .register(contributor("beta", "b", BindMode::Shared))
            .unwrap();
        registry
            .register(contributor("alpha", "a", BindMode::Shared))
            .unwrap();

        let names: Vec<_> = registry.contributors().map(ContributorId::name).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_claim_at_missing_node() {
        let registry: Registry<&str> = Registry::new();
        let path = NsPath::parse("no.such.node").unwrap();
        assert!(registry.claim_at(&path).is_none());
    }
}

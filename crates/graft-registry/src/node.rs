//! The namespace tree.
//!
//! Each [`NamespaceNode`] is one path segment. The claim state machine per
//! node: `Unclaimed` → `Exclusive` or `Shared` on first registration;
//! `Shared` nodes admit further `Shared` registrants; `Exclusive` nodes
//! admit nobody else. A node never switches mode once claimed.

use std::collections::BTreeMap;

use crate::contributor::{BindMode, ContributorId};

/// Claim state of a single namespace node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeClaim {
    /// No contributor has bound here yet.
    Unclaimed,

    /// Sole owner; rejects all other contributors.
    Exclusive(ContributorId),

    /// Open node; every `Shared` registrant that walked through it,
    /// in registration order.
    Shared(Vec<ContributorId>),
}

impl NodeClaim {
    /// The contributor a conflict should name as the current holder, if any.
    pub fn holder(&self) -> Option<&ContributorId> {
        match self {
            Self::Unclaimed => None,
            Self::Exclusive(owner) => Some(owner),
            Self::Shared(members) => members.first(),
        }
    }

    /// Whether a contender with the given mode may bind at this node.
    pub(crate) fn admits(&self, contender: &ContributorId, mode: BindMode) -> bool {
        match self {
            Self::Unclaimed => true,
            Self::Exclusive(owner) => owner == contender,
            Self::Shared(_) => mode == BindMode::Shared,
        }
    }
}

impl std::fmt::Display for NodeClaim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unclaimed => write!(f, "unclaimed"),
            Self::Exclusive(owner) => write!(f, "exclusive:{}", owner),
            Self::Shared(members) => write!(f, "shared:{}", members.len()),
        }
    }
}

/// A bound leaf symbol: the winning value and owner, plus any contributors
/// whose binding lost under the registry's policy.
#[derive(Debug, Clone)]
pub struct Binding<V> {
    pub(crate) value: V,
    pub(crate) owner: ContributorId,
    pub(crate) shadowed: Vec<ContributorId>,
}

impl<V> Binding<V> {
    pub(crate) fn new(value: V, owner: ContributorId) -> Self {
        Self {
            value,
            owner,
            shadowed: Vec::new(),
        }
    }

    /// The winning value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// The contributor whose binding won.
    pub fn owner(&self) -> &ContributorId {
        &self.owner
    }

    /// Contributors whose binding lost under the policy.
    pub fn shadowed(&self) -> &[ContributorId] {
        &self.shadowed
    }

    /// Everyone who bound this symbol: the owner plus the shadowed.
    pub fn all_owners(&self) -> Vec<ContributorId> {
        let mut owners = vec![self.owner.clone()];
        owners.extend(self.shadowed.iter().cloned());
        owners
    }
}

/// One segment of the namespace tree.
#[derive(Debug, Clone)]
pub struct NamespaceNode<V> {
    pub(crate) claim: NodeClaim,
    pub(crate) children: BTreeMap<String, NamespaceNode<V>>,
    pub(crate) symbols: BTreeMap<String, Binding<V>>,
}

impl<V> NamespaceNode<V> {
    pub(crate) fn new() -> Self {
        Self {
            claim: NodeClaim::Unclaimed,
            children: BTreeMap::new(),
            symbols: BTreeMap::new(),
        }
    }

    /// Current claim state.
    pub fn claim(&self) -> &NodeClaim {
        &self.claim
    }

    /// Child node by segment name.
    pub fn child(&self, segment: &str) -> Option<&NamespaceNode<V>> {
        self.children.get(segment)
    }

    /// Symbol binding by name.
    pub fn symbol(&self, name: &str) -> Option<&Binding<V>> {
        self.symbols.get(name)
    }

    /// Record `contender` as a claimant. Callers check `admits` first.
    pub(crate) fn claim_for(&mut self, contender: &ContributorId, mode: BindMode) {
        match (&mut self.claim, mode) {
            (NodeClaim::Unclaimed, BindMode::Exclusive) => {
                self.claim = NodeClaim::Exclusive(contender.clone());
            }
            (NodeClaim::Unclaimed, BindMode::Shared) => {
                self.claim = NodeClaim::Shared(vec![contender.clone()]);
            }
            (NodeClaim::Shared(members), BindMode::Shared) => {
                if !members.contains(contender) {
                    members.push(contender.clone());
                }
            }
            // Exclusive owner walking its own node, or states admits() rejects.
            _ => {}
        }
    }

    pub(crate) fn child_or_insert(&mut self, segment: &str) -> &mut NamespaceNode<V> {
        self.children
            .entry(segment.to_string())
            .or_insert_with(NamespaceNode::new)
    }
}

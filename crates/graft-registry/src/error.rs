//! Error types for namespace registration and lookup.

use crate::contributor::ContributorId;
use crate::path::NsPath;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A contributor tried to bind under a prefix whose claim is incompatible
    /// with its declared mode.
    #[error("namespace conflict at '{path}': claimed by {holder}, cannot admit {contender}")]
    NamespaceConflict {
        holder: ContributorId,
        contender: ContributorId,
        path: NsPath,
    },

    /// Two contributors bound the same leaf symbol and the policy forbids it.
    #[error("duplicate symbol '{path}': first bound by {first}, rebound by {second}")]
    DuplicateSymbol {
        path: NsPath,
        first: ContributorId,
        second: ContributorId,
    },

    /// Lookup path does not exist in the registry.
    #[error("symbol not found: {path}")]
    SymbolNotFound { path: String },

    /// Multiple contributors bound the symbol and the policy demands a unique owner.
    #[error("ambiguous symbol '{path}': bound by {}", fmt_owners(.owners))]
    AmbiguousSymbol {
        path: String,
        owners: Vec<ContributorId>,
    },

    /// Invalid dotted path format.
    #[error("invalid namespace path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Invalid contributor metadata (name, version, or symbol names).
    #[error("invalid contributor '{name}': {reason}")]
    InvalidContributor { name: String, reason: String },

    /// A contributor re-registered under the same id with different content.
    #[error("contributor {id} re-registered with different content")]
    ContributorMismatch { id: ContributorId },
}

impl RegistryError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Not found / malformed input
            Self::SymbolNotFound { .. } => 1,
            Self::InvalidPath { .. } => 1,
            Self::InvalidContributor { .. } => 1,
            Self::ContributorMismatch { .. } => 1,

            // Namespace assembly failures
            Self::NamespaceConflict { .. } => 3,
            Self::DuplicateSymbol { .. } => 4,
            Self::AmbiguousSymbol { .. } => 4,
        }
    }

    /// Whether the error was raised during registration (as opposed to lookup).
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            Self::NamespaceConflict { .. }
                | Self::DuplicateSymbol { .. }
                | Self::InvalidContributor { .. }
                | Self::ContributorMismatch { .. }
        )
    }
}

fn fmt_owners(owners: &[ContributorId]) -> String {
    owners
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

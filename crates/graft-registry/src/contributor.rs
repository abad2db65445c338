//! Contributor metadata.
//!
//! A contributor is an independently loaded unit (an installed package, a
//! plugin) that supplies symbols under a dotted namespace path. The external
//! loader that discovers contributors is out of scope; callers hand fully
//! built [`Contributor`] values to [`Registry::register`](crate::Registry::register).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::path::NsPath;

/// Identity of a contributor: `name@version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContributorId {
    name: String,
    version: String,
}

impl ContributorId {
    /// Create a contributor id, validating the name.
    ///
    /// # Examples
    ///
    /// ```
    /// use graft_registry::ContributorId;
    ///
    /// let id = ContributorId::new("durable-extension", "1.0.0").unwrap();
    /// assert_eq!(id.to_string(), "durable-extension@1.0.0");
    ///
    /// assert!(ContributorId::new("MyExtension", "1.0.0").is_err());
    /// ```
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> RegistryResult<Self> {
        let name = name.into();
        let version = version.into();

        validate_contributor_name(&name)?;

        if version.is_empty() {
            return Err(RegistryError::InvalidContributor {
                name,
                reason: "version cannot be empty".to_string(),
            });
        }

        Ok(Self { name, version })
    }

    /// Contributor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contributor version.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl std::fmt::Display for ContributorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// How a contributor claims the nodes along its namespace path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    /// Sole ownership of every node on the path; no other contributor may
    /// bind under any of them.
    Exclusive,

    /// The path is open to extension by other `Shared` contributors.
    Shared,
}

impl std::fmt::Display for BindMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exclusive => write!(f, "exclusive"),
            Self::Shared => write!(f, "shared"),
        }
    }
}

/// A contributor: id, the path it binds, its mode, and the leaf symbols it
/// supplies at the deepest node of that path.
#[derive(Debug, Clone)]
pub struct Contributor<V> {
    id: ContributorId,
    path: NsPath,
    mode: BindMode,
    symbols: BTreeMap<String, V>,
}

impl<V> Contributor<V> {
    /// Create a contributor with no symbols yet.
    pub fn new(id: ContributorId, path: NsPath, mode: BindMode) -> Self {
        Self {
            id,
            path,
            mode,
            symbols: BTreeMap::new(),
        }
    }

    /// Add a leaf symbol. Later additions under the same name replace
    /// earlier ones; symbol names are validated at registration time.
    pub fn with_symbol(mut self, name: impl Into<String>, value: V) -> Self {
        self.symbols.insert(name.into(), value);
        self
    }

    /// Contributor id.
    pub fn id(&self) -> &ContributorId {
        &self.id
    }

    /// The namespace path this contributor binds.
    pub fn path(&self) -> &NsPath {
        &self.path
    }

    /// Declared bind mode.
    pub fn mode(&self) -> BindMode {
        self.mode
    }

    /// Leaf symbols in name order.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, &V)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn into_parts(self) -> (ContributorId, NsPath, BindMode, BTreeMap<String, V>) {
        (self.id, self.path, self.mode, self.symbols)
    }
}

/// Validate a contributor name.
fn validate_contributor_name(name: &str) -> RegistryResult<()> {
    let invalid = |reason: &str| RegistryError::InvalidContributor {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }

    // Must start with lowercase letter
    if !name
        .chars()
        .next()
        .map(|c| c.is_ascii_lowercase())
        .unwrap_or(false)
    {
        return Err(invalid("name must start with a lowercase letter"));
    }

    // Must only contain lowercase letters, digits, and hyphens
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            "name may only contain lowercase letters, digits, and hyphens",
        ));
    }

    // Cannot end with hyphen
    if name.ends_with('-') {
        return Err(invalid("name cannot end with a hyphen"));
    }

    // Cannot have consecutive hyphens
    if name.contains("--") {
        return Err(invalid("name cannot have consecutive hyphens"));
    }

    Ok(())
}

//! Dotted namespace path parsing.
//!
//! A path locates a node (or a symbol) inside the namespace tree:
//! - `azurefunctions` → a top-level node
//! - `azurefunctions.agents.durable` → a nested node
//! - `azurefunctions.agents.durable.start_durable_task` → a leaf symbol
//!
//! Segments are identifier-like: ASCII letters, digits, and underscores,
//! not starting with a digit.

use crate::error::{RegistryError, RegistryResult};

/// A parsed dotted namespace path. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NsPath {
    segments: Vec<String>,
}

impl NsPath {
    /// Parse a dotted path string.
    ///
    /// # Examples
    ///
    /// ```
    /// use graft_registry::NsPath;
    ///
    /// let path = NsPath::parse("azurefunctions.agents.durable").unwrap();
    /// assert_eq!(path.len(), 3);
    /// assert_eq!(path.leaf(), "durable");
    ///
    /// assert!(NsPath::parse("a..b").is_err());
    /// assert!(NsPath::parse("1agents").is_err());
    /// ```
    pub fn parse(path: &str) -> RegistryResult<Self> {
        let path = path.trim();

        if path.is_empty() {
            return Err(RegistryError::InvalidPath {
                path: path.to_string(),
                reason: "empty path".to_string(),
            });
        }

        let mut segments = Vec::new();
        for segment in path.split('.') {
            validate_segment(segment).map_err(|reason| RegistryError::InvalidPath {
                path: path.to_string(),
                reason,
            })?;
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// Build a path from already-validated segments.
    pub(crate) fn from_validated(segments: Vec<String>) -> Self {
        debug_assert!(!segments.is_empty());
        Self { segments }
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; kept for API symmetry with collection types.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterate the segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// The final segment.
    pub fn leaf(&self) -> &str {
        // Parsing guarantees at least one segment.
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Split into the node segments and the terminal symbol name.
    ///
    /// For a single-segment path the node part is empty: the symbol would
    /// have to live directly at the root, where contributors never bind.
    pub fn split_symbol(&self) -> (&[String], &str) {
        match self.segments.split_last() {
            Some((symbol, nodes)) => (nodes, symbol.as_str()),
            None => (&self.segments, ""),
        }
    }

    /// Whether `self` starts with all segments of `prefix`.
    pub fn starts_with(&self, prefix: &NsPath) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }
}

impl std::fmt::Display for NsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl std::str::FromStr for NsPath {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Validate a single path segment (also used for leaf symbol names).
pub(crate) fn validate_segment(segment: &str) -> Result<(), String> {
    if segment.is_empty() {
        return Err("empty segment".to_string());
    }

    if segment
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
    {
        return Err(format!("segment '{segment}' starts with a digit"));
    }

    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(format!(
            "segment '{segment}' may only contain ASCII letters, digits, and underscores"
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_segment() {
        let path = NsPath::parse("azurefunctions").unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path.leaf(), "azurefunctions");
    }

    #[test]
    fn test_parse_nested() {
        let path = NsPath::parse("azurefunctions.agents.durable").unwrap();
        assert_eq!(
            path.segments().collect::<Vec<_>>(),
            vec!["azurefunctions", "agents", "durable"]
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let path = NsPath::parse("  a.b  ").unwrap();
        assert_eq!(path.to_string(), "a.b");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(
            NsPath::parse(""),
            Err(RegistryError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_parse_empty_segment() {
        assert!(matches!(
            NsPath::parse("a..b"),
            Err(RegistryError::InvalidPath { .. })
        ));
        assert!(matches!(
            NsPath::parse(".a"),
            Err(RegistryError::InvalidPath { .. })
        ));
        assert!(matches!(
            NsPath::parse("a."),
            Err(RegistryError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_parse_digit_start() {
        assert!(matches!(
            NsPath::parse("agents.1durable"),
            Err(RegistryError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_parse_bad_characters() {
        assert!(matches!(
            NsPath::parse("agents.dur-able"),
            Err(RegistryError::InvalidPath { .. })
        ));
        assert!(matches!(
            NsPath::parse("agents.dur able"),
            Err(RegistryError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_underscores_allowed() {
        let path = NsPath::parse("agents.start_durable_task").unwrap();
        assert_eq!(path.leaf(), "start_durable_task");
    }

    #[test]
    fn test_split_symbol() {
        let path = NsPath::parse("a.b.c").unwrap();
        let (nodes, symbol) = path.split_symbol();
        assert_eq!(nodes, &["a".to_string(), "b".to_string()][..]);
        assert_eq!(symbol, "c");

        let single = NsPath::parse("a").unwrap();
        let (nodes, symbol) = single.split_symbol();
        assert!(nodes.is_empty());
        assert_eq!(symbol, "a");
    }

    #[test]
    fn test_starts_with() {
        let path = NsPath::parse("a.b.c").unwrap();
        let prefix = NsPath::parse("a.b").unwrap();
        let other = NsPath::parse("a.x").unwrap();
        assert!(path.starts_with(&prefix));
        assert!(path.starts_with(&path));
        assert!(!path.starts_with(&other));
        assert!(!prefix.starts_with(&path));
    }

    #[test]
    fn test_display_round_trip() {
        let path = NsPath::parse("azurefunctions.agents.framework").unwrap();
        assert_eq!(path.to_string(), "azurefunctions.agents.framework");
    }

    #[test]
    fn test_from_str() {
        let path: NsPath = "a.b".parse().unwrap();
        assert_eq!(path.len(), 2);
    }
}

//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Oid`] - Git commit identifier (SHA)
//! - [`RefKind`] - Branch or tag
//! - [`RefId`] - Qualified reference identity (`heads/<name>`, `tags/<name>`)
//! - [`RepoName`] - Validated name of a configured repository
//! - [`Fingerprint`] - Inventory state hash for change detection
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use mirrorsync::core::types::{Oid, RefId, RefKind};
//!
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let main = RefId::branch("main").unwrap();
//! assert_eq!(main.qualified(), "heads/main");
//! assert_eq!(main.kind(), RefKind::Branch);
//!
//! assert!(RefId::tag("bad..tag").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid repository name: {0}")]
    InvalidRepoName(String),
}

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency. Equality is plain
/// string equality, which is what the classifier relies on for `same`.
///
/// # Example
///
/// ```
/// use mirrorsync::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    ///
    /// Returns the first `len` characters, or the full OID if shorter.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of a reference.
///
/// Ordering puts branches before tags, which is the presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Branch,
    Tag,
}

impl RefKind {
    /// Namespace component under `refs/` (`heads` or `tags`).
    pub fn namespace(self) -> &'static str {
        match self {
            RefKind::Branch => "heads",
            RefKind::Tag => "tags",
        }
    }

    /// Both kinds, in presentation order.
    pub fn all() -> [RefKind; 2] {
        [RefKind::Branch, RefKind::Tag]
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefKind::Branch => write!(f, "branch"),
            RefKind::Tag => write!(f, "tag"),
        }
    }
}

/// A qualified reference identity: a `(kind, short name)` pair.
///
/// Unique within one inventory. Rendered as `heads/<name>` or
/// `tags/<name>`; the full git name is `refs/heads/<name>`.
///
/// # Example
///
/// ```
/// use mirrorsync::core::types::{RefId, RefKind};
///
/// let id = RefId::from_full_name("refs/tags/v1.0").unwrap();
/// assert_eq!(id.kind(), RefKind::Tag);
/// assert_eq!(id.name(), "v1.0");
/// assert_eq!(id.full_name(), "refs/tags/v1.0");
///
/// let same = RefId::from_qualified("tags/v1.0").unwrap();
/// assert_eq!(id, same);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RefId {
    kind: RefKind,
    name: String,
}

impl RefId {
    /// Create a validated reference identity.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if `name` violates git's refname rules.
    pub fn new(kind: RefKind, name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_short_name(&name)?;
        Ok(Self { kind, name })
    }

    /// Shorthand for a branch identity.
    pub fn branch(name: impl Into<String>) -> Result<Self, TypeError> {
        Self::new(RefKind::Branch, name)
    }

    /// Shorthand for a tag identity.
    pub fn tag(name: impl Into<String>) -> Result<Self, TypeError> {
        Self::new(RefKind::Tag, name)
    }

    /// Parse a full git reference name (`refs/heads/x`, `refs/tags/y`).
    pub fn from_full_name(full: &str) -> Result<Self, TypeError> {
        let rest = full.strip_prefix("refs/").ok_or_else(|| {
            TypeError::InvalidRefName(format!("'{full}' is not under refs/"))
        })?;
        Self::from_qualified(rest)
    }

    /// Parse a qualified name (`heads/x`, `tags/y`).
    pub fn from_qualified(qualified: &str) -> Result<Self, TypeError> {
        for kind in RefKind::all() {
            let prefix = format!("{}/", kind.namespace());
            if let Some(name) = qualified.strip_prefix(&prefix) {
                return Self::new(kind, name);
            }
        }
        Err(TypeError::InvalidRefName(format!(
            "'{qualified}' is neither a branch nor a tag"
        )))
    }

    pub fn kind(&self) -> RefKind {
        self.kind
    }

    /// The short name, without namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `heads/<name>` or `tags/<name>`.
    pub fn qualified(&self) -> String {
        format!("{}/{}", self.kind.namespace(), self.name)
    }

    /// `refs/heads/<name>` or `refs/tags/<name>`.
    pub fn full_name(&self) -> String {
        format!("refs/{}", self.qualified())
    }
}

impl std::fmt::Display for RefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind.namespace(), self.name)
    }
}

/// Validate a short reference name against git's refname rules
/// (see `git check-ref-format`).
fn validate_short_name(name: &str) -> Result<(), TypeError> {
    if name.is_empty() {
        return Err(TypeError::InvalidRefName("ref name cannot be empty".into()));
    }
    if name == "@" {
        return Err(TypeError::InvalidRefName(
            "ref name cannot be '@' (reserved)".into(),
        ));
    }
    if name.starts_with('-') {
        return Err(TypeError::InvalidRefName(
            "ref name cannot start with '-'".into(),
        ));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(TypeError::InvalidRefName(
            "ref name cannot start or end with '/'".into(),
        ));
    }
    if name.ends_with('.') {
        return Err(TypeError::InvalidRefName(
            "ref name cannot end with '.'".into(),
        ));
    }

    for pattern in ["..", "@{", "//"] {
        if name.contains(pattern) {
            return Err(TypeError::InvalidRefName(format!(
                "ref name cannot contain '{pattern}'"
            )));
        }
    }

    const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
    for c in INVALID_CHARS {
        if name.contains(c) {
            return Err(TypeError::InvalidRefName(format!(
                "ref name cannot contain '{c}'"
            )));
        }
    }

    if name.chars().any(|c| c.is_ascii_control()) {
        return Err(TypeError::InvalidRefName(
            "ref name cannot contain control characters".into(),
        ));
    }

    for component in name.split('/') {
        if component.starts_with('.') {
            return Err(TypeError::InvalidRefName(
                "path component cannot start with '.'".into(),
            ));
        }
        if component.ends_with(".lock") {
            return Err(TypeError::InvalidRefName(
                "path component cannot end with '.lock'".into(),
            ));
        }
    }

    Ok(())
}

/// The name of a configured repository.
///
/// Used as a single directory component under the cache root, so it may
/// not contain path separators or start with a dot.
///
/// # Example
///
/// ```
/// use mirrorsync::core::types::RepoName;
///
/// assert!(RepoName::new("widget").is_ok());
/// assert!(RepoName::new("org/widget").is_err());
/// assert!(RepoName::new("..").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName(String);

impl RepoName {
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidRepoName(
                "repository name cannot be empty".into(),
            ));
        }
        if name.starts_with('.') {
            return Err(TypeError::InvalidRepoName(format!(
                "'{name}' cannot start with '.'"
            )));
        }
        if name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_ascii_control() || c.is_whitespace())
        {
            return Err(TypeError::InvalidRepoName(format!(
                "'{name}' must be a single path component without whitespace"
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepoName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RepoName> for String {
    fn from(name: RepoName) -> Self {
        name.0
    }
}

impl std::fmt::Display for RepoName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stable hash over inventory state.
///
/// Computed over sorted `(qualified name, oid)` pairs so that two reads of
/// an unchanged inventory always agree, regardless of input order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from `(ref, oid)` pairs.
    pub fn compute<'a>(refs: impl IntoIterator<Item = (&'a RefId, &'a Oid)>) -> Self {
        let mut sorted: Vec<_> = refs.into_iter().collect();
        sorted.sort();

        let mut hasher = Sha256::new();
        for (id, oid) in sorted {
            hasher.update(id.qualified().as_bytes());
            hasher.update(b"\0");
            hasher.update(oid.as_str().as_bytes());
            hasher.update(b"\n");
        }

        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(c: char) -> Oid {
        Oid::new(c.to_string().repeat(40)).unwrap()
    }

    mod oid {
        use super::*;

        #[test]
        fn accepts_sha1_and_sha256() {
            assert!(Oid::new("a".repeat(40)).is_ok());
            assert!(Oid::new("b".repeat(64)).is_ok());
        }

        #[test]
        fn rejects_wrong_length() {
            assert!(Oid::new("abc").is_err());
            assert!(Oid::new("a".repeat(41)).is_err());
        }

        #[test]
        fn rejects_non_hex() {
            assert!(Oid::new("g".repeat(40)).is_err());
        }

        #[test]
        fn short_is_clamped() {
            let o = oid('a');
            assert_eq!(o.short(7), "aaaaaaa");
            assert_eq!(o.short(100).len(), 40);
        }
    }

    mod ref_id {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(RefId::branch("main").is_ok());
            assert!(RefId::branch("feature/foo").is_ok());
            assert!(RefId::tag("v1.2.3").is_ok());
            assert!(RefId::tag("release/2024-01").is_ok());
        }

        #[test]
        fn invalid_names() {
            assert!(RefId::branch("").is_err());
            assert!(RefId::branch("@").is_err());
            assert!(RefId::branch("-x").is_err());
            assert!(RefId::branch("a..b").is_err());
            assert!(RefId::branch("a//b").is_err());
            assert!(RefId::branch("trailing/").is_err());
            assert!(RefId::branch("x.lock").is_err());
            assert!(RefId::branch("foo/.hidden").is_err());
            assert!(RefId::tag("has space").is_err());
            assert!(RefId::tag("v1^").is_err());
        }

        #[test]
        fn parses_full_names() {
            let id = RefId::from_full_name("refs/heads/feature/x").unwrap();
            assert_eq!(id.kind(), RefKind::Branch);
            assert_eq!(id.name(), "feature/x");

            assert!(RefId::from_full_name("refs/remotes/origin/main").is_err());
            assert!(RefId::from_full_name("heads/main").is_err());
        }

        #[test]
        fn branches_sort_before_tags() {
            let tag = RefId::tag("a").unwrap();
            let branch = RefId::branch("z").unwrap();
            assert!(branch < tag);
        }

        #[test]
        fn display_is_qualified() {
            assert_eq!(RefId::tag("v1").unwrap().to_string(), "tags/v1");
        }
    }

    mod repo_name {
        use super::*;

        #[test]
        fn rejects_path_like_names() {
            assert!(RepoName::new("a/b").is_err());
            assert!(RepoName::new("a\\b").is_err());
            assert!(RepoName::new(".git").is_err());
            assert!(RepoName::new("with space").is_err());
            assert!(RepoName::new("").is_err());
        }

        #[test]
        fn accepts_plain_names() {
            assert_eq!(RepoName::new("widget-2").unwrap().as_str(), "widget-2");
        }
    }

    mod fingerprint {
        use super::*;

        #[test]
        fn order_independent() {
            let main = RefId::branch("main").unwrap();
            let v1 = RefId::tag("v1").unwrap();
            let (a, b) = (oid('a'), oid('b'));

            let fp1 = Fingerprint::compute([(&main, &a), (&v1, &b)]);
            let fp2 = Fingerprint::compute([(&v1, &b), (&main, &a)]);
            assert_eq!(fp1, fp2);
        }

        #[test]
        fn sensitive_to_commit() {
            let main = RefId::branch("main").unwrap();
            let (a, b) = (oid('a'), oid('b'));
            assert_ne!(
                Fingerprint::compute([(&main, &a)]),
                Fingerprint::compute([(&main, &b)])
            );
        }
    }
}

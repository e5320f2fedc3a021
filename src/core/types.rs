//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - branch a working copy is on or a library follows
//! - [`Oid`] - full commit hash, as pinned in a locked descriptor
//!
//! Both are validated on construction and on deserialization, so a
//! malformed hash can never be published.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// Implements the string conversions shared by the validated newtypes.
macro_rules! string_newtype {
    ($ty:ident) => {
        impl $ty {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $ty {
            type Error = TypeError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

/// A branch name as recorded in descriptors and reported by status.
///
/// Follows `git check-ref-format --branch`: no empty or `@` names, no
/// leading `-`, no component starting with `.` or ending in `.lock`, no
/// `..`, `@{`, empty components, whitespace, control characters or any of
/// `~^:?*[\`.
///
/// ```
/// use targetlock::core::types::BranchName;
///
/// assert_eq!(BranchName::new("feature/x").unwrap().as_str(), "feature/x");
/// assert!(BranchName::new("has space").is_err());
/// assert!(BranchName::new("release.lock").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

string_newtype!(BranchName);

impl BranchName {
    /// # Errors
    ///
    /// [`TypeError::InvalidBranchName`] naming the first rule broken.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        match branch_name_problem(&name) {
            Some(problem) => Err(TypeError::InvalidBranchName(format!("'{name}' {problem}"))),
            None => Ok(Self(name)),
        }
    }
}

fn branch_name_problem(name: &str) -> Option<&'static str> {
    const FORBIDDEN: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

    if name.is_empty() || name == "@" {
        return Some("is not a usable name");
    }
    if name.starts_with('-') {
        return Some("starts with '-'");
    }
    if name.contains("..") || name.contains("@{") {
        return Some("contains '..' or '@{'");
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || FORBIDDEN.contains(&c))
    {
        return Some("contains a forbidden character");
    }
    if name
        .split('/')
        .any(|part| part.is_empty() || part.starts_with('.') || part.ends_with(".lock"))
    {
        return Some("has an empty, hidden or '.lock' component");
    }
    None
}

/// A full commit hash, lowercase.
///
/// Pinned revisions in a locked descriptor are always full hashes (40 hex
/// digits for SHA-1 repositories, 64 for SHA-256), never abbreviations.
///
/// ```
/// use targetlock::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

string_newtype!(Oid);

impl Oid {
    /// # Errors
    ///
    /// [`TypeError::InvalidOid`] unless `oid` is 40 or 64 hex digits.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if !Self::is_full_hex(&oid) {
            return Err(TypeError::InvalidOid(format!(
                "'{oid}' is not a full 40 or 64 digit hex hash"
            )));
        }
        Ok(Self(oid))
    }

    /// Whether `candidate` is a full hash rather than, say, a branch name.
    pub fn is_full_hex(candidate: &str) -> bool {
        matches!(candidate.len(), 40 | 64) && candidate.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// The first `len` digits (all of them if `len` is larger).
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_names_seen_in_descriptors() {
        for name in ["main", "master", "v2", "feature/uart-dma", "fix-123", "with.dot"] {
            assert!(BranchName::new(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn rejected_branch_names() {
        for name in [
            "", "@", "-flag", ".hidden", "foo/.hidden", "foo/bar.lock", "trailing/", "a//b",
            "a..b", "a@{b", "what?", "tab\there", "has space",
        ] {
            assert!(BranchName::new(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn branch_error_names_the_input() {
        let err = BranchName::new("bad name").unwrap_err();
        assert!(err.to_string().contains("'bad name'"));
    }

    #[test]
    fn deserializing_validates() {
        assert!(serde_json::from_str::<BranchName>("\"bad name\"").is_err());
        assert!(serde_json::from_str::<Oid>("\"abc123\"").is_err());
    }

    #[test]
    fn oid_is_lowercased() {
        let oid = Oid::new("ABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap();
        assert_eq!(oid.to_string(), "abcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn oid_requires_full_length_hex() {
        assert!(Oid::new("abc123").is_err());
        assert!(Oid::new("g".repeat(40)).is_err());
        assert!(Oid::new("a".repeat(64)).is_ok());
        assert!(!Oid::is_full_hex("main"));
        assert!(!Oid::is_full_hex("deadbeef"));
    }

    #[test]
    fn short_is_clamped() {
        let oid = Oid::new("a".repeat(40)).unwrap();
        assert_eq!(oid.short(7), "aaaaaaa");
        assert_eq!(oid.short(100), oid.as_str());
    }
}

//! core::version
//!
//! Snapshot version numbers and the commit-message convention that records them.
//!
//! # Format
//!
//! A snapshot version renders as `v<major>.<minor>.<patch>` with an optional
//! branch-qualified pre-release suffix `-<branch>.<counter>`. Every lock
//! commit carries the message `Snapshot <version>`, and the next version is
//! derived by finding the most recent such message. The parser and the
//! message writer live side by side so they cannot drift apart.
//!
//! The branch part is any run of non-whitespace, matching what a branch
//! name may contain; the counter is the digits after its last dot.
//!
//! # Example
//!
//! ```
//! use targetlock::core::version::SnapshotVersion;
//!
//! let v = SnapshotVersion::find_in_message("Snapshot v1.2.3-featurex.2").unwrap();
//! assert_eq!(v.to_string(), "v1.2.3-featurex.2");
//! assert_eq!(v.commit_message(), "Snapshot v1.2.3-featurex.2");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static MESSAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Snapshot v(\d+)\.(\d+)\.(\d+)(?:-(\S+)\.(\d+))?")
        .expect("snapshot message pattern is valid")
});

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)(?:-(\S+)\.(\d+))?$")
        .expect("snapshot version pattern is valid")
});

/// Error parsing a version string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid snapshot version '{input}': expected v<major>.<minor>.<patch>[-<branch>.<n>]")]
pub struct VersionParseError {
    /// The rejected input.
    pub input: String,
}

/// Which component of the version a lock should advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Bump {
    /// `(a, b, c) -> (a, b, c + 1)`
    #[default]
    Patch,
    /// `(a, b, c) -> (a, b + 1, 0)`
    Minor,
    /// `(a, b, c) -> (a + 1, 0, 0)`
    Major,
    /// Same triple with a `-<branch>.<n>` pre-release suffix.
    Branch,
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Bump::Patch => "patch",
            Bump::Minor => "minor",
            Bump::Major => "major",
            Bump::Branch => "branch",
        };
        write!(f, "{name}")
    }
}

/// Branch-qualified pre-release counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreRelease {
    /// Branch the pre-release was cut from.
    pub branch: String,
    /// Per-branch counter, starting at 1.
    pub counter: u64,
}

/// A snapshot version.
///
/// Serializes as its display form (`"v1.2.3"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnapshotVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<PreRelease>,
}

impl SnapshotVersion {
    /// Create a release version with no pre-release suffix.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    /// Attach a pre-release suffix.
    pub fn with_pre_release(mut self, branch: impl Into<String>, counter: u64) -> Self {
        self.pre = Some(PreRelease {
            branch: branch.into(),
            counter,
        });
        self
    }

    /// Find the first `Snapshot v...` marker in a commit message.
    pub fn find_in_message(message: &str) -> Option<Self> {
        MESSAGE_PATTERN
            .captures(message)
            .and_then(|caps| Self::from_captures(&caps))
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Option<Self> {
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
        let mut version = Self::new(number(1)?, number(2)?, number(3)?);
        if let (Some(branch), Some(counter)) = (caps.get(4), number(5)) {
            version = version.with_pre_release(branch.as_str(), counter);
        }
        Some(version)
    }

    /// The commit message that records this version.
    pub fn commit_message(&self) -> String {
        format!("Snapshot {self}")
    }

    /// Release triple without any pre-release suffix.
    pub fn release(&self) -> Self {
        Self::new(self.major, self.minor, self.patch)
    }

    pub fn bump_major(&self) -> Self {
        Self::new(self.major + 1, 0, 0)
    }

    pub fn bump_minor(&self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }

    pub fn bump_patch(&self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }
}

impl FromStr for SnapshotVersion {
    type Err = VersionParseError;

    /// Parse `v1.2.3`, `1.2.3` or `v1.2.3-branch.4`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError {
            input: s.to_string(),
        };
        let caps = VERSION_PATTERN.captures(s.trim()).ok_or_else(err)?;
        Self::from_captures(&caps).ok_or_else(err)
    }
}

impl TryFrom<String> for SnapshotVersion {
    type Error = VersionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SnapshotVersion> for String {
    fn from(version: SnapshotVersion) -> Self {
        version.to_string()
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}.{}", pre.branch, pre.counter)?;
        }
        Ok(())
    }
}

impl Ord for SnapshotVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                // A pre-release sorts before its release.
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a
                    .branch
                    .cmp(&b.branch)
                    .then_with(|| a.counter.cmp(&b.counter)),
            })
    }
}

impl PartialOrd for SnapshotVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_release_and_pre_release() {
        assert_eq!(
            "v1.2.3".parse::<SnapshotVersion>().unwrap(),
            SnapshotVersion::new(1, 2, 3)
        );
        assert_eq!(
            "9.9.9".parse::<SnapshotVersion>().unwrap(),
            SnapshotVersion::new(9, 9, 9)
        );
        assert_eq!(
            "v1.2.3-feature/x.4".parse::<SnapshotVersion>().unwrap(),
            SnapshotVersion::new(1, 2, 3).with_pre_release("feature/x", 4)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!("1.2".parse::<SnapshotVersion>().is_err());
        assert!("v1.2.3-".parse::<SnapshotVersion>().is_err());
        assert!("latest".parse::<SnapshotVersion>().is_err());
    }

    #[test]
    fn branch_with_dots_keeps_last_counter() {
        let v = SnapshotVersion::find_in_message("Snapshot v0.1.0-rel.2.7").unwrap();
        let pre = v.pre.unwrap();
        assert_eq!(pre.branch, "rel.2");
        assert_eq!(pre.counter, 7);
    }

    #[test]
    fn branch_punctuation_survives_round_trip() {
        for branch in ["feat+x", "user@host", "a,b=c!", "fix/#12"] {
            let v = SnapshotVersion::new(1, 2, 3).with_pre_release(branch, 1);
            assert_eq!(v.to_string().parse::<SnapshotVersion>().unwrap(), v);
            assert_eq!(
                SnapshotVersion::find_in_message(&v.commit_message()),
                Some(v.clone())
            );
        }
        let v = SnapshotVersion::find_in_message("Snapshot v1.2.3-feat+x.1\n\nnotes").unwrap();
        assert_eq!(v.pre.unwrap().branch, "feat+x");
    }

    #[test]
    fn finds_marker_inside_longer_message() {
        let message = "Merge branch 'x'\n\nSnapshot v3.0.1 follow-up";
        assert_eq!(
            SnapshotVersion::find_in_message(message),
            Some(SnapshotVersion::new(3, 0, 1))
        );
        assert_eq!(SnapshotVersion::find_in_message("Fix typo"), None);
    }

    #[test]
    fn message_round_trips_through_scanner() {
        let v = SnapshotVersion::new(2, 0, 0).with_pre_release("dev", 1);
        assert_eq!(SnapshotVersion::find_in_message(&v.commit_message()), Some(v));
    }

    #[test]
    fn bumps_reset_lower_components() {
        let v = SnapshotVersion::new(1, 2, 3).with_pre_release("x", 1);
        assert_eq!(v.bump_major(), SnapshotVersion::new(2, 0, 0));
        assert_eq!(v.bump_minor(), SnapshotVersion::new(1, 3, 0));
        assert_eq!(v.bump_patch(), SnapshotVersion::new(1, 2, 4));
    }

    #[test]
    fn ordering() {
        let release = SnapshotVersion::new(1, 2, 3);
        let pre = release.clone().with_pre_release("a", 2);
        assert!(pre < release);
        assert!(release < release.bump_patch());
        assert!(pre < release.clone().with_pre_release("a", 3));
    }
}

//! core::descriptor
//!
//! The target's dependency descriptor and its two persisted forms.
//!
//! # Forms
//!
//! - **Unlocked** (`target.json`): human edited. Every library's `branch`
//!   names a branch to follow.
//! - **Locked** (`target-locked.json`): machine written. Every `branch` holds
//!   an immutable revision hash and `snapshot_version` records the version
//!   the lock was published as.
//!
//! Keys other than `libraries` and `snapshot_version` (and other than
//! `name`/`url`/`branch` on a library) are opaque: they are carried through
//! reads and writes untouched so the downstream build sees exactly what the
//! target author wrote.
//!
//! # Determinism
//!
//! Descriptors are written with keys in sorted order and four-space
//! indentation, so two locks of the same state produce identical bytes and
//! diffs stay minimal.
//!
//! # Example
//!
//! ```
//! use targetlock::core::descriptor::DependencyDescriptor;
//!
//! let json = r#"{ "name": "board", "libraries": [
//!     { "name": "core", "url": "https://example.com/core", "branch": "main" }
//! ] }"#;
//! let descriptor = DependencyDescriptor::from_json(json).unwrap();
//! assert_eq!(descriptor.libraries[0].name, "core");
//! assert!(!descriptor.is_locked());
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::paths::is_plain_dir_name;
use crate::core::types::Oid;
use crate::core::version::SnapshotVersion;

/// Errors reading or writing descriptor files.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The working copy or descriptor file does not exist.
    #[error("descriptor not found: {path}")]
    Missing { path: PathBuf },

    /// The descriptor exists but violates the schema.
    #[error("malformed descriptor '{path}': {message}")]
    Malformed { path: PathBuf, message: String },

    /// The descriptor could not be read.
    #[error("failed to read descriptor '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The descriptor could not be written.
    #[error("failed to write descriptor '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize descriptor: {0}")]
    Serialize(String),
}

/// One library dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// Library name; also the working copy directory under `libraries/`.
    pub name: String,

    /// Source location.
    #[serde(default)]
    pub url: String,

    /// Branch to follow (unlocked) or pinned revision (locked).
    pub branch: String,

    /// Opaque keys forwarded to the build.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl LibraryEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            branch: branch.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Replace the followed branch with an immutable revision.
    pub fn pin(&mut self, revision: &Oid) {
        self.branch = revision.to_string();
    }

    /// Whether `branch` holds a full revision hash.
    pub fn is_pinned(&self) -> bool {
        Oid::is_full_hex(&self.branch)
    }
}

/// A target's dependency manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    /// Libraries in declared order.
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,

    /// Present only in the locked form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_version: Option<SnapshotVersion>,

    /// Target metadata and build payload.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl DependencyDescriptor {
    /// Parse and validate a descriptor from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Malformed`] (with an empty path) on schema
    /// violations. Use [`DependencyDescriptor::read`] for file-backed errors.
    pub fn from_json(json: &str) -> Result<Self, DescriptorError> {
        Self::parse(json, Path::new(""))
    }

    fn parse(json: &str, path: &Path) -> Result<Self, DescriptorError> {
        let descriptor: Self =
            serde_json::from_str(json).map_err(|e| DescriptorError::Malformed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        descriptor.validate().map_err(|message| DescriptorError::Malformed {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(descriptor)
    }

    /// Read a descriptor file.
    ///
    /// # Errors
    ///
    /// - [`DescriptorError::Missing`] if the file does not exist
    /// - [`DescriptorError::Malformed`] on invalid JSON or schema violations
    pub fn read(path: &Path) -> Result<Self, DescriptorError> {
        if !path.is_file() {
            return Err(DescriptorError::Missing {
                path: path.to_path_buf(),
            });
        }
        let contents = fs::read_to_string(path).map_err(|e| DescriptorError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents, path)
    }

    /// Read a descriptor if the file exists.
    pub fn read_optional(path: &Path) -> Result<Option<Self>, DescriptorError> {
        match Self::read(path) {
            Ok(descriptor) => Ok(Some(descriptor)),
            Err(DescriptorError::Missing { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for library in &self.libraries {
            if library.name.trim().is_empty() {
                return Err("library name cannot be empty".into());
            }
            if !is_plain_dir_name(&library.name) {
                return Err(format!(
                    "library name '{}' must be a plain directory name",
                    library.name
                ));
            }
            if library.branch.trim().is_empty() {
                return Err(format!("library '{}' has an empty branch", library.name));
            }
            if !seen.insert(library.name.as_str()) {
                return Err(format!("duplicate library '{}'", library.name));
            }
        }
        Ok(())
    }

    /// Find a library by name.
    pub fn library(&self, name: &str) -> Option<&LibraryEntry> {
        self.libraries.iter().find(|l| l.name == name)
    }

    /// Find a library by name, mutably.
    pub fn library_mut(&mut self, name: &str) -> Option<&mut LibraryEntry> {
        self.libraries.iter_mut().find(|l| l.name == name)
    }

    /// Whether this is a locked descriptor: versioned, every library pinned.
    pub fn is_locked(&self) -> bool {
        self.snapshot_version.is_some() && self.libraries.iter().all(LibraryEntry::is_pinned)
    }

    /// Render with sorted keys and four-space indentation.
    pub fn to_json_string(&self) -> Result<String, DescriptorError> {
        // serde_json's Map is ordered by key, so going through Value sorts
        // every object, nested payload included.
        let value =
            serde_json::to_value(self).map_err(|e| DescriptorError::Serialize(e.to_string()))?;

        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        value
            .serialize(&mut ser)
            .map_err(|e| DescriptorError::Serialize(e.to_string()))?;
        out.push(b'\n');

        String::from_utf8(out).map_err(|e| DescriptorError::Serialize(e.to_string()))
    }

    /// Write the descriptor atomically (temp file, then rename).
    pub fn write(&self, path: &Path) -> Result<(), DescriptorError> {
        let contents = self.to_json_string()?;
        let write_err = |p: &Path| {
            let p = p.to_path_buf();
            move |e| DescriptorError::Write { path: p, source: e }
        };

        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).map_err(write_err(&temp_path))?;
        file.write_all(contents.as_bytes())
            .map_err(write_err(&temp_path))?;
        file.sync_all().map_err(write_err(&temp_path))?;
        fs::rename(&temp_path, path).map_err(write_err(path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "name": "board",
        "toolchain": "ARM_GCC",
        "libraries": [
            { "name": "core", "url": "https://example.com/core", "branch": "master", "type": "git" },
            { "name": "driver", "url": "https://example.com/driver", "branch": "dev" }
        ]
    }"#;

    #[test]
    fn keeps_opaque_keys() {
        let d = DependencyDescriptor::from_json(SAMPLE).unwrap();
        assert_eq!(d.extra.get("toolchain"), Some(&Value::from("ARM_GCC")));
        assert_eq!(
            d.libraries[0].extra.get("type"),
            Some(&Value::from("git"))
        );
        assert!(d.snapshot_version.is_none());
    }

    #[test]
    fn rejects_duplicate_names() {
        let json = r#"{ "libraries": [
            { "name": "a", "branch": "main" },
            { "name": "a", "branch": "dev" }
        ] }"#;
        let err = DependencyDescriptor::from_json(json).unwrap_err();
        assert!(matches!(err, DescriptorError::Malformed { ref message, .. } if message.contains("duplicate")));
    }

    #[test]
    fn rejects_path_like_names_and_missing_branch() {
        let traversal = r#"{ "libraries": [ { "name": "../x", "branch": "main" } ] }"#;
        assert!(DependencyDescriptor::from_json(traversal).is_err());

        let no_branch = r#"{ "libraries": [ { "name": "x" } ] }"#;
        assert!(matches!(
            DependencyDescriptor::from_json(no_branch),
            Err(DescriptorError::Malformed { .. })
        ));
    }

    #[test]
    fn read_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = DependencyDescriptor::read(&temp.path().join("target.json")).unwrap_err();
        assert!(matches!(err, DescriptorError::Missing { .. }));
        assert!(
            DependencyDescriptor::read_optional(&temp.path().join("target.json"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn written_keys_are_sorted() {
        let mut d = DependencyDescriptor::from_json(SAMPLE).unwrap();
        d.snapshot_version = Some(SnapshotVersion::new(1, 0, 0));
        let text = d.to_json_string().unwrap();

        let libraries = text.find("\"libraries\"").unwrap();
        let name = text.find("\"name\": \"board\"").unwrap();
        let snapshot = text.find("\"snapshot_version\"").unwrap();
        let toolchain = text.find("\"toolchain\"").unwrap();
        assert!(libraries < name && name < snapshot && snapshot < toolchain);
        assert!(text.contains("\n    \"libraries\""));
        assert!(text.contains("\"snapshot_version\": \"v1.0.0\""));
    }

    #[test]
    fn write_then_read_is_identical() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("target-locked.json");
        let mut d = DependencyDescriptor::from_json(SAMPLE).unwrap();
        d.library_mut("core").unwrap().pin(&Oid::new("a".repeat(40)).unwrap());
        d.library_mut("driver").unwrap().pin(&Oid::new("b".repeat(40)).unwrap());
        d.snapshot_version = Some(SnapshotVersion::new(0, 3, 1).with_pre_release("dev", 2));

        d.write(&path).unwrap();
        let loaded = DependencyDescriptor::read(&path).unwrap();

        assert_eq!(loaded, d);
        assert!(loaded.is_locked());
        let names: Vec<_> = loaded.libraries.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["core", "driver"]);
        assert!(!temp.path().join("target-locked.json.tmp").exists());
    }
}

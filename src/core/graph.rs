//! core::graph
//!
//! In-memory dependency graph of the selected target.
//!
//! # Design
//!
//! The graph is flat: one target node plus its libraries in declared order.
//! It is a read-only view derived from `build.json` and the target's
//! descriptor, rebuilt for every operation and never mutated in place.
//! Declared order is the order in which repositories are visited.
//!
//! # Example
//!
//! ```ignore
//! let store = ConfigStore::new(WorkspacePaths::new("/work"));
//! let graph = DependencyGraph::load(&store)?;
//! for library in graph.libraries() {
//!     println!("{} -> {}", library.name(), library.path.display());
//! }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::core::descriptor::{DependencyDescriptor, DescriptorError, LibraryEntry};
use crate::core::paths::WorkspacePaths;
use crate::core::store::{ConfigStore, StoreError, TargetSelection};

/// Errors materializing the graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// The root node.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetNode {
    pub name: String,
    pub url: String,
    /// Branch or revision the target was selected at.
    pub reference: String,
    pub dev: bool,
    /// Working copy.
    pub path: PathBuf,
    /// Descriptor keys other than `libraries`, forwarded to the build.
    pub payload: BTreeMap<String, Value>,
}

/// One dependency with its working copy location.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryNode {
    pub entry: LibraryEntry,
    pub path: PathBuf,
}

impl LibraryNode {
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// The branch recorded in the descriptor.
    pub fn branch(&self) -> &str {
        &self.entry.branch
    }
}

/// Target plus ordered libraries.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyGraph {
    target: TargetNode,
    libraries: Vec<LibraryNode>,
    descriptor: DependencyDescriptor,
}

impl DependencyGraph {
    /// Load the graph of the currently selected target.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotConfigured`] if no target is selected
    /// - [`DescriptorError::Missing`] if the working copy or descriptor is absent
    /// - [`DescriptorError::Malformed`] on schema violations
    pub fn load(store: &ConfigStore) -> Result<Self, GraphError> {
        let config = store.load()?;
        let descriptor = store.descriptor(&config.target.name)?;
        Ok(Self::from_parts(store.paths(), &config.target, descriptor))
    }

    /// Build a graph from an already loaded selection and descriptor.
    pub fn from_parts(
        paths: &WorkspacePaths,
        selection: &TargetSelection,
        descriptor: DependencyDescriptor,
    ) -> Self {
        let target = TargetNode {
            name: selection.name.clone(),
            url: selection.url.clone(),
            reference: selection.branch.clone(),
            dev: selection.dev,
            path: paths.repo_dir(&selection.name),
            payload: descriptor.extra.clone(),
        };

        let libraries = descriptor
            .libraries
            .iter()
            .map(|entry| LibraryNode {
                entry: entry.clone(),
                path: paths.repo_dir(&entry.name),
            })
            .collect();

        Self {
            target,
            libraries,
            descriptor,
        }
    }

    pub fn target(&self) -> &TargetNode {
        &self.target
    }

    /// Libraries in declared order.
    pub fn libraries(&self) -> &[LibraryNode] {
        &self.libraries
    }

    pub fn library(&self, name: &str) -> Option<&LibraryNode> {
        self.libraries.iter().find(|l| l.name() == name)
    }

    /// The unlocked descriptor the graph was built from.
    pub fn descriptor(&self) -> &DependencyDescriptor {
        &self.descriptor
    }
}

//! workspace
//!
//! The aggregate root: one store, its graph, and its version control.
//!
//! The graph is owned here rather than being process-global, and handed
//! explicitly to version control on commit and checkout.

use std::sync::Arc;

use tracing::{info, warn};

use crate::core::config::Config;
use crate::core::graph::AdjacencyGraph;
use crate::core::store::KeyValueStore;
use crate::core::types::{CommitId, TagName};
use crate::vcs::{VcsError, VersionControl};

/// A store, its graph and its history, opened together.
#[derive(Debug)]
pub struct Workspace {
    store: Arc<KeyValueStore>,
    graph: AdjacencyGraph,
    vcs: VersionControl,
}

impl Workspace {
    /// Open the store document and commit log named by `config`.
    ///
    /// A missing store document starts an empty store. So does one that
    /// cannot be read or parsed; the failure is logged and the next save
    /// replaces the document.
    pub fn open(config: &Config) -> Result<Self, VcsError> {
        let store_path = config.store_file();
        let store = Arc::new(KeyValueStore::new(&store_path));
        match store.load() {
            Ok(true) => {
                info!(path = %store_path.display(), entries = store.size(), "loaded store")
            }
            Ok(false) => info!(path = %store_path.display(), "creating new store"),
            Err(e) => warn!(error = %e, "starting with an empty store"),
        }

        let vcs = VersionControl::open(Arc::clone(&store), config.paths(), config.author())?;
        Ok(Self {
            store,
            graph: AdjacencyGraph::new(),
            vcs,
        })
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<KeyValueStore> {
        &self.store
    }

    /// The graph.
    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    /// The graph, for edits.
    pub fn graph_mut(&mut self) -> &mut AdjacencyGraph {
        &mut self.graph
    }

    /// Version control.
    pub fn vcs(&self) -> &VersionControl {
        &self.vcs
    }

    /// Version control, for branch, staging and merge operations.
    pub fn vcs_mut(&mut self) -> &mut VersionControl {
        &mut self.vcs
    }

    /// Commit the store and graph on the current branch.
    pub fn commit(&mut self, message: &str) -> Result<CommitId, VcsError> {
        self.vcs.commit(message, &self.graph)
    }

    /// Restore the store and graph to `version`.
    pub fn checkout(&mut self, version: usize) -> Result<(), VcsError> {
        self.vcs.checkout(version, &mut self.graph)
    }

    /// Alias of [`Self::checkout`].
    pub fn rollback(&mut self, version: usize) -> Result<(), VcsError> {
        self.vcs.rollback(version, &mut self.graph)
    }

    /// Restore the store and graph to the commit tagged `name`.
    pub fn checkout_tag(&mut self, name: &TagName) -> Result<CommitId, VcsError> {
        self.vcs.checkout_tag(name, &mut self.graph)
    }
}

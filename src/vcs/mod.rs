//! vcs
//!
//! Git-like versioning over the key-value store.
//!
//! # Architecture
//!
//! [`VersionControl`] keeps:
//! - the commit sequence, where each commit's id is its position
//! - branches, each an ordered list of commit ids (created by copying the
//!   current branch's list)
//! - a per-branch staging list of keys already written to the live store
//! - the conflict set left behind by merges
//!
//! Commits snapshot the whole store plus the caller's graph. Checkout writes
//! a snapshot back wholesale. Merge overlays snapshots without consulting
//! ancestry (see [`merge`]).
//!
//! # State
//!
//! The conflict set drives a two-state machine: [`MergeState::Clean`] and
//! [`MergeState::Conflicted`]. A merge with any disagreement moves to
//! Conflicted; resolving the last conflict moves back.
//!
//! # Persistence
//!
//! The full commit log is rewritten after every commit (see [`log_file`]).
//! Branch lists are rebuilt on load from each commit's branch name. Tags
//! live in their own files (see [`tags`]).

pub mod commit;
pub mod log_file;
pub mod merge;
pub mod tags;

pub use commit::{Commit, CommitLogEntry};
pub use merge::{detect_conflicts, MergeOutcome, MergeState};

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::graph::AdjacencyGraph;
use crate::core::lock::LockError;
use crate::core::paths::DataPaths;
use crate::core::store::{KeyValueStore, StoreError};
use crate::core::types::{BranchName, CommitId, TagName, UtcTimestamp};

/// Errors from version-control operations.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("version {version} is out of range ({count} commits)")]
    OutOfRange { version: usize, count: usize },

    #[error("no commits yet")]
    NoCommits,

    #[error("branch '{0}' does not exist")]
    UnknownBranch(BranchName),

    #[error("branch '{0}' already exists")]
    BranchExists(BranchName),

    #[error("tag '{0}' does not exist")]
    UnknownTag(TagName),

    #[error("tag '{name}' is corrupt: {message}")]
    MalformedTag { name: TagName, message: String },

    #[error("malformed commit log '{path}': {message}")]
    MalformedLog { path: PathBuf, message: String },

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Commit history, branches, staging and conflicts for one store.
#[derive(Debug)]
pub struct VersionControl {
    store: Arc<KeyValueStore>,
    paths: DataPaths,
    author: String,
    current_branch: BranchName,
    commits: Vec<Commit>,
    branches: BTreeMap<BranchName, Vec<CommitId>>,
    staging: BTreeMap<BranchName, Vec<String>>,
    conflicts: BTreeMap<String, String>,
    /// Ids merged into each branch since its last commit
    pending_merges: BTreeMap<BranchName, BTreeSet<CommitId>>,
}

impl VersionControl {
    /// Open version control over `store`, reloading the commit log.
    ///
    /// Creates the data directory. A malformed commit log is logged and
    /// replaced by an empty history.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the log
    /// exists but cannot be read.
    pub fn open(
        store: Arc<KeyValueStore>,
        paths: DataPaths,
        author: impl Into<String>,
    ) -> Result<Self, VcsError> {
        paths.ensure_data_dir()?;

        let mut vcs = Self {
            store,
            paths,
            author: author.into(),
            current_branch: BranchName::main(),
            commits: Vec::new(),
            branches: BTreeMap::new(),
            staging: BTreeMap::new(),
            conflicts: BTreeMap::new(),
            pending_merges: BTreeMap::new(),
        };
        vcs.branches.insert(BranchName::main(), Vec::new());

        let log_path = vcs.paths.commit_log_path();
        match log_file::read_commit_log(&log_path) {
            Ok(commits) => {
                for commit in &commits {
                    vcs.branches
                        .entry(commit.branch_name.clone())
                        .or_default()
                        .push(commit.id);
                }
                vcs.commits = commits;
                debug!(count = vcs.commits.len(), "loaded commit log");
            }
            Err(e @ VcsError::MalformedLog { .. }) => {
                warn!(error = %e, "starting with an empty commit history");
            }
            Err(e) => return Err(e),
        }

        Ok(vcs)
    }

    /// The store this history tracks.
    pub fn store(&self) -> &Arc<KeyValueStore> {
        &self.store
    }

    // =========================================================================
    // Staging
    // =========================================================================

    /// Write `key = value` to the live store and stage `key` on the current branch.
    pub fn stage_change(&mut self, key: &str, value: &str) {
        self.store.insert(key, value);
        let staged = self.staging.entry(self.current_branch.clone()).or_default();
        if !staged.iter().any(|k| k == key) {
            staged.push(key.to_string());
        }
    }

    /// Forget a staged key. The live value is not reverted.
    ///
    /// Returns whether the key was staged.
    pub fn unstage_change(&mut self, key: &str) -> bool {
        let Some(staged) = self.staging.get_mut(&self.current_branch) else {
            return false;
        };
        let before = staged.len();
        staged.retain(|k| k != key);
        staged.len() != before
    }

    /// Keys staged on the current branch, in staging order.
    pub fn staged_changes(&self) -> &[String] {
        self.staging
            .get(&self.current_branch)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    // =========================================================================
    // Commits
    // =========================================================================

    /// Snapshot the store and `graph` as a new commit on the current branch.
    ///
    /// Staged keys stay staged. If the log cannot be written the commit is
    /// rolled back in memory and the error returned.
    pub fn commit(&mut self, message: &str, graph: &AdjacencyGraph) -> Result<CommitId, VcsError> {
        let id = CommitId::new(self.commits.len());
        let branch = self.current_branch.clone();
        let parent_id = self.branches.get(&branch).and_then(|ids| ids.last().copied());
        let merged_from = self.pending_merges.remove(&branch).unwrap_or_default();

        self.commits.push(Commit {
            id,
            message: message.to_string(),
            branch_name: branch.clone(),
            author: self.author.clone(),
            timestamp: UtcTimestamp::now(),
            snapshot: self.store.snapshot(),
            parent_id,
            merged_from,
            graph: graph.clone(),
        });
        self.branches.entry(branch.clone()).or_default().push(id);

        if let Err(e) = log_file::write_commit_log(&self.paths.commit_log_path(), &self.commits) {
            if let Some(ids) = self.branches.get_mut(&branch) {
                ids.pop();
            }
            if let Some(commit) = self.commits.pop() {
                if !commit.merged_from.is_empty() {
                    self.pending_merges.insert(branch, commit.merged_from);
                }
            }
            return Err(e);
        }

        info!(id = %id, branch = %self.current_branch, "committed");
        Ok(id)
    }

    /// Check out commit `version`, then save the store.
    ///
    /// The store is first reset against its own document, dropping unsaved
    /// edits, and the snapshot is written over it. Saved keys the snapshot
    /// does not mention survive. The graph is replaced outright.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::OutOfRange`] if no such commit exists.
    pub fn checkout(&self, version: usize, graph: &mut AdjacencyGraph) -> Result<(), VcsError> {
        let commit = self.commit_at(version)?;
        if let Err(e) = self.store.reset(self.store.file_path()) {
            warn!(error = %e, "store document unreadable, checking out over an empty store");
        }
        self.store.batch_insert(&commit.snapshot);
        *graph = commit.graph.clone();
        self.store.save()?;
        info!(version, "checked out");
        Ok(())
    }

    /// Alias of [`Self::checkout`].
    pub fn rollback(&self, version: usize, graph: &mut AdjacencyGraph) -> Result<(), VcsError> {
        self.checkout(version, graph)
    }

    fn commit_at(&self, version: usize) -> Result<&Commit, VcsError> {
        self.commits.get(version).ok_or(VcsError::OutOfRange {
            version,
            count: self.commits.len(),
        })
    }

    /// Look up a commit by id.
    pub fn commit_by_id(&self, id: CommitId) -> Option<&Commit> {
        self.commits.get(id.index())
    }

    /// All commits in id order.
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Number of commits.
    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    /// Ids of commits whose message contains `term`.
    pub fn search_commits(&self, term: &str) -> Vec<CommitId> {
        self.commits
            .iter()
            .filter(|c| c.message.contains(term))
            .map(|c| c.id)
            .collect()
    }

    /// Summaries of the newest commits first, at most `limit` of them.
    pub fn commit_logs(&self, limit: Option<usize>) -> Vec<CommitLogEntry> {
        self.commits
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .map(Commit::log_entry)
            .collect()
    }

    /// Human-readable commit history, newest first.
    pub fn log(&self, limit: Option<usize>) -> String {
        let entries = self.commit_logs(limit);
        if entries.is_empty() {
            return "No commit history available.".to_string();
        }

        let mut out = String::from("===== Commit History =====");
        for entry in entries {
            out.push('\n');
            out.push_str(&entry.to_string());
        }
        out
    }

    /// Summaries of the current branch's commits, in branch order.
    pub fn branch_history(&self) -> Vec<CommitLogEntry> {
        self.branches
            .get(&self.current_branch)
            .into_iter()
            .flatten()
            .filter_map(|id| self.commit_by_id(*id))
            .map(Commit::log_entry)
            .collect()
    }

    // =========================================================================
    // Branches
    // =========================================================================

    /// Create `name` as a copy of the current branch's commit list.
    pub fn create_branch(&mut self, name: BranchName) -> Result<(), VcsError> {
        if self.branches.contains_key(&name) {
            return Err(VcsError::BranchExists(name));
        }
        let ids = self
            .branches
            .get(&self.current_branch)
            .cloned()
            .unwrap_or_default();
        debug!(branch = %name, from = %self.current_branch, "created branch");
        self.branches.insert(name, ids);
        Ok(())
    }

    /// Make `name` the current branch. The store is not touched.
    pub fn switch_branch(&mut self, name: BranchName) -> Result<(), VcsError> {
        if !self.branches.contains_key(&name) {
            return Err(VcsError::UnknownBranch(name));
        }
        self.current_branch = name;
        Ok(())
    }

    /// Branch names, sorted.
    pub fn list_branches(&self) -> Vec<BranchName> {
        self.branches.keys().cloned().collect()
    }

    /// The current branch.
    pub fn current_branch(&self) -> &BranchName {
        &self.current_branch
    }

    /// Commit ids on `name`, if it exists.
    pub fn branch_commits(&self, name: &BranchName) -> Option<&[CommitId]> {
        self.branches.get(name).map(Vec::as_slice)
    }

    // =========================================================================
    // Merge and conflicts
    // =========================================================================

    /// Overlay every snapshot on `name` onto the live store, in branch order.
    ///
    /// Disagreeing keys join the conflict set and keep their live value.
    /// Conflicts do not make the merge fail.
    ///
    /// # Errors
    ///
    /// Fails before touching the store if the branch is unknown or lists a
    /// commit that does not exist.
    pub fn merge(&mut self, name: &BranchName) -> Result<MergeOutcome, VcsError> {
        let ids = self
            .branches
            .get(name)
            .ok_or_else(|| VcsError::UnknownBranch(name.clone()))?;

        for id in ids {
            self.commit_at(id.index())?;
        }

        let mut outcome = MergeOutcome::default();
        for id in ids {
            let commit = &self.commits[id.index()];
            merge::overlay_snapshot(&self.store, &commit.snapshot, &mut self.conflicts, &mut outcome);
        }

        self.pending_merges
            .entry(self.current_branch.clone())
            .or_default()
            .extend(ids.iter().copied());

        info!(
            from = %name,
            into = %self.current_branch,
            applied = outcome.applied,
            conflicts = outcome.conflicts.len(),
            "merged"
        );
        Ok(outcome)
    }

    /// Pending conflicts: key to the incoming value that disagreed.
    pub fn conflicts(&self) -> &BTreeMap<String, String> {
        &self.conflicts
    }

    /// Whether conflicts are pending.
    pub fn state(&self) -> MergeState {
        if self.conflicts.is_empty() {
            MergeState::Clean
        } else {
            MergeState::Conflicted
        }
    }

    /// Settle a conflict on `key` by writing `value` and saving the store.
    ///
    /// Returns `Ok(false)` if `key` has no pending conflict.
    pub fn resolve_conflict(&mut self, key: &str, value: &str) -> Result<bool, VcsError> {
        if self.conflicts.remove(key).is_none() {
            return Ok(false);
        }
        self.store.insert(key, value);
        self.store.save()?;
        debug!(key, remaining = self.conflicts.len(), "resolved conflict");
        Ok(true)
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// Bind `name` to `version`, or to the newest commit if `None`.
    pub fn tag(&self, name: &TagName, version: Option<usize>) -> Result<CommitId, VcsError> {
        let id = match version {
            Some(version) => self.commit_at(version)?.id,
            None => self.commits.last().ok_or(VcsError::NoCommits)?.id,
        };
        tags::write_tag(&self.paths, name, id)?;
        debug!(tag = %name, id = %id, "tagged");
        Ok(id)
    }

    /// Check out the commit bound to `name`.
    pub fn checkout_tag(
        &self,
        name: &TagName,
        graph: &mut AdjacencyGraph,
    ) -> Result<CommitId, VcsError> {
        let id = tags::read_tag(&self.paths, name)?;
        self.checkout(id.index(), graph)?;
        Ok(id)
    }

    /// Every tag with its commit id, sorted by name.
    pub fn list_tags(&self) -> Result<Vec<(TagName, CommitId)>, VcsError> {
        tags::list_tags(&self.paths)
    }

    // =========================================================================
    // Author
    // =========================================================================

    /// Set the author recorded on future commits.
    pub fn set_author(&mut self, name: impl Into<String>) {
        self.author = name.into();
    }

    /// The author recorded on future commits.
    pub fn author(&self) -> &str {
        &self.author
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        vcs: VersionControl,
        graph: AdjacencyGraph,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let paths = DataPaths::new(temp.path().join("data"));
        let store = Arc::new(KeyValueStore::new(paths.default_store_path()));
        let vcs = VersionControl::open(store, paths, "tester").unwrap();
        Fixture {
            _temp: temp,
            vcs,
            graph: AdjacencyGraph::new(),
        }
    }

    fn branch(name: &str) -> BranchName {
        BranchName::new(name).unwrap()
    }

    #[test]
    fn fresh_history() {
        let f = fixture();
        assert_eq!(f.vcs.commit_count(), 0);
        assert_eq!(f.vcs.current_branch(), &BranchName::main());
        assert_eq!(f.vcs.list_branches(), vec![BranchName::main()]);
        assert_eq!(f.vcs.state(), MergeState::Clean);
        assert_eq!(f.vcs.log(None), "No commit history available.");
    }

    #[test]
    fn commit_ids_are_positions() {
        let mut f = fixture();
        for i in 0..3 {
            let id = f.vcs.commit(&format!("c{}", i), &f.graph).unwrap();
            assert_eq!(id.index(), i);
        }
        assert!(f
            .vcs
            .commits()
            .iter()
            .enumerate()
            .all(|(i, c)| c.id.index() == i));
    }

    #[test]
    fn commit_records_parent() {
        let mut f = fixture();
        let first = f.vcs.commit("one", &f.graph).unwrap();
        let second = f.vcs.commit("two", &f.graph).unwrap();
        assert_eq!(f.vcs.commits()[0].parent_id, None);
        assert_eq!(f.vcs.commit_by_id(second).unwrap().parent_id, Some(first));
    }

    #[test]
    fn staging_is_deduplicated_and_survives_commit() {
        let mut f = fixture();
        f.vcs.stage_change("a", "1");
        f.vcs.stage_change("a", "2");
        f.vcs.stage_change("b", "3");
        assert_eq!(f.vcs.staged_changes(), ["a", "b"]);
        assert_eq!(f.vcs.store().get("a").as_deref(), Some("2"));

        f.vcs.commit("staged", &f.graph).unwrap();
        assert_eq!(f.vcs.staged_changes(), ["a", "b"]);

        assert!(f.vcs.unstage_change("a"));
        assert!(!f.vcs.unstage_change("a"));
        assert_eq!(f.vcs.store().get("a").as_deref(), Some("2"));
    }

    #[test]
    fn staging_is_per_branch() {
        let mut f = fixture();
        f.vcs.stage_change("a", "1");
        f.vcs.create_branch(branch("feature")).unwrap();
        f.vcs.switch_branch(branch("feature")).unwrap();
        assert!(f.vcs.staged_changes().is_empty());
        assert!(!f.vcs.unstage_change("a"));
    }

    #[test]
    fn checkout_drops_unsaved_edits_and_restores_graph() {
        let mut f = fixture();
        f.vcs.store().insert("user:1", "alice");
        f.graph.insert_edge("a", "b", 1);
        f.vcs.commit("first", &f.graph).unwrap();

        f.vcs.store().insert("user:1", "bob");
        f.vcs.store().insert("extra", "x");
        f.graph.insert_node("c");

        f.vcs.checkout(0, &mut f.graph).unwrap();
        assert_eq!(f.vcs.store().get("user:1").as_deref(), Some("alice"));
        assert_eq!(f.vcs.store().get("extra"), None);
        assert!(!f.graph.contains_node("c"));
        assert!(f.vcs.store().file_path().exists());
    }

    #[test]
    fn checkout_keeps_saved_keys_outside_snapshot() {
        let mut f = fixture();
        f.vcs.store().insert("a", "1");
        f.vcs.store().save().unwrap();
        f.vcs.commit("c0", &f.graph).unwrap();

        f.vcs.store().insert("a", "9");
        f.vcs.store().insert("b", "2");
        f.vcs.store().save().unwrap();
        f.vcs.store().insert("unsaved", "x");

        f.vcs.checkout(0, &mut f.graph).unwrap();
        assert_eq!(f.vcs.store().get("a").as_deref(), Some("1"));
        assert_eq!(f.vcs.store().get("b").as_deref(), Some("2"));
        assert_eq!(f.vcs.store().get("unsaved"), None);
    }

    #[test]
    fn checkout_over_malformed_document() {
        let mut f = fixture();
        f.vcs.store().insert("a", "1");
        f.vcs.commit("c0", &f.graph).unwrap();
        std::fs::write(f.vcs.store().file_path(), "{not json").unwrap();

        f.vcs.checkout(0, &mut f.graph).unwrap();
        assert_eq!(f.vcs.store().snapshot().len(), 1);
        assert_eq!(f.vcs.store().get("a").as_deref(), Some("1"));
    }

    #[test]
    fn checkout_out_of_range() {
        let mut f = fixture();
        assert!(matches!(
            f.vcs.checkout(0, &mut f.graph),
            Err(VcsError::OutOfRange { version: 0, count: 0 })
        ));
        f.vcs.commit("only", &f.graph).unwrap();
        assert!(f.vcs.rollback(1, &mut f.graph).is_err());
        assert!(f.vcs.rollback(0, &mut f.graph).is_ok());
    }

    #[test]
    fn branch_lifecycle() {
        let mut f = fixture();
        f.vcs.commit("base", &f.graph).unwrap();

        f.vcs.create_branch(branch("feature")).unwrap();
        assert!(matches!(
            f.vcs.create_branch(branch("feature")),
            Err(VcsError::BranchExists(_))
        ));
        assert!(matches!(
            f.vcs.switch_branch(branch("ghost")),
            Err(VcsError::UnknownBranch(_))
        ));

        f.vcs.switch_branch(branch("feature")).unwrap();
        f.vcs.commit("on feature", &f.graph).unwrap();

        let feature = f.vcs.branch_commits(&branch("feature")).unwrap();
        assert_eq!(feature, [CommitId::new(0), CommitId::new(1)]);
        let main = f.vcs.branch_commits(&BranchName::main()).unwrap();
        assert_eq!(main, [CommitId::new(0)]);

        let history: Vec<_> = f.vcs.branch_history().into_iter().map(|e| e.message).collect();
        assert_eq!(history, vec!["base", "on feature"]);
    }

    #[test]
    fn merge_unknown_branch_is_error() {
        let mut f = fixture();
        assert!(matches!(
            f.vcs.merge(&branch("ghost")),
            Err(VcsError::UnknownBranch(_))
        ));
    }

    #[test]
    fn merge_conflict_and_resolve() {
        let mut f = fixture();
        f.vcs.store().insert("user:1", "alice");
        f.vcs.commit("alice", &f.graph).unwrap();

        f.vcs.create_branch(branch("feature")).unwrap();
        f.vcs.switch_branch(branch("feature")).unwrap();
        f.vcs.store().insert("user:1", "bob");
        f.vcs.commit("bob", &f.graph).unwrap();

        f.vcs.switch_branch(BranchName::main()).unwrap();
        f.vcs.checkout(0, &mut f.graph).unwrap();

        let outcome = f.vcs.merge(&branch("feature")).unwrap();
        assert_eq!(outcome.conflicts, vec!["user:1"]);
        assert_eq!(f.vcs.state(), MergeState::Conflicted);
        assert_eq!(f.vcs.conflicts()["user:1"], "bob");
        assert_eq!(f.vcs.store().get("user:1").as_deref(), Some("alice"));

        assert!(!f.vcs.resolve_conflict("other", "x").unwrap());
        assert!(f.vcs.resolve_conflict("user:1", "carol").unwrap());
        assert_eq!(f.vcs.store().get("user:1").as_deref(), Some("carol"));
        assert_eq!(f.vcs.state(), MergeState::Clean);
    }

    #[test]
    fn merge_rejects_dangling_commit_id_before_touching_store() {
        let mut f = fixture();
        f.vcs.store().insert("k", "v");
        f.vcs.commit("base", &f.graph).unwrap();
        f.vcs.create_branch(branch("broken")).unwrap();
        f.vcs
            .branches
            .get_mut(&branch("broken"))
            .unwrap()
            .push(CommitId::new(7));
        f.vcs.store().insert("k", "live");

        assert!(matches!(
            f.vcs.merge(&branch("broken")),
            Err(VcsError::OutOfRange { version: 7, count: 1 })
        ));
        assert_eq!(f.vcs.store().get("k").as_deref(), Some("live"));
        assert!(f.vcs.conflicts().is_empty());
    }

    #[test]
    fn conflicts_accumulate_across_merges() {
        let mut f = fixture();
        f.vcs.store().insert("user:1", "alice");
        f.vcs.store().insert("user:2", "carl");
        f.vcs.commit("base", &f.graph).unwrap();

        f.vcs.create_branch(branch("one")).unwrap();
        f.vcs.create_branch(branch("two")).unwrap();

        f.vcs.switch_branch(branch("one")).unwrap();
        f.vcs.store().insert("user:1", "bob");
        f.vcs.commit("bob", &f.graph).unwrap();

        f.vcs.switch_branch(branch("two")).unwrap();
        f.vcs.checkout(0, &mut f.graph).unwrap();
        f.vcs.store().insert("user:2", "dan");
        f.vcs.commit("dan", &f.graph).unwrap();

        f.vcs.switch_branch(BranchName::main()).unwrap();
        f.vcs.checkout(0, &mut f.graph).unwrap();

        let first = f.vcs.merge(&branch("one")).unwrap();
        assert_eq!(first.conflicts, vec!["user:1"]);
        let second = f.vcs.merge(&branch("two")).unwrap();
        assert_eq!(second.conflicts, vec!["user:2"]);

        let pending: Vec<_> = f.vcs.conflicts().iter().collect();
        assert_eq!(
            pending,
            vec![
                (&"user:1".to_string(), &"bob".to_string()),
                (&"user:2".to_string(), &"dan".to_string()),
            ]
        );
        assert!(f.vcs.resolve_conflict("user:2", "erin").unwrap());
        assert_eq!(f.vcs.state(), MergeState::Conflicted);
    }

    #[test]
    fn merge_records_merged_from_on_next_commit() {
        let mut f = fixture();
        f.vcs.commit("base", &f.graph).unwrap();
        f.vcs.create_branch(branch("feature")).unwrap();
        f.vcs.switch_branch(branch("feature")).unwrap();
        f.vcs.store().insert("k", "v");
        f.vcs.commit("feature work", &f.graph).unwrap();
        f.vcs.switch_branch(BranchName::main()).unwrap();

        f.vcs.merge(&branch("feature")).unwrap();
        let id = f.vcs.commit("merge", &f.graph).unwrap();

        let merged: Vec<_> = f.vcs.commit_by_id(id).unwrap().merged_from.iter().copied().collect();
        assert_eq!(merged, vec![CommitId::new(0), CommitId::new(1)]);

        let next = f.vcs.commit("after", &f.graph).unwrap();
        assert!(f.vcs.commit_by_id(next).unwrap().merged_from.is_empty());
    }

    #[test]
    fn tags() {
        let mut f = fixture();
        let name = TagName::new("v1").unwrap();
        assert!(matches!(f.vcs.tag(&name, None), Err(VcsError::NoCommits)));

        f.vcs.store().insert("k", "old");
        f.vcs.commit("old", &f.graph).unwrap();
        f.vcs.store().insert("k", "new");
        f.vcs.commit("new", &f.graph).unwrap();

        assert_eq!(f.vcs.tag(&name, Some(0)).unwrap(), CommitId::new(0));
        assert!(matches!(
            f.vcs.tag(&name, Some(9)),
            Err(VcsError::OutOfRange { .. })
        ));
        let latest = TagName::new("latest").unwrap();
        assert_eq!(f.vcs.tag(&latest, None).unwrap(), CommitId::new(1));

        f.vcs.checkout_tag(&name, &mut f.graph).unwrap();
        assert_eq!(f.vcs.store().get("k").as_deref(), Some("old"));

        let listed: Vec<_> = f.vcs.list_tags().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(listed, vec![latest, name]);
    }

    #[test]
    fn search_and_logs() {
        let mut f = fixture();
        f.vcs.set_author("alice");
        f.vcs.commit("add users", &f.graph).unwrap();
        f.vcs.set_author("bob");
        f.vcs.commit("fix config", &f.graph).unwrap();
        f.vcs.commit("more users", &f.graph).unwrap();

        assert_eq!(
            f.vcs.search_commits("users"),
            vec![CommitId::new(0), CommitId::new(2)]
        );
        assert!(f.vcs.search_commits("nothing").is_empty());

        let logs = f.vcs.commit_logs(Some(2));
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].version, CommitId::new(2));
        assert_eq!(logs[1].author, "bob");
        assert_eq!(f.vcs.commit_logs(None).len(), 3);

        let rendered = f.vcs.log(Some(1));
        assert!(rendered.starts_with("===== Commit History ====="));
        assert!(rendered.contains("Version: 2 | Author: bob"));
        assert!(rendered.contains("Message: more users"));
    }

    #[test]
    fn reopen_rebuilds_branches_and_next_id() {
        let temp = TempDir::new().unwrap();
        let paths = DataPaths::new(temp.path());
        let graph = AdjacencyGraph::new();

        {
            let store = Arc::new(KeyValueStore::new(paths.default_store_path()));
            let mut vcs = VersionControl::open(store, paths.clone(), "user").unwrap();
            vcs.commit("one", &graph).unwrap();
            vcs.create_branch(branch("feature")).unwrap();
            vcs.switch_branch(branch("feature")).unwrap();
            vcs.commit("two", &graph).unwrap();
        }

        let store = Arc::new(KeyValueStore::new(paths.default_store_path()));
        let mut vcs = VersionControl::open(store, paths, "user").unwrap();
        assert_eq!(vcs.commit_count(), 2);
        assert_eq!(
            vcs.branch_commits(&BranchName::main()).unwrap(),
            [CommitId::new(0)]
        );
        assert_eq!(
            vcs.branch_commits(&branch("feature")).unwrap(),
            [CommitId::new(1)]
        );
        assert_eq!(vcs.commit("three", &graph).unwrap(), CommitId::new(2));
    }

    #[test]
    fn malformed_log_starts_empty() {
        let temp = TempDir::new().unwrap();
        let paths = DataPaths::new(temp.path());
        std::fs::write(paths.commit_log_path(), "not json").unwrap();

        let store = Arc::new(KeyValueStore::new(paths.default_store_path()));
        let vcs = VersionControl::open(store, paths, "user").unwrap();
        assert_eq!(vcs.commit_count(), 0);
        assert_eq!(vcs.list_branches(), vec![BranchName::main()]);
    }
}

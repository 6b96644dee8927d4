//! vcs::commit
//!
//! Commit records and their log rendering.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::graph::AdjacencyGraph;
use crate::core::store::Mapping;
use crate::core::types::{BranchName, CommitId, UtcTimestamp};

/// An immutable snapshot of the store and graph.
///
/// Serialized in the commit log with camelCase field names. The ancestry
/// fields and the graph are optional on read so older logs still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Sequential id, equal to the commit's position in the log
    pub id: CommitId,
    pub message: String,
    /// Branch that was current when the commit was made
    pub branch_name: BranchName,
    pub author: String,
    /// Persisted as integer epoch seconds
    pub timestamp: UtcTimestamp,
    /// Full copy of the key-value mapping
    pub snapshot: Mapping,

    /// Last commit on the branch before this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommitId>,

    /// Commits merged into the branch since its previous commit
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub merged_from: BTreeSet<CommitId>,

    /// Full copy of the adjacency graph
    #[serde(default, skip_serializing_if = "AdjacencyGraph::is_empty")]
    pub graph: AdjacencyGraph,
}

impl Commit {
    /// Summary line used by `log`.
    pub fn log_entry(&self) -> CommitLogEntry {
        CommitLogEntry {
            version: self.id,
            author: self.author.clone(),
            message: self.message.clone(),
            date: self.timestamp.format_local(),
        }
    }
}

/// A rendered commit summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitLogEntry {
    pub version: CommitId,
    pub author: String,
    pub message: String,
    /// Local time, `%Y-%m-%d %H:%M:%S`
    pub date: String,
}

impl fmt::Display for CommitLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Version: {} | Author: {} | Date: {}",
            self.version, self.author, self.date
        )?;
        writeln!(f, "Message: {}", self.message)?;
        write!(f, "--------------------------")
    }
}

//! Verdant - an embeddable key-value store with Git-like versioning
//!
//! Verdant keeps a string-to-string mapping fully in memory, accelerates
//! prefix lookups with B-Tree indexes over keys and values, and records
//! whole-store snapshots as commits organized into named branches.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, the B-Tree index, the store, the graph, config
//! - [`vcs`] - Commits, branches, staging, merge conflicts, tags
//! - [`workspace`] - Aggregate root tying the store, graph and history together
//! - [`relay`] - One-shot TCP relay that forwards commit messages
//! - [`cli`] - Command-line interface and interactive shell
//! - [`ui`] - User-facing output helpers
//!
//! # Correctness Invariants
//!
//! 1. A commit's id always equals its position in the commit sequence
//! 2. Every live key is present in the key index, every live value in the value index
//! 3. Commits are never mutated or deleted
//! 4. Merge conflicts are never applied silently; they wait for explicit resolution

pub mod cli;
pub mod core;
pub mod relay;
pub mod ui;
pub mod vcs;
pub mod workspace;

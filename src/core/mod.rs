//! core
//!
//! Core domain types, indexes, and storage for Verdant.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, TagName, CommitId, UtcTimestamp
//! - [`index`] - B-Tree ordered index with prefix search
//! - [`store`] - The locked key-value store and its document format
//! - [`graph`] - Adjacency-list graph captured alongside each snapshot
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for on-disk data
//! - [`lock`] - Exclusive file lock around persistence writes
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid names from reaching the filesystem
//! - Persistence failures are reported, never fatal
//! - All in-memory structures can be rebuilt from their persisted documents

pub mod config;
pub mod graph;
pub mod index;
pub mod lock;
pub mod paths;
pub mod store;
pub mod types;

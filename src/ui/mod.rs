//! ui
//!
//! User interaction utilities.
//!
//! All user-facing text goes through [`output`] so quiet mode is honored in
//! one place. Diagnostics go through `tracing` instead.

pub mod output;

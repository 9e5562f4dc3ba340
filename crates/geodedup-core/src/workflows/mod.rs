//! # Workflows Module
//!
//! High-level entry points that drive a [`Session`](crate::engine::session::Session)
//! over many calculation directories at once.
//!
//! ## Overview
//!
//! The engine decides one candidate at a time. Workflows add what a command-line run
//! needs around that: reading ahead in parallel, tolerating per-candidate failures,
//! reporting progress, and deciding when to commit.
//!
//! ## Architecture
//!
//! - **Batch Deduplication** ([`batch`]) - Prefetch, sequential resolution, one commit,
//!   and a per-candidate report that can be written as CSV.
//! - **Registry Maintenance** ([`maintenance`]) - Unconditional imports of finished
//!   calculations and offline merging of entries that turn out to be duplicates.

pub mod batch;
pub mod maintenance;

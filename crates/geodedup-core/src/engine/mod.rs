//! # Engine Module
//!
//! The stateful decision layer of geodedup.
//!
//! ## Overview
//!
//! A processing session owns one [`cache::FileCache`] and one [`registry::Registry`].
//! The registry reads candidate and entry files through the cache, decides for every
//! candidate whether it duplicates an existing canonical entry, and stages the
//! resulting writes and symlinks. Nothing touches the disk until the session commits.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Registry root, duplicate threshold, header rules
//! - **Layout** ([`layout`]) - Where candidate and entry files live, artifact suffixes
//! - **Staging** ([`cache`]) - Deferred reads, writes, copies and symlinks
//! - **Decisions** ([`registry`]) - Bucketing, filtering, ranking, insert-versus-alias
//! - **Sessions** ([`session`]) - The unit of work tying a cache to a registry
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Registry error kinds

pub mod cache;
pub mod config;
pub mod error;
pub mod layout;
pub mod progress;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

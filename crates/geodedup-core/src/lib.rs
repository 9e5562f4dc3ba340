//! # geodedup Core Library
//!
//! Structural deduplication and artifact caching for computed molecular geometries.
//! Given a freshly produced structure and the header of the calculation that will be
//! run on it, the library decides whether an equivalent calculation already exists in
//! an on-disk registry and either registers the candidate as a new canonical entry or
//! aliases it to the existing one through symlinks.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Geometry`, `Fragmentation`,
//!   `Correspondence`), file parsers for `.xyz` geometries and calculation headers, and
//!   the permutation-invariant distance-matrix matcher.
//!
//! - **[`engine`]: The Decision Core.** The staged [`engine::cache::FileCache`], the
//!   registry configuration, and the [`engine::registry::Registry`] that buckets,
//!   filters, ranks and finally decides insert-versus-alias for a candidate.
//!
//! - **[`workflows`]: The Public API.** Batch processing of many candidates with
//!   parallel prefetch, plus offline maintenance passes (bulk import and duplicate
//!   merging).

pub mod core;
pub mod engine;
pub mod workflows;

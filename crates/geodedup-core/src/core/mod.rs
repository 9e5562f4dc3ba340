//! # Core Module
//!
//! Stateless building blocks shared by the registry engine.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, geometries, element signatures,
//!   declared fragmentations and atom correspondences
//! - **File I/O** ([`io`]) - The `.xyz` geometry format and calculation header parsing
//! - **Structural Matching** ([`matching`]) - Distance-matrix matching with optimal
//!   assignment and fragmentation comparison under a correspondence
//! - **Utilities** ([`utils`]) - Element tables, distance matrices and the assignment solver

pub mod io;
pub mod matching;
pub mod models;
pub mod utils;

//! # Core Models Module
//!
//! Plain data structures describing what the registry compares.
//!
//! - [`atom`] - A single element symbol with a Cartesian position
//! - [`geometry`] - An ordered atom list and its element-multiset [`geometry::ElementSignature`]
//! - [`fragmentation`] - Declared atom partitions and their canonical form
//! - [`correspondence`] - Atom index bijections produced by the matcher

pub mod atom;
pub mod correspondence;
pub mod fragmentation;
pub mod geometry;

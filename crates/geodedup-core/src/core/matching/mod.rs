//! # Matching Module
//!
//! Decides whether two geometries describe the same structure, independent of atom
//! numbering and rigid-body motion.
//!
//! - [`matcher`] - The distance-matrix matcher: per-element optimal assignment of atom
//!   distance profiles followed by a distance-matrix RMSD under that assignment.
//! - [`fragments`] - Canonicalization and comparison of declared fragmentations,
//!   re-expressed through the correspondence the matcher produced for a specific pair.

pub mod fragments;
pub mod matcher;

use crate::core::utils::assignment::AssignmentError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    #[error("Assignment failed: {0}")]
    Assignment(#[from] AssignmentError),

    #[error("Fragment index {index} is out of range for a geometry with {atoms} atoms")]
    FragmentIndexOutOfRange { index: usize, atoms: usize },

    #[error("Internal matching error: {0}")]
    Internal(String),
}

use super::MatchError;
use crate::core::models::correspondence::Correspondence;
use crate::core::models::geometry::Geometry;
use crate::core::utils::{assignment, geometry};
use nalgebra::DMatrix;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Distance reported for geometries whose element multisets differ.
pub const INCOMPATIBLE_DISTANCE: f64 = 100.0;

/// How an atom's row of the distance matrix is turned into a comparable profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileMode {
    /// The raw row, in the file's atom order. Only meaningful when both geometries
    /// list their atoms in the same order.
    Positional,
    /// The row sorted ascending, which does not depend on atom numbering.
    #[default]
    Sorted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Distance-matrix RMSD under the correspondence, or [`INCOMPATIBLE_DISTANCE`].
    pub distance: f64,
    /// Maps atom indices of the first geometry onto the second.
    pub correspondence: Option<Correspondence>,
}

impl MatchResult {
    pub fn incompatible() -> Self {
        Self {
            distance: INCOMPATIBLE_DISTANCE,
            correspondence: None,
        }
    }

    pub fn is_incompatible(&self) -> bool {
        self.correspondence.is_none()
    }
}

/// Compares geometries through their internal distance matrices.
///
/// For every element, atoms of the first geometry are assigned to atoms of the second
/// by solving a minimum-cost assignment where the cost of a pair is the squared L2
/// distance between their distance profiles. The union of the per-element assignments
/// is the correspondence σ, and the reported distance is
/// `sqrt(mean over i,k of (D_a[i,k] - D_b[σ(i),σ(k)])^2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceMatrixMatcher {
    mode: ProfileMode,
}

impl DistanceMatrixMatcher {
    pub fn new(mode: ProfileMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ProfileMode {
        self.mode
    }

    pub fn compare(&self, a: &Geometry, b: &Geometry) -> Result<MatchResult, MatchError> {
        if a.len() != b.len() || a.sorted_element_keys() != b.sorted_element_keys() {
            return Ok(MatchResult::incompatible());
        }

        let d_a = geometry::distance_matrix(&a.positions());
        let d_b = geometry::distance_matrix(&b.positions());
        let (profile_a, profile_b) = match self.mode {
            ProfileMode::Positional => (d_a.clone(), d_b.clone()),
            ProfileMode::Sorted => (geometry::sorted_rows(&d_a), geometry::sorted_rows(&d_b)),
        };

        let mapping = assign_by_element(a, b, &profile_a, &profile_b)?;
        let distance = geometry::mapped_distance_rmsd(&d_a, &d_b, &mapping).ok_or_else(|| {
            MatchError::Internal("distance matrices and mapping disagree in size".to_string())
        })?;
        let correspondence = Correspondence::from_mapping(mapping).ok_or_else(|| {
            MatchError::Internal("per-element assignments do not form a bijection".to_string())
        })?;

        Ok(MatchResult {
            distance,
            correspondence: Some(correspondence),
        })
    }
}

fn indices_by_element(geometry: &Geometry) -> BTreeMap<String, Vec<usize>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, key) in geometry.element_keys().into_iter().enumerate() {
        groups.entry(key).or_default().push(idx);
    }
    groups
}

fn assign_by_element(
    a: &Geometry,
    b: &Geometry,
    profile_a: &DMatrix<f64>,
    profile_b: &DMatrix<f64>,
) -> Result<Vec<usize>, MatchError> {
    let groups_a = indices_by_element(a);
    let groups_b = indices_by_element(b);
    let mut mapping = vec![0; a.len()];

    for (element, rows) in &groups_a {
        let cols = groups_b.get(element).ok_or_else(|| {
            MatchError::Internal(format!("element '{}' missing from second geometry", element))
        })?;
        let cost = DMatrix::from_fn(rows.len(), cols.len(), |r, c| {
            geometry::row_distance_squared(profile_a, rows[r], profile_b, cols[c])
        });
        let assignment = assignment::solve(&cost)?;
        for (r, c) in assignment.into_iter().enumerate() {
            mapping[rows[r]] = cols[c];
        }
    }
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use nalgebra::{Point3, Rotation3, Vector3};

    fn glycine_like() -> Geometry {
        Geometry::new(
            "test",
            vec![
                Atom::new("N", Point3::new(-1.195, 0.362, 0.011)),
                Atom::new("C", Point3::new(0.087, -0.331, -0.103)),
                Atom::new("C", Point3::new(1.302, 0.571, 0.058)),
                Atom::new("O", Point3::new(1.204, 1.785, 0.227)),
                Atom::new("O", Point3::new(2.485, -0.063, 0.004)),
                Atom::new("H", Point3::new(-1.982, -0.271, -0.137)),
                Atom::new("H", Point3::new(-1.247, 1.098, -0.693)),
                Atom::new("H", Point3::new(0.151, -1.073, 0.712)),
                Atom::new("H", Point3::new(0.127, -0.902, -1.041)),
                Atom::new("H", Point3::new(3.231, 0.571, 0.119)),
            ],
        )
    }

    fn transformed(geometry: &Geometry) -> Geometry {
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), 0.7)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), -1.1);
        let shift = Vector3::new(4.0, -2.5, 10.0);
        let atoms = geometry
            .atoms()
            .iter()
            .map(|a| Atom::new(&a.element, rotation * a.position + shift))
            .collect();
        Geometry::new(geometry.comment(), atoms)
    }

    #[test]
    fn identical_geometries_match_with_identity() {
        let g = glycine_like();
        let result = DistanceMatrixMatcher::default().compare(&g, &g).unwrap();
        assert!(result.distance < 1e-12);
        assert!(result.correspondence.unwrap().is_identity());
    }

    #[test]
    fn permuted_geometry_matches_and_correspondence_recovers_order() {
        let g = glycine_like();
        let order = [7, 3, 0, 9, 1, 5, 4, 8, 2, 6];
        let permuted = g.reordered(&order).unwrap();

        let result = DistanceMatrixMatcher::default().compare(&g, &permuted).unwrap();
        assert!(result.distance < 1e-9, "distance was {}", result.distance);
        let correspondence = result.correspondence.unwrap();
        for i in 0..g.len() {
            let j = correspondence.apply(i).unwrap();
            assert_eq!(permuted.atoms()[j], g.atoms()[i]);
        }
    }

    #[test]
    fn rigid_motion_does_not_change_distance() {
        let g = glycine_like();
        let moved = transformed(&g).reordered(&[9, 8, 7, 6, 5, 4, 3, 2, 1, 0]).unwrap();
        let result = DistanceMatrixMatcher::default().compare(&moved, &g).unwrap();
        assert!(result.distance < 1e-9, "distance was {}", result.distance);
    }

    #[test]
    fn distorted_geometry_has_positive_distance() {
        let g = glycine_like();
        let mut atoms = g.atoms().to_vec();
        atoms[4].position.x += 0.3;
        let distorted = Geometry::new("distorted", atoms);
        let result = DistanceMatrixMatcher::default().compare(&g, &distorted).unwrap();
        assert!(result.distance > 0.01);
        assert!(result.distance < INCOMPATIBLE_DISTANCE);
        assert!(!result.is_incompatible());
    }

    #[test]
    fn different_element_multisets_return_sentinel() {
        let g = glycine_like();
        let mut atoms = g.atoms().to_vec();
        atoms[9].element = "F".to_string();
        let other = Geometry::new("fluoro", atoms);
        let result = DistanceMatrixMatcher::default().compare(&g, &other).unwrap();
        assert_eq!(result, MatchResult::incompatible());
        assert_eq!(result.distance, INCOMPATIBLE_DISTANCE);
    }

    #[test]
    fn different_atom_counts_return_sentinel_regardless_of_mode() {
        let g = glycine_like();
        let shorter = Geometry::new("short", g.atoms()[..9].to_vec());
        for mode in [ProfileMode::Positional, ProfileMode::Sorted] {
            let result = DistanceMatrixMatcher::new(mode).compare(&g, &shorter).unwrap();
            assert!(result.is_incompatible());
        }
    }

    #[test]
    fn correspondence_never_pairs_different_elements() {
        let g = glycine_like();
        let permuted = g.reordered(&[1, 0, 2, 4, 3, 6, 5, 8, 7, 9]).unwrap();
        let result = DistanceMatrixMatcher::new(ProfileMode::Positional)
            .compare(&g, &permuted)
            .unwrap();
        let correspondence = result.correspondence.unwrap();
        for i in 0..g.len() {
            let j = correspondence.apply(i).unwrap();
            assert_eq!(g.atoms()[i].element_key(), permuted.atoms()[j].element_key());
        }
    }

    #[test]
    fn positional_mode_matches_same_order_geometries() {
        let g = glycine_like();
        let moved = transformed(&g);
        let result = DistanceMatrixMatcher::new(ProfileMode::Positional)
            .compare(&g, &moved)
            .unwrap();
        assert!(result.distance < 1e-9);
        assert!(result.correspondence.unwrap().is_identity());
    }

    #[test]
    fn non_finite_coordinates_surface_as_error() {
        let g = glycine_like();
        let mut atoms = g.atoms().to_vec();
        atoms[0].position.x = f64::NAN;
        let broken = Geometry::new("nan", atoms);
        let result = DistanceMatrixMatcher::default().compare(&g, &broken);
        assert!(matches!(result, Err(MatchError::Assignment(_))));
    }
}

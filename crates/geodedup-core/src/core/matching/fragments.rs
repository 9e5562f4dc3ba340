use super::MatchError;
use crate::core::models::correspondence::Correspondence;
use crate::core::models::fragmentation::{CanonicalFragmentation, Fragmentation};

/// Canonicalizes a declared fragmentation, optionally re-expressing its 1-based indices
/// through `correspondence` first.
pub fn normalize(
    fragmentation: &Fragmentation,
    correspondence: Option<&Correspondence>,
) -> Result<CanonicalFragmentation, MatchError> {
    let groups = match correspondence {
        None => fragmentation.groups().to_vec(),
        Some(correspondence) => fragmentation
            .groups()
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|&index| remap(index, correspondence))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(CanonicalFragmentation::from_groups(groups))
}

fn remap(index: usize, correspondence: &Correspondence) -> Result<usize, MatchError> {
    index
        .checked_sub(1)
        .and_then(|zero_based| correspondence.apply(zero_based))
        .map(|mapped| mapped + 1)
        .ok_or(MatchError::FragmentIndexOutOfRange {
            index,
            atoms: correspondence.len(),
        })
}

/// Whether the candidate's fragmentation, carried over through the candidate-to-entry
/// `correspondence`, declares the same partition as the entry's own fragmentation.
///
/// The correspondence must be the one found for this specific candidate/entry pair.
pub fn equivalent(
    candidate: &Fragmentation,
    entry: &Fragmentation,
    correspondence: &Correspondence,
) -> Result<bool, MatchError> {
    Ok(normalize(candidate, Some(correspondence))? == normalize(entry, None)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matching::matcher::DistanceMatrixMatcher;
    use crate::core::models::atom::Atom;
    use crate::core::models::geometry::Geometry;
    use nalgebra::Point3;

    fn dimer() -> Geometry {
        Geometry::new(
            "water dimer",
            vec![
                Atom::new("O", Point3::new(-1.551, -0.114, 0.000)),
                Atom::new("H", Point3::new(-1.934, 0.762, 0.000)),
                Atom::new("H", Point3::new(-0.600, 0.040, 0.000)),
                Atom::new("O", Point3::new(1.351, 0.111, 0.000)),
                Atom::new("H", Point3::new(1.680, -0.373, -0.758)),
                Atom::new("H", Point3::new(1.680, -0.373, 0.758)),
            ],
        )
    }

    #[test]
    fn normalize_without_correspondence_only_sorts() {
        let f = Fragmentation::new(vec![vec![6, 4, 5], vec![3, 1, 2]]);
        let canonical = normalize(&f, None).unwrap();
        assert_eq!(canonical.groups(), &[vec![1, 2, 3], vec![4, 5, 6]]);
    }

    #[test]
    fn normalize_remaps_one_based_indices() {
        let f = Fragmentation::new(vec![vec![1, 2], vec![3]]);
        let c = Correspondence::from_mapping(vec![2, 0, 1]).unwrap();
        let canonical = normalize(&f, Some(&c)).unwrap();
        assert_eq!(canonical.groups(), &[vec![1, 3], vec![2]]);
    }

    #[test]
    fn normalize_rejects_indices_outside_the_correspondence() {
        let f = Fragmentation::new(vec![vec![1, 4]]);
        let c = Correspondence::identity(3);
        assert_eq!(
            normalize(&f, Some(&c)),
            Err(MatchError::FragmentIndexOutOfRange { index: 4, atoms: 3 })
        );
    }

    #[test]
    fn empty_fragmentations_are_equivalent() {
        let c = Correspondence::identity(3);
        assert!(equivalent(&Fragmentation::default(), &Fragmentation::default(), &c).unwrap());
    }

    #[test]
    fn declared_versus_undeclared_fragmentation_differs() {
        let c = Correspondence::identity(3);
        let declared = Fragmentation::new(vec![vec![1, 2, 3]]);
        assert!(!equivalent(&declared, &Fragmentation::default(), &c).unwrap());
    }

    #[test]
    fn canonical_form_is_invariant_under_consistent_relabeling() {
        let original = dimer();
        let original_fragments = Fragmentation::new(vec![vec![1, 2, 3], vec![4, 5, 6]]);

        // atom m of the relabeled geometry is atom order[m] of the original
        let order = [4, 0, 3, 2, 5, 1];
        let relabeled = original.reordered(&order).unwrap();
        let relabeled_fragments = Fragmentation::new(
            original_fragments
                .groups()
                .iter()
                .map(|group| {
                    group
                        .iter()
                        .map(|&i| order.iter().position(|&o| o == i - 1).unwrap() + 1)
                        .collect()
                })
                .collect(),
        );
        assert_ne!(relabeled_fragments, original_fragments);

        let result = DistanceMatrixMatcher::default()
            .compare(&relabeled, &original)
            .unwrap();
        let correspondence = result.correspondence.unwrap();

        assert_eq!(
            normalize(&relabeled_fragments, Some(&correspondence)).unwrap(),
            normalize(&original_fragments, Some(&Correspondence::identity(6))).unwrap()
        );
        assert!(equivalent(&relabeled_fragments, &original_fragments, &correspondence).unwrap());
    }

    #[test]
    fn a_different_partition_is_not_equivalent() {
        let g = dimer();
        let result = DistanceMatrixMatcher::default().compare(&g, &g).unwrap();
        let correspondence = result.correspondence.unwrap();
        let monomers = Fragmentation::new(vec![vec![1, 2, 3], vec![4, 5, 6]]);
        let shifted = Fragmentation::new(vec![vec![1, 2], vec![3, 4, 5, 6]]);
        assert!(!equivalent(&monomers, &shifted, &correspondence).unwrap());
    }
}

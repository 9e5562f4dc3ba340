/// A declared partition of a molecule's atoms into groups, as written in a
/// calculation header. Indices are 1-based and kept in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragmentation {
    groups: Vec<Vec<usize>>,
}

impl Fragmentation {
    pub fn new(groups: Vec<Vec<usize>>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// `true` when the header declared no fragments at all.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn atom_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Largest declared index, or `None` for an empty fragmentation.
    pub fn max_index(&self) -> Option<usize> {
        self.groups.iter().flatten().copied().max()
    }
}

/// Order-independent form of a [`Fragmentation`]: indices sorted inside every group and
/// groups sorted by their index tuples. Two fragmentations describe the same partition
/// exactly when their canonical forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CanonicalFragmentation {
    groups: Vec<Vec<usize>>,
}

impl CanonicalFragmentation {
    pub fn from_groups(mut groups: Vec<Vec<usize>>) -> Self {
        for group in &mut groups {
            group.sort_unstable();
        }
        groups.sort();
        Self { groups }
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }
}

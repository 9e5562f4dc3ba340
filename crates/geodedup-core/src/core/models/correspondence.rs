/// A bijection from atom indices of one geometry (the source) onto atom indices of
/// another (the target), both 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Correspondence {
    mapping: Vec<usize>,
}

impl Correspondence {
    /// Wraps `mapping` if it is a permutation of `0..mapping.len()`.
    pub fn from_mapping(mapping: Vec<usize>) -> Option<Self> {
        let mut seen = vec![false; mapping.len()];
        for &target in &mapping {
            if target >= seen.len() || seen[target] {
                return None;
            }
            seen[target] = true;
        }
        Some(Self { mapping })
    }

    pub fn identity(n: usize) -> Self {
        Self {
            mapping: (0..n).collect(),
        }
    }

    /// Target index of source atom `index`, or `None` if out of range.
    #[inline]
    pub fn apply(&self, index: usize) -> Option<usize> {
        self.mapping.get(index).copied()
    }

    pub fn inverse(&self) -> Self {
        let mut inverse = vec![0; self.mapping.len()];
        for (source, &target) in self.mapping.iter().enumerate() {
            inverse[target] = source;
        }
        Self { mapping: inverse }
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.mapping
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn is_identity(&self) -> bool {
        self.mapping.iter().enumerate().all(|(i, &m)| i == m)
    }
}

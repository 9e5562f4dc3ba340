use super::atom::Atom;
use crate::core::utils::elements;
use nalgebra::Point3;
use std::collections::BTreeMap;
use std::fmt;

/// Element-multiset signature of a geometry, e.g. `C8H10N2O1`.
///
/// Symbols are upper-cased, sorted lexicographically and suffixed with their count.
/// The signature is the bucket key of the registry: two geometries can only describe
/// the same molecule if their signatures are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementSignature(String);

impl ElementSignature {
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for symbol in symbols {
            *counts.entry(elements::element_key(symbol.as_ref())).or_default() += 1;
        }
        let signature = counts
            .iter()
            .map(|(symbol, count)| format!("{}{}", symbol, count))
            .collect();
        Self(signature)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a registry entry name (`<signature>_<timestamp>`) belongs to this bucket.
    pub fn matches_entry_name(&self, name: &str) -> bool {
        name.split('_').next() == Some(self.0.as_str())
    }
}

impl fmt::Display for ElementSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered list of atoms together with the free-text comment of its source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    comment: String,
    atoms: Vec<Atom>,
}

impl Geometry {
    pub fn new(comment: &str, atoms: Vec<Atom>) -> Self {
        Self {
            comment: comment.to_string(),
            atoms,
        }
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    pub fn element_keys(&self) -> Vec<String> {
        self.atoms.iter().map(Atom::element_key).collect()
    }

    pub fn sorted_element_keys(&self) -> Vec<String> {
        let mut keys = self.element_keys();
        keys.sort_unstable();
        keys
    }

    pub fn signature(&self) -> ElementSignature {
        ElementSignature::from_symbols(self.atoms.iter().map(|a| a.element.as_str()))
    }

    /// Returns a geometry whose atom `m` is atom `order[m]` of `self`.
    ///
    /// Returns `None` if `order` is not a permutation of `0..self.len()`.
    pub fn reordered(&self, order: &[usize]) -> Option<Self> {
        if order.len() != self.atoms.len() {
            return None;
        }
        let mut seen = vec![false; order.len()];
        for &idx in order {
            if idx >= seen.len() || seen[idx] {
                return None;
            }
            seen[idx] = true;
        }
        Some(Self {
            comment: self.comment.clone(),
            atoms: order.iter().map(|&idx| self.atoms[idx].clone()).collect(),
        })
    }
}

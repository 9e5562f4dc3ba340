use crate::core::utils::elements;
use nalgebra::Point3;

/// An atom of a parsed geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The element symbol as written in the source file (e.g., "C", "Cl").
    pub element: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(element: &str, position: Point3<f64>) -> Self {
        Self {
            element: element.to_string(),
            position,
        }
    }

    /// Case-insensitive key used for element comparisons and signatures.
    pub fn element_key(&self) -> String {
        elements::element_key(&self.element)
    }
}

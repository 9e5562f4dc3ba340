use crate::core::io::traits::GeometryFile;
use crate::core::models::atom::Atom;
use crate::core::models::geometry::Geometry;
use crate::core::utils::elements;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Expected {expected} atom records, found {found}")]
    TruncatedAtoms { expected: usize, found: usize },
    #[error("Missing required record: {0}")]
    MissingRecord(&'static str),
    #[error("Geometry declares zero atoms")]
    Empty,
}

#[derive(Debug, Error, PartialEq)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count '{value}'")]
    InvalidCount { value: String },
    #[error("Missing {field} field")]
    MissingField { field: &'static str },
    #[error("Invalid {field} coordinate '{value}'")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Unknown element symbol '{symbol}'")]
    UnknownElement { symbol: String },
}

/// The plain XYZ format: an atom count line, a free-text comment line, then one
/// `ELEMENT x y z` record per atom. Columns beyond the fourth are ignored, as are
/// blank lines inside the atom block and anything after the declared atoms.
pub struct XyzFile;

fn parse_coordinate(
    field: Option<&str>,
    name: &'static str,
    line: usize,
) -> Result<f64, XyzError> {
    let value = field.ok_or(XyzError::Parse {
        line,
        kind: XyzParseErrorKind::MissingField { field: name },
    })?;
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(XyzError::Parse {
            line,
            kind: XyzParseErrorKind::InvalidFloat {
                field: name,
                value: value.to_string(),
            },
        }),
    }
}

fn parse_atom_record(content: &str, line: usize) -> Result<Atom, XyzError> {
    let mut fields = content.split_whitespace();
    let symbol = fields.next().ok_or(XyzError::Parse {
        line,
        kind: XyzParseErrorKind::MissingField { field: "element" },
    })?;
    if !elements::is_known_element(symbol) {
        return Err(XyzError::Parse {
            line,
            kind: XyzParseErrorKind::UnknownElement {
                symbol: symbol.to_string(),
            },
        });
    }
    let x = parse_coordinate(fields.next(), "x", line)?;
    let y = parse_coordinate(fields.next(), "y", line)?;
    let z = parse_coordinate(fields.next(), "z", line)?;
    Ok(Atom::new(symbol, Point3::new(x, y, z)))
}

impl GeometryFile for XyzFile {
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Geometry, Self::Error> {
        let mut lines = reader.lines();

        let count_line = lines
            .next()
            .transpose()?
            .ok_or(XyzError::MissingRecord("atom count line"))?;
        let count_str = count_line.trim();
        let expected: usize = count_str.parse().map_err(|_| XyzError::Parse {
            line: 1,
            kind: XyzParseErrorKind::InvalidCount {
                value: count_str.to_string(),
            },
        })?;
        if expected == 0 {
            return Err(XyzError::Empty);
        }

        let comment = lines
            .next()
            .transpose()?
            .ok_or(XyzError::MissingRecord("comment line"))?;

        let mut atoms = Vec::with_capacity(expected);
        for (offset, line_res) in lines.enumerate() {
            if atoms.len() == expected {
                break;
            }
            let line = line_res?;
            if line.trim().is_empty() {
                continue;
            }
            atoms.push(parse_atom_record(&line, offset + 3)?);
        }

        if atoms.len() < expected {
            return Err(XyzError::TruncatedAtoms {
                expected,
                found: atoms.len(),
            });
        }
        Ok(Geometry::new(comment.trim(), atoms))
    }

    fn write_to(geometry: &Geometry, writer: &mut impl Write) -> Result<(), Self::Error> {
        writeln!(writer, "{}", geometry.len())?;
        writeln!(writer, "{}", geometry.comment())?;
        for atom in geometry.atoms() {
            writeln!(
                writer,
                "{:<3}{:>16.8}{:>16.8}{:>16.8}",
                atom.element, atom.position.x, atom.position.y, atom.position.z
            )?;
        }
        Ok(())
    }
}

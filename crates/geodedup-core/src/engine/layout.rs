use super::error::RegistryError;
use std::path::{Path, PathBuf};

pub const GEOMETRY_SUFFIX: &str = ".xyz";
pub const HEADER_SUFFIX: &str = ".inp";

/// Per-calculation artifacts that an entry owns and candidates alias.
pub const DEFAULT_ARTIFACT_SUFFIXES: [&str; 10] = [
    "_out.out",
    ".out",
    ".densities",
    "_err.err",
    ".property.txt",
    ".bibtex",
    ".cube",
    ".densitiesinfo",
    ".sh",
    HEADER_SUFFIX,
];

/// File locations of a candidate calculation directory `D` with stem `S`.
///
/// The header is `D/S.inp`. The geometry is `D/S.xyz` when present, otherwise the
/// project-level `D/../S.xyz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePaths {
    pub dir: PathBuf,
    pub stem: String,
    pub header: PathBuf,
    pub local_geometry: PathBuf,
    pub project_geometry: Option<PathBuf>,
}

impl CandidatePaths {
    pub fn resolve(dir: &Path) -> Result<Self, RegistryError> {
        let dir: PathBuf = std::path::absolute(dir)
            .map_err(|source| RegistryError::Scan {
                path: dir.to_path_buf(),
                source,
            })?
            .components()
            .collect();
        let stem = dir
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| RegistryError::InvalidCandidate {
                path: dir.clone(),
                reason: "directory has no UTF-8 file name".to_string(),
            })?;

        let header = dir.join(format!("{stem}{HEADER_SUFFIX}"));
        let local_geometry = dir.join(format!("{stem}{GEOMETRY_SUFFIX}"));
        let project_geometry = dir
            .parent()
            .map(|parent| parent.join(format!("{stem}{GEOMETRY_SUFFIX}")));

        Ok(Self {
            dir,
            stem,
            header,
            local_geometry,
            project_geometry,
        })
    }

    /// Geometry locations in lookup order.
    pub fn geometry_candidates(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.local_geometry.as_path()).chain(self.project_geometry.as_deref())
    }

    pub fn artifact(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.stem, suffix))
    }

    /// Files worth reading ahead of the sequential pass.
    pub fn prefetch_targets(&self) -> Vec<PathBuf> {
        let mut targets = vec![self.header.clone()];
        targets.extend(self.geometry_candidates().map(Path::to_path_buf));
        targets
    }
}

/// File locations of the canonical entry `name` under a registry root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPaths {
    pub dir: PathBuf,
    pub name: String,
}

impl EntryPaths {
    pub fn new(root: &Path, name: &str) -> Self {
        Self {
            dir: root.join(name),
            name: name.to_string(),
        }
    }

    pub fn geometry(&self) -> PathBuf {
        self.artifact(GEOMETRY_SUFFIX)
    }

    pub fn header(&self) -> PathBuf {
        self.artifact(HEADER_SUFFIX)
    }

    pub fn artifact(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.name, suffix))
    }
}

/// Returns the longest configured suffix that `file_name` ends with, so `_out.out`
/// wins over `.out`.
pub fn matching_suffix<'a>(file_name: &str, suffixes: &'a [String]) -> Option<&'a str> {
    suffixes
        .iter()
        .filter(|suffix| file_name.len() > suffix.len() && file_name.ends_with(suffix.as_str()))
        .max_by_key(|suffix| suffix.len())
        .map(String::as_str)
}

use super::cache::FileCache;
use super::config::RegistryConfig;
use super::error::RegistryError;
use super::layout::{CandidatePaths, EntryPaths};
use crate::core::io::header::{self, HeaderError};
use crate::core::io::traits::GeometryFile;
use crate::core::io::xyz::XyzFile;
use crate::core::matching::fragments;
use crate::core::matching::matcher::DistanceMatrixMatcher;
use crate::core::models::fragmentation::Fragmentation;
use crate::core::models::geometry::{ElementSignature, Geometry};
use chrono::{Local, NaiveDateTime, TimeDelta};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// `YYYYMMDDhhmmss` followed by six digits of microseconds.
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%6f";

/// Everything the comparison needs from one calculation.
#[derive(Debug, Clone)]
pub struct Structure {
    pub geometry: Geometry,
    pub fragmentation: Fragmentation,
    /// Normalized header prefix; two structures are only comparable when these agree.
    pub header_key: String,
}

/// A candidate directory loaded and validated, with the raw texts needed to create an
/// entry from it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub paths: CandidatePaths,
    pub geometry_path: PathBuf,
    pub geometry_text: String,
    pub header_text: String,
    pub structure: Structure,
}

impl Candidate {
    pub fn signature(&self) -> ElementSignature {
        self.structure.geometry.signature()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub name: String,
    pub distance: f64,
}

/// What happened to a processed candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No equivalent entry existed; a new one was staged under this name.
    Inserted { entry: String },
    /// The candidate now aliases the artifacts of an existing entry.
    Aliased { entry: String, distance: f64 },
}

impl Resolution {
    pub fn entry(&self) -> &str {
        match self {
            Resolution::Inserted { entry } | Resolution::Aliased { entry, .. } => entry,
        }
    }

    /// The name of a newly created entry, if one was created.
    pub fn into_new_entry(self) -> Option<String> {
        match self {
            Resolution::Inserted { entry } => Some(entry),
            Resolution::Aliased { .. } => None,
        }
    }
}

/// The set of canonical entries under one root directory, and the rules that decide
/// whether a candidate duplicates one of them.
///
/// All reads and writes go through the [`FileCache`] handed in by the caller, so a
/// registry never touches the disk except to list entry directories.
#[derive(Debug)]
pub struct Registry {
    config: RegistryConfig,
    root: PathBuf,
    matcher: DistanceMatrixMatcher,
    // Entries staged in this session that may not exist on disk yet.
    pending: BTreeSet<String>,
    issued: HashSet<String>,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let root = std::path::absolute(&config.registry_root).map_err(|source| {
            RegistryError::Scan {
                path: config.registry_root.clone(),
                source,
            }
        })?;
        let matcher = DistanceMatrixMatcher::new(config.profile_mode);
        Ok(Self {
            config,
            root,
            matcher,
            pending: BTreeSet::new(),
            issued: HashSet::new(),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry(&self, name: &str) -> EntryPaths {
        EntryPaths::new(&self.root, name)
    }

    /// Names of all entries, on disk or staged, in ascending order.
    pub fn entry_names(&self) -> Result<Vec<String>, RegistryError> {
        let mut names: BTreeSet<String> = self.pending.clone();

        let listing = match fs::read_dir(&self.root) {
            Ok(listing) => listing,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(names.into_iter().collect()),
            Err(source) => {
                return Err(RegistryError::Scan {
                    path: self.root.clone(),
                    source,
                });
            }
        };
        for dir_entry in listing {
            let dir_entry = dir_entry.map_err(|source| RegistryError::Scan {
                path: self.root.clone(),
                source,
            })?;
            if !dir_entry.path().is_dir() {
                continue;
            }
            if let Some(name) = dir_entry.file_name().to_str() {
                names.insert(name.to_string());
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Entries whose name starts with `signature` as its first `_`-separated segment.
    pub fn bucket(&self, signature: &ElementSignature) -> Result<Vec<String>, RegistryError> {
        Ok(self
            .entry_names()?
            .into_iter()
            .filter(|name| signature.matches_entry_name(name))
            .collect())
    }

    /// Reads and validates a candidate directory. Nothing is staged.
    pub fn load_candidate(
        &self,
        cache: &mut FileCache,
        dir: &Path,
    ) -> Result<Candidate, RegistryError> {
        let paths = CandidatePaths::resolve(dir)?;

        let mut found = None;
        for path in paths.geometry_candidates() {
            if let Some(text) = cache.get(path)? {
                found = Some((path.to_path_buf(), text));
                break;
            }
        }
        let (geometry_path, geometry_text) = found.ok_or_else(|| RegistryError::MissingGeometry {
            dir: paths.dir.clone(),
        })?;

        let header_text = cache
            .get(&paths.header)?
            .ok_or_else(|| RegistryError::MissingHeader {
                path: paths.header.clone(),
            })?;

        let structure =
            self.parse_structure(&geometry_text, &geometry_path, &header_text, &paths.header)?;

        Ok(Candidate {
            paths,
            geometry_path,
            geometry_text,
            header_text,
            structure,
        })
    }

    /// Loads an entry for comparison. Entries with missing or unreadable content are
    /// reported and skipped rather than failing the caller.
    pub fn load_entry(
        &self,
        cache: &mut FileCache,
        name: &str,
    ) -> Result<Option<Structure>, RegistryError> {
        let entry = self.entry(name);
        let geometry_path = entry.geometry();
        let header_path = entry.header();

        let Some(geometry_text) = cache.get(&geometry_path)? else {
            warn!(entry = name, "Skipping entry without a geometry file");
            return Ok(None);
        };
        let Some(header_text) = cache.get(&header_path)? else {
            warn!(entry = name, "Skipping entry without a header file");
            return Ok(None);
        };

        match self.parse_structure(&geometry_text, &geometry_path, &header_text, &header_path) {
            Ok(structure) => Ok(Some(structure)),
            Err(e) => {
                warn!(entry = name, error = %e, "Skipping unreadable entry");
                Ok(None)
            }
        }
    }

    /// Distance from `candidate` to `entry`, or `None` when the entry is filtered out:
    /// different header key, incompatible geometry, or fragments that disagree under
    /// the matched atom correspondence.
    pub fn compare(
        &self,
        candidate: &Structure,
        entry: &Structure,
    ) -> Result<Option<f64>, RegistryError> {
        if candidate.header_key != entry.header_key {
            return Ok(None);
        }
        let result = self.matcher.compare(&candidate.geometry, &entry.geometry)?;
        let Some(correspondence) = result.correspondence else {
            return Ok(None);
        };
        if !fragments::equivalent(
            &candidate.fragmentation,
            &entry.fragmentation,
            &correspondence,
        )? {
            return Ok(None);
        }
        Ok(Some(result.distance))
    }

    /// Comparable entries of `bucket`, closest first. Ties keep bucket order. Entries
    /// the matcher cannot handle are skipped like unreadable ones.
    pub fn rank(
        &self,
        cache: &mut FileCache,
        candidate: &Structure,
        bucket: &[String],
    ) -> Result<Vec<RankedEntry>, RegistryError> {
        let mut ranked = Vec::new();
        for name in bucket {
            let Some(entry) = self.load_entry(cache, name)? else {
                continue;
            };
            match self.compare(candidate, &entry) {
                Ok(Some(distance)) => ranked.push(RankedEntry {
                    name: name.clone(),
                    distance,
                }),
                Ok(None) => debug!(entry = %name, "Entry filtered out"),
                Err(RegistryError::Matching(e)) => {
                    warn!(entry = %name, error = %e, "Skipping entry that cannot be matched");
                }
                Err(e) => return Err(e),
            }
        }
        ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(ranked)
    }

    /// Decides whether the candidate in `dir` duplicates an existing entry and stages
    /// either the aliasing symlinks or a brand-new entry.
    #[instrument(skip_all, fields(candidate = %dir.display()))]
    pub fn resolve(
        &mut self,
        cache: &mut FileCache,
        dir: &Path,
    ) -> Result<Resolution, RegistryError> {
        let candidate = self.load_candidate(cache, dir)?;
        let signature = candidate.signature();
        let bucket = self.bucket(&signature)?;
        debug!(signature = %signature, entries = bucket.len(), "Collected bucket");

        let ranked = self.rank(cache, &candidate.structure, &bucket)?;
        if let Some(best) = ranked.first() {
            if best.distance < self.config.duplicate_threshold {
                info!(
                    entry = %best.name,
                    distance = best.distance,
                    "Candidate duplicates existing entry"
                );
                self.alias(cache, &candidate, &best.name);
                return Ok(Resolution::Aliased {
                    entry: best.name.clone(),
                    distance: best.distance,
                });
            }
            debug!(
                closest = %best.name,
                distance = best.distance,
                "Closest entry is above the duplicate threshold"
            );
        }

        let name = self.insert(cache, &candidate);
        info!(entry = %name, "Created new entry");
        Ok(Resolution::Inserted { entry: name })
    }

    /// Returns the new entry's name if the candidate was inserted, `None` if it was
    /// aliased to an existing entry.
    pub fn process_candidate(
        &mut self,
        cache: &mut FileCache,
        dir: &Path,
    ) -> Result<Option<String>, RegistryError> {
        Ok(self.resolve(cache, dir)?.into_new_entry())
    }

    /// Points every artifact of the candidate at the corresponding artifact of `entry`.
    pub fn alias(&self, cache: &mut FileCache, candidate: &Candidate, entry: &str) {
        let entry = self.entry(entry);
        for suffix in &self.config.artifact_suffixes {
            cache.link(&entry.artifact(suffix), &candidate.paths.artifact(suffix));
        }
        cache.link(&entry.header(), &candidate.paths.header);
    }

    /// Stages a new entry built from the candidate: placeholder artifacts, the
    /// candidate's header and geometry, and links from the candidate back into it.
    pub fn insert(&mut self, cache: &mut FileCache, candidate: &Candidate) -> String {
        let name = self.allocate_name(&candidate.signature());
        let entry = self.entry(&name);

        for suffix in &self.config.artifact_suffixes {
            cache.set(&entry.artifact(suffix), &self.config.placeholder_content);
        }
        cache.set(&entry.header(), &candidate.header_text);
        cache.set(&entry.geometry(), &candidate.geometry_text);

        self.alias(cache, candidate, &name);
        self.pending.insert(name.clone());
        name
    }

    /// Records an entry staged outside [`Registry::insert`] so later buckets see it.
    pub fn register_pending(&mut self, name: &str) {
        self.pending.insert(name.to_string());
    }

    /// Forgets entries staged in this session.
    pub fn reset_session(&mut self) {
        self.pending.clear();
    }

    /// A fresh `<signature>_<timestamp>` name, distinct from every entry on disk and
    /// every name handed out before.
    pub fn allocate_name(&mut self, signature: &ElementSignature) -> String {
        let mut stamp: NaiveDateTime = Local::now().naive_local();
        loop {
            let name = format!("{}_{}", signature, stamp.format(TIMESTAMP_FORMAT));
            if !self.issued.contains(&name) && !self.root.join(&name).exists() {
                self.issued.insert(name.clone());
                return name;
            }
            stamp += TimeDelta::microseconds(1);
        }
    }

    fn parse_structure(
        &self,
        geometry_text: &str,
        geometry_path: &Path,
        header_text: &str,
        header_path: &Path,
    ) -> Result<Structure, RegistryError> {
        let geometry =
            XyzFile::read_from_str(geometry_text).map_err(|source| {
                RegistryError::MalformedGeometry {
                    path: geometry_path.to_path_buf(),
                    source,
                }
            })?;
        let fragmentation = header::parse_fragmentation(header_text)
            .and_then(|fragmentation| match fragmentation.max_index() {
                Some(index) if index > geometry.len() => Err(HeaderError::IndexOutOfRange {
                    index,
                    atoms: geometry.len(),
                }),
                _ => Ok(fragmentation),
            })
            .map_err(|source| RegistryError::MalformedFragmentation {
                path: header_path.to_path_buf(),
                source,
            })?;
        let header_key = header::normalize(header_text, &self.config.header_rules);
        Ok(Structure {
            geometry,
            fragmentation,
            header_key,
        })
    }
}

use crate::engine::cache::FileCache;
use crate::engine::config::RegistryConfig;
use crate::engine::error::RegistryError;
use crate::engine::layout::{self, GEOMETRY_SUFFIX, HEADER_SUFFIX};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::registry::{Registry, Structure};
use crate::engine::session::Session;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Copies a finished calculation into the registry as a new entry, without looking
/// for duplicates and without linking the calculation back.
///
/// Every regular file named `<stem><suffix>` for a configured artifact suffix is
/// copied to the entry; the entry's geometry and header come from the candidate.
#[instrument(skip_all, fields(candidate = %dir.display()))]
pub fn add_calculation(session: &mut Session, dir: &Path) -> Result<String, RegistryError> {
    let (registry, cache) = session.parts_mut();
    let candidate = registry.load_candidate(cache, dir)?;
    let suffixes = registry.config().artifact_suffixes.clone();
    let name = registry.allocate_name(&candidate.signature());
    let entry = registry.entry(&name);

    let listing = fs::read_dir(&candidate.paths.dir).map_err(|source| RegistryError::Scan {
        path: candidate.paths.dir.clone(),
        source,
    })?;
    let mut copied = 0usize;
    for dir_entry in listing {
        let dir_entry = dir_entry.map_err(|source| RegistryError::Scan {
            path: candidate.paths.dir.clone(),
            source,
        })?;
        let path = dir_entry.path();
        if !is_regular_file(&path) {
            continue;
        }
        let Some(file_name) = dir_entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Some(suffix) = layout::matching_suffix(&file_name, &suffixes) else {
            continue;
        };
        if file_name.strip_suffix(suffix) != Some(candidate.paths.stem.as_str()) {
            debug!(file = %file_name, "Ignoring artifact with a foreign stem");
            continue;
        }
        cache.copy(&path, &entry.artifact(suffix));
        copied += 1;
    }

    cache.set(&entry.header(), &candidate.header_text);
    cache.set(&entry.geometry(), &candidate.geometry_text);
    registry.register_pending(&name);

    info!(entry = %name, artifacts = copied, "Imported calculation");
    Ok(name)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub imported: Vec<(PathBuf, String)>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Imports every `<root>/<project>/<calc>` calculation with [`add_calculation`].
///
/// A project qualifies when it holds at least one `.xyz` file; a calculation when it
/// holds `<calc>.inp`. The registry root is never treated as a project. Nothing is
/// committed.
#[instrument(skip_all, fields(workspace = %root.display()))]
pub fn import_workspace(
    session: &mut Session,
    root: &Path,
    reporter: &ProgressReporter,
) -> Result<ImportReport, RegistryError> {
    let registry_root = session.registry().root().to_path_buf();
    let mut calculations = Vec::new();

    for project in sorted_subdirectories(root)? {
        if absolute_eq(&project, &registry_root) || !contains_geometry(&project)? {
            continue;
        }
        for calc in sorted_subdirectories(&project)? {
            let Some(stem) = calc.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if calc.join(format!("{stem}{HEADER_SUFFIX}")).is_file() {
                calculations.push(calc);
            }
        }
    }
    info!(calculations = calculations.len(), "Found calculations to import");

    reporter.report(Progress::PhaseStart { name: "Importing" });
    reporter.report(Progress::TaskStart {
        total_steps: calculations.len() as u64,
    });
    let mut report = ImportReport::default();
    for calc in calculations {
        match add_calculation(session, &calc) {
            Ok(name) => report.imported.push((calc, name)),
            Err(e) => {
                warn!(candidate = %calc.display(), error = %e, "Failed to import calculation");
                report.failed.push((calc, e.to_string()));
            }
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    Ok(report)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedEntry {
    pub removed: String,
    pub survivor: String,
    pub distance: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    pub merged: Vec<MergedEntry>,
    pub repointed_links: usize,
    pub failed_buckets: usize,
}

/// Merges registry entries that duplicate an older entry of the same bucket.
///
/// Within a bucket, entries are visited in name order and compared against the
/// entries kept so far. A duplicate is merged into the first kept entry it matches:
/// symlinks under `workspace` that point into it are repointed at the survivor's file
/// with the same suffix, and its directory is deleted. With `dry_run` the merges are
/// only reported.
#[instrument(skip_all, fields(workspace = %workspace.display()))]
pub fn cleanup(
    config: &RegistryConfig,
    workspace: &Path,
    dry_run: bool,
    reporter: &ProgressReporter,
) -> Result<CleanupReport, RegistryError> {
    let registry = Registry::new(config.clone())?;
    let mut cache = FileCache::new();
    let mut report = CleanupReport::default();

    let mut buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in registry.entry_names()? {
        let signature = name.split('_').next().unwrap_or_default().to_string();
        buckets.entry(signature).or_default().push(name);
    }
    buckets.retain(|_, names| names.len() > 1);

    reporter.report(Progress::PhaseStart { name: "Comparing entries" });
    reporter.report(Progress::TaskStart {
        total_steps: buckets.len() as u64,
    });
    for (signature, names) in &buckets {
        match merge_bucket(&registry, &mut cache, names) {
            Ok(merged) => report.merged.extend(merged),
            Err(e) => {
                warn!(bucket = %signature, error = %e, "Failed to compare bucket");
                report.failed_buckets += 1;
            }
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    if report.merged.is_empty() {
        info!("No duplicate entries found");
        return Ok(report);
    }
    for merge in &report.merged {
        info!(
            removed = %merge.removed,
            survivor = %merge.survivor,
            distance = merge.distance,
            "Merging duplicate entry"
        );
    }

    let redirects: BTreeMap<PathBuf, &MergedEntry> = report
        .merged
        .iter()
        .map(|m| (registry.entry(&m.removed).dir, m))
        .collect();
    let mut links = Vec::new();
    reporter.phase("Scanning workspace", || {
        collect_symlinks(workspace, registry.root(), &mut links)
    })
    .map_err(|source| RegistryError::Scan {
        path: workspace.to_path_buf(),
        source,
    })?;

    let mut repointed = 0usize;
    for link in &links {
        let Some((merge, file_name)) = resolve_link(link)
            .and_then(|target| {
                let parent = target.parent()?.to_path_buf();
                let file_name = target.file_name()?.to_str()?.to_string();
                Some((redirects.get(&parent)?, file_name))
            })
        else {
            continue;
        };
        let Some(suffix) = file_name.strip_prefix(merge.removed.as_str()) else {
            continue;
        };
        let new_target = registry.entry(&merge.survivor).artifact(suffix);
        debug!(link = %link.display(), target = %new_target.display(), "Repointing link");
        cache.link(&new_target, link);
        repointed += 1;
    }
    report.repointed_links = repointed;

    if dry_run {
        info!(links = repointed, "Dry run: leaving registry untouched");
        return Ok(report);
    }

    reporter.phase("Committing", || cache.commit())?;
    for merge in &report.merged {
        let dir = registry.entry(&merge.removed).dir;
        fs::remove_dir_all(&dir).map_err(|source| RegistryError::Scan { path: dir, source })?;
    }
    info!(
        merged = report.merged.len(),
        links = repointed,
        "Cleanup finished"
    );
    Ok(report)
}

fn merge_bucket(
    registry: &Registry,
    cache: &mut FileCache,
    names: &[String],
) -> Result<Vec<MergedEntry>, RegistryError> {
    let mut kept: Vec<(String, Structure)> = Vec::new();
    let mut merged = Vec::new();

    for name in names {
        let Some(structure) = registry.load_entry(cache, name)? else {
            continue;
        };
        let mut duplicate_of = None;
        for (kept_name, kept_structure) in &kept {
            if let Some(distance) = registry.compare(&structure, kept_structure)? {
                if distance < registry.config().duplicate_threshold {
                    duplicate_of = Some((kept_name.clone(), distance));
                    break;
                }
            }
        }
        match duplicate_of {
            Some((survivor, distance)) => merged.push(MergedEntry {
                removed: name.clone(),
                survivor,
                distance,
            }),
            None => kept.push((name.clone(), structure)),
        }
    }
    Ok(merged)
}

fn collect_symlinks(dir: &Path, exclude: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for dir_entry in fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();
        let file_type = dir_entry.file_type()?;
        if file_type.is_symlink() {
            out.push(path);
        } else if file_type.is_dir() && !absolute_eq(&path, exclude) {
            collect_symlinks(&path, exclude, out)?;
        }
    }
    Ok(())
}

fn resolve_link(link: &Path) -> Option<PathBuf> {
    let target = fs::read_link(link).ok()?;
    let target = if target.is_absolute() {
        target
    } else {
        link.parent()?.join(target)
    };
    std::path::absolute(target)
        .ok()
        .map(|p| p.components().collect())
}

fn sorted_subdirectories(dir: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    let scan_error = |source| RegistryError::Scan {
        path: dir.to_path_buf(),
        source,
    };
    let mut dirs = Vec::new();
    for dir_entry in fs::read_dir(dir).map_err(scan_error)? {
        let path = dir_entry.map_err(scan_error)?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn contains_geometry(dir: &Path) -> Result<bool, RegistryError> {
    let listing = fs::read_dir(dir).map_err(|source| RegistryError::Scan {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(listing.filter_map(Result::ok).any(|e| {
        e.file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(GEOMETRY_SUFFIX))
    }))
}

fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_file())
        .unwrap_or(false)
}

fn absolute_eq(a: &Path, b: &Path) -> bool {
    match (std::path::absolute(a), std::path::absolute(b)) {
        (Ok(a), Ok(b)) => a.components().eq(b.components()),
        _ => false,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::*;
    use tempfile::tempdir;

    fn config(root: &Path) -> RegistryConfig {
        RegistryConfig::builder()
            .registry_root(root)
            .build()
            .unwrap()
    }

    #[test]
    fn add_calculation_copies_artifacts_without_linking_back() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("db");
        let calc = write_calculation(dir.path(), "p", "calc", WATER, B3LYP_HEADER);
        fs::write(calc.join("calc.cube"), "cube\n").unwrap();
        fs::write(calc.join("other.cube"), "someone else's cube").unwrap();
        fs::write(calc.join("calc.gbw"), "not an artifact").unwrap();

        let mut session = Session::new(config(&root)).unwrap();
        let name = add_calculation(&mut session, &calc).unwrap();
        session.commit().unwrap();

        let entry = session.registry().entry(&name);
        assert_eq!(fs::read_to_string(entry.artifact("_out.out")).unwrap(), "output of calc\n");
        assert_eq!(fs::read_to_string(entry.artifact(".cube")).unwrap(), "cube\n");
        assert_eq!(fs::read_to_string(entry.geometry()).unwrap(), WATER.trim());
        assert_eq!(fs::read_to_string(entry.header()).unwrap(), B3LYP_HEADER.trim());
        assert!(!entry.artifact(".gbw").exists());
        assert!(!entry.artifact(".out").exists());
        assert!(!is_symlink(&calc.join("calc_out.out")));
    }

    #[test]
    fn imported_entries_are_visible_to_later_candidates() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("db");
        let archived = write_calculation(dir.path(), "p", "archived", WATER, B3LYP_HEADER);
        let fresh = write_calculation(dir.path(), "q", "fresh", WATER_RELABELED, B3LYP_HEADER);

        let mut session = Session::new(config(&root)).unwrap();
        let name = add_calculation(&mut session, &archived).unwrap();
        assert_eq!(session.resolve(&fresh).unwrap().entry(), name);
    }

    #[test]
    fn import_workspace_walks_projects_and_skips_registry() {
        let dir = tempdir().unwrap();
        let workspace = dir.path();
        let root = workspace.join("db");
        write_calculation(workspace, "p", "one", WATER, B3LYP_HEADER);
        write_calculation(workspace, "p", "two", AMMONIA, B3LYP_HEADER);
        fs::create_dir_all(workspace.join("p").join("scratch")).unwrap();
        fs::create_dir_all(workspace.join("no_geometry").join("calc")).unwrap();
        fs::write(workspace.join("no_geometry").join("calc").join("calc.inp"), B3LYP_HEADER).unwrap();

        let mut session = Session::new(config(&root)).unwrap();
        let report = import_workspace(&mut session, workspace, &ProgressReporter::new()).unwrap();
        session.commit().unwrap();

        assert_eq!(report.imported.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 2);

        // A second import must not descend into the registry it just filled.
        let mut session = Session::new(config(&root)).unwrap();
        let again = import_workspace(&mut session, workspace, &ProgressReporter::new()).unwrap();
        assert_eq!(again.imported.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn cleanup_merges_later_duplicate_and_repoints_links() {
        let dir = tempdir().unwrap();
        let workspace = dir.path();
        let root = workspace.join("db");
        let first = write_calculation(workspace, "p", "first", WATER, B3LYP_HEADER);
        let second = write_calculation(workspace, "q", "second", WATER_RELABELED, B3LYP_HEADER);

        // Two separate imports produce two entries for the same structure.
        let mut session = Session::new(config(&root)).unwrap();
        let older = add_calculation(&mut session, &first).unwrap();
        let newer = add_calculation(&mut session, &second).unwrap();
        session.commit().unwrap();
        assert!(older < newer);

        let newer_entry = session.registry().entry(&newer);
        let link = second.join("second_out.out");
        fs::remove_file(&link).unwrap();
        std::os::unix::fs::symlink(newer_entry.artifact("_out.out"), &link).unwrap();

        let report = cleanup(&config(&root), workspace, false, &ProgressReporter::new()).unwrap();
        assert_eq!(report.merged.len(), 1);
        assert_eq!(report.merged[0].removed, newer);
        assert_eq!(report.merged[0].survivor, older);
        assert_eq!(report.repointed_links, 1);
        assert_eq!(report.failed_buckets, 0);

        assert!(!newer_entry.dir.exists());
        let older_entry = session.registry().entry(&older);
        assert_eq!(fs::read_link(&link).unwrap(), older_entry.artifact("_out.out"));
        assert_eq!(fs::read_to_string(&link).unwrap(), "output of first\n");
    }

    #[test]
    fn cleanup_dry_run_changes_nothing() {
        let dir = tempdir().unwrap();
        let workspace = dir.path();
        let root = workspace.join("db");
        let first = write_calculation(workspace, "p", "first", WATER, B3LYP_HEADER);
        let second = write_calculation(workspace, "q", "second", WATER, B3LYP_HEADER);

        let mut session = Session::new(config(&root)).unwrap();
        add_calculation(&mut session, &first).unwrap();
        add_calculation(&mut session, &second).unwrap();
        session.commit().unwrap();

        let report = cleanup(&config(&root), workspace, true, &ProgressReporter::new()).unwrap();
        assert_eq!(report.merged.len(), 1);
        assert_eq!(fs::read_dir(&root).unwrap().count(), 2);
    }

    #[test]
    fn cleanup_keeps_distinct_entries() {
        let dir = tempdir().unwrap();
        let workspace = dir.path();
        let root = workspace.join("db");
        let first = write_calculation(workspace, "p", "first", WATER, B3LYP_HEADER);
        let second = write_calculation(workspace, "q", "second", WATER, PBE_HEADER);
        let third = write_calculation(workspace, "r", "third", WATER_STRETCHED, B3LYP_HEADER);

        let mut session = Session::new(config(&root)).unwrap();
        for calc in [&first, &second, &third] {
            add_calculation(&mut session, calc).unwrap();
        }
        session.commit().unwrap();

        let report = cleanup(&config(&root), workspace, false, &ProgressReporter::new()).unwrap();
        assert!(report.merged.is_empty());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 3);
    }
}

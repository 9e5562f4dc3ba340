use crate::engine::error::RegistryError;
use crate::engine::layout::CandidatePaths;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::registry::Resolution;
use crate::engine::session::Session;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Inserted,
    Aliased,
    Failed,
}

/// One row of a [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRecord {
    pub candidate: PathBuf,
    pub outcome: Outcome,
    pub entry: Option<String>,
    pub distance: Option<f64>,
    pub error: Option<String>,
}

impl CandidateRecord {
    fn from_resolution(candidate: PathBuf, resolution: Resolution) -> Self {
        match resolution {
            Resolution::Inserted { entry } => Self {
                candidate,
                outcome: Outcome::Inserted,
                entry: Some(entry),
                distance: None,
                error: None,
            },
            Resolution::Aliased { entry, distance } => Self {
                candidate,
                outcome: Outcome::Aliased,
                entry: Some(entry),
                distance: Some(distance),
                error: None,
            },
        }
    }

    fn failed(candidate: PathBuf, error: &RegistryError) -> Self {
        Self {
            candidate,
            outcome: Outcome::Failed,
            entry: None,
            distance: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Decide every candidate but discard the staged changes instead of committing.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub records: Vec<CandidateRecord>,
    pub committed: bool,
}

impl BatchReport {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for record in &self.records {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Reads every candidate's header and geometry files in parallel.
///
/// Unreadable or absent files are left out; the sequential pass reads them again and
/// reports the failure against the right candidate.
pub fn prefetch(dirs: &[PathBuf]) -> Vec<(PathBuf, String)> {
    dirs.par_iter()
        .filter_map(|dir| CandidatePaths::resolve(dir).ok())
        .flat_map_iter(|paths| paths.prefetch_targets())
        .filter_map(|path| fs::read_to_string(&path).ok().map(|content| (path, content)))
        .collect()
}

/// Resolves every directory in `dirs` through `session`, then commits once.
///
/// A candidate that fails is recorded and skipped; only a failing commit aborts the run.
#[instrument(skip_all, name = "batch_workflow")]
pub fn process_all(
    session: &mut Session,
    dirs: &[PathBuf],
    options: &BatchOptions,
    reporter: &ProgressReporter,
) -> Result<BatchReport, RegistryError> {
    let prefetched = reporter.phase("Prefetching", || prefetch(dirs));
    info!(
        candidates = dirs.len(),
        files = prefetched.len(),
        "Prefetched candidate files"
    );
    for (path, content) in prefetched {
        session.cache_mut().preload(path, &content);
    }

    reporter.report(Progress::PhaseStart { name: "Matching" });
    reporter.report(Progress::TaskStart {
        total_steps: dirs.len() as u64,
    });
    let mut report = BatchReport::default();
    for dir in dirs {
        let record = match session.resolve(dir) {
            Ok(resolution) => CandidateRecord::from_resolution(dir.clone(), resolution),
            Err(e) => {
                warn!(candidate = %dir.display(), error = %e, "Skipping candidate");
                CandidateRecord::failed(dir.clone(), &e)
            }
        };
        reporter.report(Progress::CandidateDone {
            dir: dir.clone(),
            outcome: describe(&record),
        });
        reporter.report(Progress::TaskIncrement);
        report.records.push(record);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    if options.dry_run {
        info!("Dry run: discarding staged changes");
        session.discard();
    } else {
        reporter.phase("Committing", || session.commit())?;
        report.committed = true;
    }

    info!(
        inserted = report.count(Outcome::Inserted),
        aliased = report.count(Outcome::Aliased),
        failed = report.count(Outcome::Failed),
        "Batch finished"
    );
    Ok(report)
}

fn describe(record: &CandidateRecord) -> String {
    match (&record.outcome, &record.entry) {
        (Outcome::Inserted, Some(entry)) => format!("new entry {entry}"),
        (Outcome::Aliased, Some(entry)) => format!("duplicate of {entry}"),
        _ => "failed".to_string(),
    }
}

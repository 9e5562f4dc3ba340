use crate::cli::ProcessArgs;
use crate::config::builder::{self, Overrides};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use geodedup::engine::progress::ProgressReporter;
use geodedup::engine::session::Session;
use geodedup::workflows::batch::{self, BatchOptions, Outcome};
use std::fs::File;
use tracing::info;

pub fn run(args: ProcessArgs, mut overrides: Overrides, show_candidates: bool) -> Result<()> {
    overrides.duplicate_threshold = args.threshold.or(overrides.duplicate_threshold);
    let config = builder::build_config(&overrides)?;
    info!(
        "Using registry at {} (threshold {})",
        builder::display_path(&config.registry_root),
        config.duplicate_threshold
    );

    let mut session = Session::new(config)?;
    let progress_handler = CliProgressHandler::new(show_candidates);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let options = BatchOptions {
        dry_run: args.dry_run,
    };
    let report = batch::process_all(&mut session, &args.dirs, &options, &reporter)?;

    if let Some(path) = &args.report {
        let file = File::create(path)?;
        report
            .write_csv(file)
            .map_err(|e| CliError::Other(e.into()))?;
        info!("Wrote report to {}", path.display());
    }

    println!(
        "{} new entr{}, {} duplicate{}, {} failed{}",
        report.count(Outcome::Inserted),
        if report.count(Outcome::Inserted) == 1 { "y" } else { "ies" },
        report.count(Outcome::Aliased),
        if report.count(Outcome::Aliased) == 1 { "" } else { "s" },
        report.count(Outcome::Failed),
        if args.dry_run { " (dry run, nothing written)" } else { "" }
    );
    for record in report.records.iter().filter(|r| r.outcome == Outcome::Failed) {
        eprintln!(
            "  ✗ {}: {}",
            record.candidate.display(),
            record.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

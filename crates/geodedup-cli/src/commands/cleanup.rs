use crate::cli::CleanupArgs;
use crate::config::builder::{self, Overrides};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use geodedup::engine::progress::ProgressReporter;
use geodedup::workflows::maintenance;

pub fn run(args: CleanupArgs, overrides: Overrides) -> Result<()> {
    if !args.workspace.is_dir() {
        return Err(CliError::Argument(format!(
            "Workspace '{}' is not a directory",
            args.workspace.display()
        )));
    }
    let config = builder::build_config(&overrides)?;

    let progress_handler = CliProgressHandler::default();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let report = maintenance::cleanup(&config, &args.workspace, args.dry_run, &reporter)?;

    for merge in &report.merged {
        println!(
            "  {} -> {} (distance {:.6})",
            merge.removed, merge.survivor, merge.distance
        );
    }
    println!(
        "{} entr{} merged, {} link(s) repointed{}.",
        report.merged.len(),
        if report.merged.len() == 1 { "y" } else { "ies" },
        report.repointed_links,
        if args.dry_run { " (dry run, nothing changed)" } else { "" }
    );
    if report.failed_buckets > 0 {
        eprintln!(
            "Warning: {} bucket(s) could not be compared; see the log for details.",
            report.failed_buckets
        );
    }
    Ok(())
}

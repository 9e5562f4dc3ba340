use crate::cli::ImportArgs;
use crate::config::builder::{self, Overrides};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use geodedup::engine::progress::ProgressReporter;
use geodedup::engine::session::Session;
use geodedup::workflows::maintenance;

pub fn run(args: ImportArgs, overrides: Overrides) -> Result<()> {
    if !args.workspace.is_dir() {
        return Err(CliError::Argument(format!(
            "Workspace '{}' is not a directory",
            args.workspace.display()
        )));
    }
    let config = builder::build_config(&overrides)?;
    let mut session = Session::new(config)?;

    let progress_handler = CliProgressHandler::default();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let report = maintenance::import_workspace(&mut session, &args.workspace, &reporter)?;
    session.commit()?;

    println!(
        "Imported {} calculation(s), {} failed.",
        report.imported.len(),
        report.failed.len()
    );
    for (dir, error) in &report.failed {
        eprintln!("  ✗ {}: {}", dir.display(), error);
    }
    Ok(())
}

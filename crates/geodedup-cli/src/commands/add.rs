use crate::cli::AddArgs;
use crate::config::builder::{self, Overrides};
use crate::error::Result;
use geodedup::engine::session::Session;
use geodedup::workflows::maintenance;
use tracing::{info, warn};

pub fn run(args: AddArgs, overrides: Overrides) -> Result<()> {
    let config = builder::build_config(&overrides)?;
    let mut session = Session::new(config)?;

    let mut added = 0usize;
    for dir in &args.dirs {
        match maintenance::add_calculation(&mut session, dir) {
            Ok(name) => {
                println!("  {} -> {}", dir.display(), name);
                added += 1;
            }
            Err(e) => {
                warn!("Failed to add {}: {}", dir.display(), e);
                eprintln!("  ✗ {}: {}", dir.display(), e);
            }
        }
    }

    if added > 0 {
        session.commit()?;
    }
    info!("Added {} of {} calculation(s).", added, args.dirs.len());
    println!("Added {} of {} calculation(s).", added, args.dirs.len());
    Ok(())
}

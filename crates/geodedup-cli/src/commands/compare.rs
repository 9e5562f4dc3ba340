use crate::cli::MatchArgs;
use crate::error::{CliError, Result};
use geodedup::core::io::traits::GeometryFile;
use geodedup::core::io::xyz::XyzFile;
use geodedup::core::matching::matcher::DistanceMatrixMatcher;
use geodedup::core::models::geometry::Geometry;
use std::path::Path;
use tracing::info;

fn load(path: &Path) -> Result<Geometry> {
    XyzFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

pub fn run(args: MatchArgs) -> Result<()> {
    let first = load(&args.first)?;
    let second = load(&args.second)?;
    info!(
        "Comparing {} ({} atoms) with {} ({} atoms)",
        args.first.display(),
        first.len(),
        args.second.display(),
        second.len()
    );

    let matcher = DistanceMatrixMatcher::new(args.profile.into());
    let result = matcher
        .compare(&first, &second)
        .map_err(|e| CliError::Other(e.into()))?;

    println!("distance: {:.8}", result.distance);
    match &result.correspondence {
        None => println!("incompatible: atom counts or element multisets differ"),
        Some(correspondence) => {
            println!("correspondence (1-based, A -> B):");
            for (a, b) in correspondence.as_slice().iter().enumerate() {
                let element = &first.atoms()[a].element;
                println!("  {:>4} {:<3} -> {:>4}", a + 1, element, b + 1);
            }
        }
    }
    Ok(())
}

//! Builders for on-disk calculation workspaces used across engine and workflow tests.

use std::fs;
use std::path::{Path, PathBuf};

pub const WATER: &str = "3
water
O     0.000000    0.000000    0.117300
H     0.000000    0.757200   -0.469200
H     0.000000   -0.757200   -0.469200
";

/// `WATER` with the atoms listed H, O, H and the whole molecule shifted by +5 Å in x.
pub const WATER_RELABELED: &str = "3
water, renumbered and translated
H     5.000000    0.757200   -0.469200
O     5.000000    0.000000    0.117300
H     5.000000   -0.757200   -0.469200
";

/// Same formula as `WATER` but one O-H bond stretched by 0.2 Å.
pub const WATER_STRETCHED: &str = "3
stretched water
O     0.000000    0.000000    0.117300
H     0.000000    0.957200   -0.469200
H     0.000000   -0.757200   -0.469200
";

pub const AMMONIA: &str = "4
ammonia
N     0.000000    0.000000    0.000000
H     0.000000    0.939700    0.381000
H     0.813800   -0.469800    0.381000
H    -0.813800   -0.469800    0.381000
";

pub const B3LYP_HEADER: &str = "! B3LYP def2-SVP
%maxcore 4000
%pal nprocs 4 end
* xyzfile 0 1 calc.xyz
";

pub const PBE_HEADER: &str = "! PBE def2-SVP
%pal nprocs 4 end
";

/// Writes a calculation `<workspace>/<project>/<calc>` whose geometry sits at the
/// project level, plus one output artifact. Returns the calculation directory.
pub fn write_calculation(
    workspace: &Path,
    project: &str,
    calc: &str,
    geometry: &str,
    header: &str,
) -> PathBuf {
    let project_dir = workspace.join(project);
    let calc_dir = project_dir.join(calc);
    fs::create_dir_all(&calc_dir).unwrap();
    fs::write(project_dir.join(format!("{calc}.xyz")), geometry).unwrap();
    fs::write(calc_dir.join(format!("{calc}.inp")), header).unwrap();
    fs::write(
        calc_dir.join(format!("{calc}_out.out")),
        format!("output of {calc}\n"),
    )
    .unwrap();
    calc_dir
}

pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

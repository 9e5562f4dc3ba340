use clap::{Args, Parser, Subcommand, ValueEnum};
use geodedup::core::matching::matcher::ProfileMode;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "geodedup - deduplicate quantum-chemistry calculations by molecular geometry and share their artifacts through a canonical registry.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to read candidate files ahead of matching.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Path to a registry configuration file in TOML format.
    /// Defaults to ./geodedup.toml when that file exists.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Registry root directory, overriding the configuration file.
    #[arg(short, long, global = true, value_name = "DIR")]
    pub registry: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S header.prefix-length=40
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", global = true)]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deduplicate calculation directories against the registry, aliasing duplicates
    /// and creating entries for everything new.
    Process(ProcessArgs),
    /// Copy finished calculations into the registry as new entries, unconditionally.
    Add(AddArgs),
    /// Copy every calculation of a <workspace>/<project>/<calc> tree into the registry.
    Import(ImportArgs),
    /// Merge registry entries that duplicate each other and repoint workspace links.
    Cleanup(CleanupArgs),
    /// Compare two XYZ geometries and print their distance and atom correspondence.
    Match(MatchArgs),
}

/// Arguments for the `process` subcommand.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Calculation directories; each must hold <name>.inp and a <name>.xyz geometry
    /// either inside it or next to it.
    #[arg(required = true, value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Decide every candidate but write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Write a per-candidate CSV report to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Override the duplicate distance threshold.
    #[arg(short, long, value_name = "FLOAT")]
    pub threshold: Option<f64>,
}

/// Arguments for the `add` subcommand.
#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(required = true, value_name = "DIR")]
    pub dirs: Vec<PathBuf>,
}

/// Arguments for the `import` subcommand.
#[derive(Args, Debug)]
pub struct ImportArgs {
    #[arg(value_name = "WORKSPACE")]
    pub workspace: PathBuf,
}

/// Arguments for the `cleanup` subcommand.
#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Root under which symlinks into merged entries are searched for.
    #[arg(value_name = "WORKSPACE")]
    pub workspace: PathBuf,

    /// Report the merges that would happen without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `match` subcommand.
#[derive(Args, Debug)]
pub struct MatchArgs {
    #[arg(value_name = "A.xyz")]
    pub first: PathBuf,

    #[arg(value_name = "B.xyz")]
    pub second: PathBuf,

    /// How distance-matrix rows are compared.
    #[arg(long, value_enum, default_value_t = ProfileArg::Sorted)]
    pub profile: ProfileArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileArg {
    /// Rows in file order; only valid for identically numbered geometries.
    Positional,
    /// Rows sorted ascending; independent of atom numbering.
    Sorted,
}

impl From<ProfileArg> for ProfileMode {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Positional => ProfileMode::Positional,
            ProfileArg::Sorted => ProfileMode::Sorted,
        }
    }
}

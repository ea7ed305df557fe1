use clap::{Args, Parser, Subcommand};
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
    about = "dipolar - evaluate long-range magnetic dipole-dipole interactions of particle configurations in a periodic box.",
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

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate dipolar forces, torques, energies and pressure for a particle file.
    Evaluate(EvaluateArgs),
}

/// Arguments for the `evaluate` subcommand.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    // --- Core Arguments ---
    /// Path to the input particle table (CSV with x,y,z,dipm,ox,oy,oz columns).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output particle table including forces and torques.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to the run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Interaction Overrides ---
    /// Override the dipolar method (e.g., 'direct-sum', 'all-with-all-no-replica').
    #[arg(short, long, value_name = "NAME")]
    pub method: Option<String>,

    /// Override the dipolar prefactor.
    #[arg(short, long, value_name = "FLOAT")]
    pub prefactor: Option<f64>,

    /// Override the number of periodic replicas summed by direct summation.
    #[arg(short = 'n', long, value_name = "INT", allow_negative_numbers = true)]
    pub replica_cutoff: Option<i64>,

    // --- Geometry Overrides ---
    /// Use a cubic, fully periodic box with this edge length.
    #[arg(short = 'L', long, value_name = "FLOAT")]
    pub box_length: Option<f64>,

    /// Skip the pressure contribution.
    #[arg(long)]
    pub no_pressure: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S interaction.method.replica-cutoff=2
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_evaluate_with_overrides() {
        let cli = Cli::try_parse_from([
            "dipolar",
            "-vv",
            "evaluate",
            "-i",
            "particles.csv",
            "--method",
            "direct-sum",
            "-n",
            "2",
            "-S",
            "rotation=false",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Evaluate(args) = cli.command;
        assert_eq!(args.input, PathBuf::from("particles.csv"));
        assert_eq!(args.method.as_deref(), Some("direct-sum"));
        assert_eq!(args.replica_cutoff, Some(2));
        assert_eq!(args.set_values, vec!["rotation=false".to_string()]);
        assert!(!args.no_pressure);
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["dipolar", "evaluate"]).is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["dipolar", "-q", "-v", "evaluate", "-i", "p.csv"]);
        assert!(result.is_err());
    }
}

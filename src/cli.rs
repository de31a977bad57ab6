//! Command-line interface implementation for tmplpress.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments structure for tmplpress.
#[derive(Parser, Debug)]
#[command(author, version, about = "tmplpress: press new projects from templates", long_about = None)]
pub struct Args {
    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding config.json instead of the platform default
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Press a template into a new output directory
    Press(PressArgs),

    /// Perform operations on the template manifest file
    #[command(subcommand)]
    Manifest(ManifestCommand),

    /// Read or change user settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print the highest version tag of a remote repository
    LatestTag {
        #[arg(value_name = "LOCATION")]
        location: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct PressArgs {
    /// Path to the template directory or git repository URL
    #[arg(long, value_name = "TEMPLATE")]
    pub tmpl_path: String,

    /// Directory where the generated project will be created
    #[arg(long, value_name = "OUTPUT_DIR")]
    pub out_path: PathBuf,

    /// JSON file with answers for the template placeholders
    #[arg(long, value_name = "FILE")]
    pub answer_path: Option<PathBuf>,

    /// Branch, tag or full ref to press (e.g. refs/tags/1.2.0)
    #[arg(long, value_name = "REF")]
    pub branch: Option<String>,

    /// How the template path is read
    #[arg(long, value_enum, default_value_t = TemplateType::Git)]
    pub tmpl_type: TemplateType,

    /// Force overwrite of existing output directory
    #[arg(short, long)]
    pub force: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateType {
    /// Clone the template into the cache directory first
    Git,
    /// Use the directory as it is
    Dir,
}

#[derive(Subcommand, Debug)]
pub enum ManifestCommand {
    /// Generate or update template.json with every placeholder found in the template
    Generate {
        /// template.json or the template directory; defaults to the current directory
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Remove placeholders that no longer appear in the template
        #[arg(long)]
        prune: bool,
    },
    /// Validate a template.json against the schema and its template
    Validate {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print a setting
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Change a setting
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 and the help of the invoked (sub)command if required
///   arguments or a subcommand are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if is_missing_input(&e) {
                let _ = e.print();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}

/// Whether a parse error means the user left out required input.
pub fn is_missing_input(e: &clap::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::MissingRequiredArgument
            | ErrorKind::MissingSubcommand
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

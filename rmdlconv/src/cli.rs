//! Root CLI structure for rmdlconv

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rmdlconv")]
#[command(about = "Convert studio model and sequence assets between format versions", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upgrade a model to a specific target generation
    Upgrade {
        /// Path to the model file
        model: PathBuf,

        /// Target generation version integer (e.g. 53, 54)
        #[arg(short, long)]
        target_version: i32,

        /// Directory to write the converted model into instead of
        /// overwriting the input
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Source sub-version string, consulted for RMDL inputs
        /// (e.g. "12.1", "rmdl v14")
        #[arg(long)]
        version: Option<String>,
    },

    /// Auto-detect an asset's version and convert it to the newest
    /// supported layout, prompting for anything undetectable
    Convert {
        /// Path to a .mdl/.rmdl model or .rseq sequence file
        path: PathBuf,

        /// Source version string for RMDL or sequence inputs
        #[arg(long)]
        version: Option<String>,
    },
}

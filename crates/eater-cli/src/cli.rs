//! Command-line definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eater_types::RpsSign;

/// Server used when neither `--server` nor `EATER_SERVER` is given.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

/// Talk to a running entropy eater.
#[derive(Debug, Parser)]
#[command(name = "eater")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the eater server
    #[arg(long, global = true, env = "EATER_SERVER", default_value = DEFAULT_SERVER)]
    pub server: String,

    /// The command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// What to ask of the eater.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Say hello to the eater
    Hello,

    /// Feed the eater some bytes
    Feed {
        /// Food given on the command line
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        food: Option<String>,

        /// Read the food from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Clean up after the eater
    Sweep,

    /// Clear an infection
    Disinfect,

    /// Treat an illness
    Cure,

    /// Play rock-paper-scissors
    Rps {
        /// Your sign: rock, paper or scissors
        #[arg(long)]
        sign: RpsSign,
    },

    /// Show status attributes
    Status {
        /// A single attribute; all of them when omitted
        name: Option<String>,
    },
}

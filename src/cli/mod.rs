// src/cli/mod.rs
//! CLI definitions for krawler
//!
//! The command implementations live in the `commands` module.

use clap::{Parser, Subcommand};
use krawler::output::Format;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "krawler")]
#[command(author = "Krawler Contributors")]
#[command(version)]
#[command(about = "Discover kernel header packages across Linux distribution mirrors", long_about = None)]
pub struct Cli {
    /// Config file with per-distribution overrides (TOML, or YAML by extension)
    /// [default: $HOME/.krawler.yaml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, global = true)]
    pub verbosity: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the kernel releases a distribution publishes headers for
    #[command(visible_alias = "ls")]
    List {
        /// Distribution name (see `krawler distros`)
        distro: String,

        /// Output format: text, json or yaml
        #[arg(short, long)]
        output: Option<Format>,

        /// Download matching packages and read the compiler version from their .config
        #[arg(long)]
        compiler_version: bool,

        /// Do not draw a progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// List the supported distributions
    Distros,
}

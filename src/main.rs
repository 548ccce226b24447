// src/main.rs

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use commands::ListOptions;
use krawler::output::Format;
use krawler::repository::KrawlerConfig;
use tracing_subscriber::EnvFilter;

/// Log directive for a verbosity name; `fatal` and `panic` map to `error`
fn log_directive(level: &str) -> &str {
    match level {
        "fatal" | "panic" => "error",
        other => other,
    }
}

fn init_tracing(verbosity: Option<&str>) -> Result<()> {
    let filter = match verbosity {
        Some(level) => EnvFilter::try_new(log_directive(level))
            .with_context(|| format!("Invalid verbosity '{level}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => KrawlerConfig::load(path)?,
        None => match KrawlerConfig::default_path() {
            Some(path) => KrawlerConfig::load_if_present(&path)?,
            None => KrawlerConfig::default(),
        },
    };

    let verbosity = cli.verbosity.clone().or_else(|| config.output.verbosity.clone());
    init_tracing(verbosity.as_deref())?;

    match cli.command {
        Commands::List {
            distro,
            output,
            compiler_version,
            no_progress,
        } => {
            let format = match output {
                Some(format) => format,
                None => config
                    .output
                    .format
                    .as_deref()
                    .map(str::parse::<Format>)
                    .transpose()?
                    .unwrap_or_default(),
            };
            let options = ListOptions {
                format,
                compiler_version,
                progress: !no_progress,
            };
            commands::cmd_list(&distro, &config, &options).await
        }
        Commands::Distros => commands::cmd_distros(),
    }
}

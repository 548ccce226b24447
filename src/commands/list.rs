// src/commands/list.rs

//! Kernel release listing

use anyhow::Result;
use krawler::distro::{self, KERNEL_CONFIG_FILE};
use krawler::output::{self, Format};
use krawler::progress::{BarProgress, LogProgress, ProgressTracker};
use krawler::repository::{KrawlerConfig, RepositoryClient};
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Flags of the `list` command
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub format: Format,
    pub compiler_version: bool,
    pub progress: bool,
}

fn tracker(name: &str, progress: bool) -> Arc<dyn ProgressTracker> {
    if progress && std::io::stderr().is_terminal() {
        Arc::new(BarProgress::new(name))
    } else {
        Arc::new(LogProgress::new(name))
    }
}

/// Search a distribution and print its kernel releases
pub async fn cmd_list(name: &str, config: &KrawlerConfig, options: &ListOptions) -> Result<()> {
    let distro = distro::by_name(name).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown distribution '{}'. Supported: {}",
            name,
            distro::names().join(", ")
        )
    })?;

    let user = config.distro(distro.name());
    let client = RepositoryClient::new()?;

    let mut filter = distro.filter();
    if options.compiler_version {
        filter = filter.with_file_names([KERNEL_CONFIG_FILE]);
    }

    info!("Searching {} for {}", distro.name(), filter);
    let progress = tracker(distro.name(), options.progress);
    let report = distro::search_with(distro.as_ref(), &user, filter, &client, Arc::clone(&progress))
        .await;
    let report = match report {
        Ok(report) => report,
        Err(e) => {
            progress.abandon(&e.to_string());
            return Err(e.into());
        }
    };

    if report.all_failed() {
        progress.abandon("every search failed");
        for e in &report.errors {
            error!("{}", e);
        }
        anyhow::bail!(
            "All {} searches for {} failed",
            report.searched,
            distro.name()
        );
    }
    if let Some(e) = report.partial_failure() {
        warn!("{}: {}", distro.name(), e);
    }

    let releases = report.releases();
    progress.finish(&format!("{} releases", releases.len()));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    output::encode(&mut out, &releases, options.format)?;
    Ok(())
}

/// Print the supported distributions
pub fn cmd_distros() -> Result<()> {
    println!("{:<18} {:<10} HEADERS", "NAME", "ECOSYSTEM");
    println!("{}", "-".repeat(45));
    for distro in distro::all() {
        println!(
            "{:<18} {:<10} {}",
            distro.name(),
            distro.ecosystem().to_string(),
            distro.headers_package()
        );
    }
    Ok(())
}

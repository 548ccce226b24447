// src/distro/search.rs

//! End-to-end search for one distribution
//!
//! Seeds are resolved from the merged configuration, mirror-list references
//! are dereferenced when the distribution publishes them, and the seed URLs
//! are fanned out to the ecosystem's backend. Failures of individual
//! producers are collected in the report instead of aborting the search.

use super::{Distro, Ecosystem};
use crate::coordinator::{Aggregate, SearchCoordinator};
use crate::crawler::HttpCrawler;
use crate::error::{Error, Result};
use crate::kernelrelease::{releases_from_packages, KernelRelease};
use crate::packages::{alpm, deb, rpm, Package, PackageSet, SearchFilter};
use crate::progress::ProgressTracker;
use crate::repository::resolver::{join_url, Resolver};
use crate::repository::{DistroConfig, RepositoryClient};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File holding a repository's real location below a mirror-list reference
const MIRROR_LIST_FILE: &str = "mirror.list";

/// Outcome of a distribution search
#[derive(Debug, Default)]
pub struct SearchReport {
    /// Matching packages, deduplicated across mirrors
    pub packages: PackageSet,
    pub errors: Vec<Error>,
    /// Producers run over all stages (mirror lists and repositories)
    pub searched: usize,
    /// Producers that failed
    pub failed: usize,
}

impl SearchReport {
    fn absorb<T>(&mut self, aggregate: Aggregate<T>) -> Vec<T> {
        self.searched += aggregate.producers;
        self.failed += aggregate.failed;
        self.errors.extend(aggregate.errors);
        aggregate.items
    }

    /// Every producer failed; an empty search is not a failure
    pub fn all_failed(&self) -> bool {
        self.failed > 0 && self.failed == self.searched
    }

    pub fn partial_failure(&self) -> Option<Error> {
        if self.failed > 0 && self.failed < self.searched {
            Some(Error::PartialFailure {
                failed: self.failed,
                total: self.searched,
            })
        } else {
            None
        }
    }

    /// Kernel releases of the packages found
    pub fn releases(&self) -> Vec<KernelRelease> {
        releases_from_packages(self.packages.as_slice())
    }
}

fn dedup(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

/// First non-empty line of a mirror list
pub fn first_mirror(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Resolve `<url>/<arch>/mirror.list` references to repository URLs
///
/// One producer runs per reference and architecture. A reference that cannot
/// be fetched or is empty is recorded as an error in the aggregate.
pub async fn dereference_mirror_lists(
    client: &RepositoryClient,
    urls: &[String],
    archs: &[String],
) -> Result<Aggregate<String>> {
    let mut coordinator = SearchCoordinator::silent(urls.len() * archs.len());

    for url in urls {
        for arch in archs {
            let client = client.clone();
            let list_url = join_url(url, &format!("{arch}/{MIRROR_LIST_FILE}"));
            coordinator.spawn(move |producer| async move {
                let text = client.fetch_text(&list_url).await?;
                let mirror = first_mirror(&text).ok_or_else(|| {
                    Error::ParseError(format!("Mirror list {list_url} is empty"))
                })?;
                debug!("{} -> {}", list_url, mirror);
                producer.send(vec![mirror.to_string()]);
                Ok(())
            })?;
        }
    }

    coordinator.wait_and_close().await
}

/// Search `distro` for its kernel header packages
pub async fn search(
    distro: &dyn Distro,
    user: &DistroConfig,
    client: &RepositoryClient,
    progress: Arc<dyn ProgressTracker>,
) -> Result<SearchReport> {
    search_with(distro, user, distro.filter(), client, progress).await
}

/// Search `distro` with a caller-supplied filter
///
/// The effective configuration's architectures narrow the filter unless it
/// already names some; Debian components are taken from the repositories.
pub async fn search_with(
    distro: &dyn Distro,
    user: &DistroConfig,
    filter: SearchFilter,
    client: &RepositoryClient,
    progress: Arc<dyn ProgressTracker>,
) -> Result<SearchReport> {
    let crawler = HttpCrawler::new(client.clone());
    let resolution = Resolver::new(&crawler)
        .with_version_source(distro.version_source())
        .with_version_layout(distro.version_layout())
        .with_repository_layout(distro.repository_layout())
        .resolve(&distro.default_config(), user)
        .await?;

    let mut filter = filter;
    if filter.architectures.is_empty() {
        filter = filter.with_architectures(resolution.config.archs.iter().cloned());
    }
    if !resolution.components.is_empty() {
        filter = filter.with_components(resolution.components.iter().cloned());
    }

    let mut report = SearchReport::default();
    let mut urls: Vec<String> = resolution.seeds.into_iter().map(|s| s.url).collect();

    if distro.uses_mirror_lists() {
        let aggregate = dereference_mirror_lists(client, &urls, &resolution.config.archs).await?;
        if let Some(e) = aggregate.partial_failure() {
            warn!("{}: {}", distro.name(), e);
        }
        urls = report.absorb(aggregate);
    }
    let urls = dedup(urls);
    info!("Searching {} {} repositories of {}", urls.len(), distro.ecosystem(), distro.name());

    let aggregate = match distro.ecosystem() {
        Ecosystem::Rpm => rpm::search_packages(client, &urls, &filter, progress).await?,
        Ecosystem::Deb => deb::search_packages(client, &urls, &filter, progress).await?,
        Ecosystem::Alpm => alpm::search_packages(client, &urls, &filter, progress).await?,
    };

    let packages: Vec<Box<dyn Package>> = report.absorb(aggregate);
    report.packages = packages.into_iter().collect();

    for error in &report.errors {
        debug!("{}: {}", distro.name(), error);
    }
    info!(
        "{}: {} packages, {} of {} producers failed",
        distro.name(),
        report.packages.len(),
        report.failed,
        report.searched
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_mirror() {
        let text = "\n  https://cdn.example.com/al2023/core/guids/abc/x86_64/\nhttps://other/\n";
        assert_eq!(first_mirror(text), Some("https://cdn.example.com/al2023/core/guids/abc/x86_64/"));
        assert_eq!(first_mirror(" \n\n"), None);
    }

    #[test]
    fn test_dedup_keeps_order() {
        let urls = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(dedup(urls), vec!["b", "a"]);
    }

    #[test]
    fn test_report_accounting() {
        let mut report = SearchReport::default();
        let items = report.absorb(Aggregate {
            items: vec!["x".to_string()],
            errors: vec![Error::DownloadError("404".to_string())],
            producers: 2,
            failed: 1,
        });
        assert_eq!(items, vec!["x"]);
        assert!(!report.all_failed());
        assert!(matches!(
            report.partial_failure(),
            Some(Error::PartialFailure { failed: 1, total: 2 })
        ));

        assert!(!SearchReport::default().all_failed());
        assert!(SearchReport::default().partial_failure().is_none());
    }
}

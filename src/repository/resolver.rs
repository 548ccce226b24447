// src/repository/resolver.rs

//! Seed URL resolution
//!
//! Turns a distribution's default configuration plus the operator's
//! overrides into the concrete repository URLs the search fans out over:
//!
//! 1. merge user config over defaults
//! 2. sanitize mirror URLs
//! 3. resolve versions (configured, crawled or none for rolling distros)
//! 4. build version roots from mirrors × versions
//! 5. expand repository URI templates
//! 6. compose version roots × repository suffixes
//!
//! Any failure aborts the whole resolution.

use super::config::{DistroConfig, Mirror, Repository};
use crate::crawler::FolderCrawler;
use crate::error::{Error, Result};
use crate::template::{self, Inventory};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};
use url::Url;

/// Where a distribution's versions come from when none are configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    /// Versions must be configured (defaults or user)
    Static,
    /// Crawl `<mirror><under>` for folders matching `pattern`
    Crawl {
        pattern: &'static str,
        under: &'static str,
        recursive: bool,
    },
    /// No versions; mirror roots are the version roots
    Rolling,
}

/// How a version is placed below a mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionLayout {
    /// `<mirror><version>/`
    Direct,
    /// `<mirror>dists/<version>/`
    Dists,
}

/// What repository entries name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryLayout {
    /// Path suffixes appended to every version root
    Paths,
    /// Archive components (Debian `main`, `contrib`, ...), not part of the URL
    Components,
}

/// A concrete repository URL to search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUrl {
    pub url: String,
    /// Distribution version the URL belongs to; `None` for rolling distros
    pub version: Option<String>,
    /// Template variable values that produced the URL
    pub bindings: BTreeMap<String, String>,
}

/// Outcome of a resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Effective configuration after merge and sanitize
    pub config: DistroConfig,
    pub seeds: Vec<SeedUrl>,
    /// Expanded components for [`RepositoryLayout::Components`]
    pub components: Vec<String>,
}

/// Replace a user list wholesale when it is empty or has an incomplete entry
///
/// Kept for compatibility: a single blank entry discards every other entry
/// the user configured.
fn merge_list<T: Clone>(user: &[T], default: &[T], incomplete: impl Fn(&T) -> bool) -> Vec<T> {
    if user.is_empty() {
        return default.to_vec();
    }
    if user.iter().any(incomplete) {
        warn!("Configured list has an incomplete entry, falling back to defaults");
        return default.to_vec();
    }
    user.to_vec()
}

fn dedup_repositories(repositories: Vec<Repository>) -> Vec<Repository> {
    let mut seen = HashSet::new();
    repositories
        .into_iter()
        .filter(|r| seen.insert(r.uri.clone()))
        .collect()
}

/// Merge user overrides over defaults
pub fn merge(default: &DistroConfig, user: &DistroConfig) -> DistroConfig {
    let mirrors = merge_list(&user.mirrors, &default.mirrors, |m: &Mirror| m.url.is_empty());
    let repositories = dedup_repositories(merge_list(
        &user.repositories,
        &default.repositories,
        |r: &Repository| r.uri.is_empty(),
    ));
    let archs = merge_list(&user.archs, &default.archs, |a: &String| a.is_empty());
    let versions = match (&user.versions, &default.versions) {
        (Some(user), Some(default)) => Some(merge_list(user, default, |v: &String| v.is_empty())),
        (Some(user), None) if !user.is_empty() && user.iter().all(|v| !v.is_empty()) => {
            Some(user.clone())
        }
        _ => default.versions.clone(),
    };

    let mut vars = default.vars.clone();
    vars.extend(user.vars.clone());

    DistroConfig {
        mirrors,
        repositories,
        archs,
        versions,
        vars,
    }
}

/// Normalise mirror URLs to exactly one trailing `/` and validate them
pub fn sanitize(config: &mut DistroConfig) -> Result<()> {
    for mirror in &mut config.mirrors {
        let trimmed = mirror.url.trim().trim_end_matches('/');
        let normalized = format!("{trimmed}/");
        Url::parse(&normalized).map_err(|e| {
            Error::ConfigError(format!("Invalid mirror URL '{}': {e}", mirror.url))
        })?;
        mirror.url = normalized;
    }
    Ok(())
}

/// Join URL segments with exactly one `/` between them
pub fn join_url(base: &str, suffix: &str) -> String {
    let suffix = suffix.trim_start_matches('/');
    if suffix.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), suffix)
}

fn version_root(mirror: &str, version: &str, layout: VersionLayout) -> String {
    let version = version.trim_matches('/');
    let base = match layout {
        VersionLayout::Direct => mirror.to_string(),
        VersionLayout::Dists => join_url(mirror, "dists/"),
    };
    if version.is_empty() {
        base
    } else {
        join_url(&base, &format!("{version}/"))
    }
}

/// Expand repository URIs into `(suffix, bindings)`, literal URIs unchanged
pub fn expand_repositories(
    repositories: &[Repository],
    inventory: &Inventory,
) -> Result<Vec<(String, BTreeMap<String, String>)>> {
    let mut seen = HashSet::new();
    let mut suffixes = Vec::new();

    for repository in repositories {
        let expanded = if template::has_placeholders(&repository.uri) {
            template::multiplex_with_bindings(&repository.uri, inventory)?
                .into_iter()
                .map(|e| (e.value, e.bindings))
                .collect()
        } else {
            vec![(repository.uri.clone(), BTreeMap::new())]
        };

        for (suffix, bindings) in expanded {
            if seen.insert(suffix.clone()) {
                suffixes.push((suffix, bindings));
            }
        }
    }
    Ok(suffixes)
}

/// Resolves seed URLs for one distribution
pub struct Resolver<'a> {
    crawler: &'a dyn FolderCrawler,
    versions: VersionSource,
    version_layout: VersionLayout,
    repository_layout: RepositoryLayout,
}

impl<'a> Resolver<'a> {
    pub fn new(crawler: &'a dyn FolderCrawler) -> Self {
        Self {
            crawler,
            versions: VersionSource::Static,
            version_layout: VersionLayout::Direct,
            repository_layout: RepositoryLayout::Paths,
        }
    }

    pub fn with_version_source(mut self, source: VersionSource) -> Self {
        self.versions = source;
        self
    }

    pub fn with_version_layout(mut self, layout: VersionLayout) -> Self {
        self.version_layout = layout;
        self
    }

    pub fn with_repository_layout(mut self, layout: RepositoryLayout) -> Self {
        self.repository_layout = layout;
        self
    }

    async fn resolve_versions(&self, config: &DistroConfig) -> Result<Option<Vec<String>>> {
        if let VersionSource::Rolling = self.versions {
            return Ok(None);
        }
        if let Some(versions) = &config.versions {
            if versions.is_empty() {
                return Err(Error::ConfigError("no versions specified".to_string()));
            }
            return Ok(Some(versions.clone()));
        }

        let VersionSource::Crawl {
            pattern,
            under,
            recursive,
        } = self.versions
        else {
            return Err(Error::ConfigError("no versions specified".to_string()));
        };

        let seeds = config
            .mirrors
            .iter()
            .map(|m| {
                Url::parse(&join_url(&m.url, under)).map_err(|e| {
                    Error::ConfigError(format!("Invalid mirror URL '{}': {e}", m.url))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let crawled = self.crawler.crawl_folders(&seeds, pattern, recursive).await?;
        if crawled.is_empty() {
            return Err(Error::ConfigError(
                "no versions found on the configured mirrors".to_string(),
            ));
        }
        info!("Discovered {} versions", crawled.len());
        Ok(Some(crawled))
    }

    /// Produce the seed URLs for `user` overrides over `default`
    pub async fn resolve(&self, default: &DistroConfig, user: &DistroConfig) -> Result<Resolution> {
        let mut config = merge(default, user);
        sanitize(&mut config)?;
        if config.mirrors.is_empty() {
            return Err(Error::ConfigError("no mirrors configured".to_string()));
        }

        let versions = self.resolve_versions(&config).await?;

        let mut roots: Vec<(String, Option<String>)> = Vec::new();
        for mirror in &config.mirrors {
            match &versions {
                Some(versions) => {
                    for version in versions {
                        roots.push((
                            version_root(&mirror.url, version, self.version_layout),
                            Some(version.clone()),
                        ));
                    }
                }
                None => roots.push((mirror.url.clone(), None)),
            }
        }

        let mut inventory = config.inventory();
        if let (None, Some(crawled)) = (&config.versions, &versions) {
            if !config.vars.contains_key("versions") {
                inventory.insert("versions", crawled.iter());
            }
        }
        let expanded = expand_repositories(&config.repositories, &inventory)?;

        let mut seen = HashSet::new();
        let mut seeds = Vec::new();
        let mut components = Vec::new();
        let mut push = |seed: SeedUrl| {
            if seen.insert(seed.url.clone()) {
                seeds.push(seed);
            }
        };

        match self.repository_layout {
            RepositoryLayout::Paths => {
                for (root, version) in &roots {
                    for (suffix, bindings) in &expanded {
                        push(SeedUrl {
                            url: join_url(root, suffix),
                            version: version.clone(),
                            bindings: bindings.clone(),
                        });
                    }
                }
            }
            RepositoryLayout::Components => {
                components = expanded
                    .iter()
                    .map(|(c, _)| c.trim_matches('/').to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                for (root, version) in &roots {
                    push(SeedUrl {
                        url: root.clone(),
                        version: version.clone(),
                        bindings: BTreeMap::new(),
                    });
                }
            }
        }

        debug!("Resolved {} seed URLs", seeds.len());
        Ok(Resolution {
            config,
            seeds,
            components,
        })
    }
}

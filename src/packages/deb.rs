// src/packages/deb.rs

//! Debian archive backend
//!
//! A dist (`<mirror>dists/<version>/`) publishes an `InRelease` file (or an
//! unsigned `Release`) listing every index below it. The backend picks the
//! `Packages` indices of the wanted components and architectures, then
//! searches each one in its own producer.

use crate::coordinator::{Aggregate, Producer, SearchCoordinator};
use crate::error::{Error, Result};
use crate::packages::common::PackageMetadata;
use crate::packages::traits::{Package, PackageFormat};
use crate::packages::SearchFilter;
use crate::progress::ProgressTracker;
use crate::repository::resolver::join_url;
use crate::repository::RepositoryClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

const SIGNED_HEADER: &str = "-----BEGIN PGP SIGNED MESSAGE-----";
const SIGNATURE_HEADER: &str = "-----BEGIN PGP SIGNATURE-----";
const INSTALLER: &str = "debian-installer";

/// Debian binary package from a `Packages` index
#[derive(Debug, Clone)]
pub struct DebPackage {
    meta: PackageMetadata,
    component: String,
}

impl DebPackage {
    /// Archive component (`main`, `contrib`, ...) of the index it came from
    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Package for DebPackage {
    fn metadata(&self) -> &PackageMetadata {
        &self.meta
    }

    fn format(&self) -> PackageFormat {
        PackageFormat::Deb
    }
}

/// Body of a clearsigned message, or the text unchanged if unsigned
pub fn strip_clearsign(text: &str) -> &str {
    let Some(rest) = text.trim_start().strip_prefix(SIGNED_HEADER) else {
        return text;
    };
    // Armor headers ("Hash: SHA512") end at the first blank line
    let body = match rest.find("\n\n") {
        Some(pos) => &rest[pos + 2..],
        None => rest,
    };
    match body.find(SIGNATURE_HEADER) {
        Some(pos) => &body[..pos],
        None => body,
    }
}

/// Header of a Release file as written
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReleaseFields {
    #[serde(default)]
    suite: String,
    #[serde(default)]
    codename: String,
    #[serde(default)]
    components: String,
    #[serde(default)]
    architectures: String,
    #[serde(default, rename = "SHA256")]
    sha256: String,
    #[serde(default, rename = "MD5Sum")]
    md5sum: String,
}

/// One stanza of a `Packages` index; other fields are ignored
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Stanza {
    #[serde(default)]
    package: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    architecture: String,
    #[serde(default)]
    filename: String,
}

/// Deserialize every stanza of a deb822 document
fn stanzas<T: DeserializeOwned>(text: &str, what: &str) -> Result<Vec<T>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    rfc822_like::from_str(text).map_err(|e| Error::ParseError(format!("Invalid {what}: {e}")))
}

/// A file listed in a Release file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub path: String,
    pub size: u64,
}

/// Fields of a Release file the search needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Release {
    pub suite: String,
    pub components: Vec<String>,
    pub architectures: Vec<String>,
    pub files: Vec<ReleaseEntry>,
}

fn words(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

/// Parse an `InRelease` or `Release` file
pub fn parse_release(text: &str) -> Result<Release> {
    let Some(fields) = stanzas::<ReleaseFields>(strip_clearsign(text), "Release file")?
        .into_iter()
        .next()
    else {
        return Err(Error::ParseError("empty Release file".to_string()));
    };

    // SHA256 and MD5Sum list the same files; take whichever is present
    let listing = if fields.sha256.trim().is_empty() {
        &fields.md5sum
    } else {
        &fields.sha256
    };
    if listing.trim().is_empty() {
        return Err(Error::ParseError("Release file lists no indices".to_string()));
    }

    let files = listing
        .lines()
        .filter_map(|line| match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            [_, size, path] => Some(ReleaseEntry {
                path: path.to_string(),
                size: size.parse().unwrap_or(0),
            }),
            _ => None,
        })
        .collect();

    let suite = if fields.suite.is_empty() {
        fields.codename
    } else {
        fields.suite
    };

    Ok(Release {
        suite,
        components: words(&fields.components),
        architectures: words(&fields.architectures),
        files,
    })
}

/// A `Packages` index chosen for searching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagesIndex {
    /// Path relative to the dist
    pub path: String,
    pub component: String,
    pub arch: String,
    /// Belongs to the installer, searched only on request
    pub installer: bool,
}

fn codec_rank(file_name: &str) -> Option<u8> {
    match file_name {
        "Packages.xz" => Some(0),
        "Packages.gz" => Some(1),
        "Packages" => Some(2),
        _ => None,
    }
}

/// One `Packages` index per directory, best compression first
///
/// Directories outside the filter's components or architectures are left out.
pub fn select_indices(release: &Release, filter: &SearchFilter) -> Vec<PackagesIndex> {
    let mut best: BTreeMap<&str, (u8, &str)> = BTreeMap::new();

    for entry in &release.files {
        let Some((dir, file_name)) = entry.path.rsplit_once('/') else {
            continue;
        };
        let Some(rank) = codec_rank(file_name) else {
            continue;
        };
        match best.get(dir) {
            Some((current, _)) if *current <= rank => {}
            _ => {
                best.insert(dir, (rank, entry.path.as_str()));
            }
        }
    }

    let mut indices = Vec::new();
    for (dir, (_, path)) in best {
        let Some((prefix, arch)) = dir.rsplit_once("/binary-") else {
            continue;
        };
        let component = prefix.split('/').next().unwrap_or(prefix);
        if arch == "all" || !filter.accepts_component(component) || !filter.accepts_arch(arch) {
            continue;
        }
        indices.push(PackagesIndex {
            path: path.to_string(),
            component: component.to_string(),
            arch: arch.to_string(),
            installer: prefix.contains(INSTALLER),
        });
    }
    indices
}

/// Split `[epoch:]upstream[-revision]` into upstream version and revision
pub fn split_version(full: &str) -> (&str, &str) {
    let without_epoch = match full.split_once(':') {
        Some((epoch, rest)) if epoch.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => full,
    };
    match without_epoch.rsplit_once('-') {
        Some((upstream, revision)) => (upstream, revision),
        None => (without_epoch, ""),
    }
}

/// Root of the archive a dist URL belongs to (`…/debian/dists/x/` → `…/debian/`)
pub fn archive_root(dist_url: &str) -> &str {
    match dist_url.rfind("/dists/") {
        Some(pos) => &dist_url[..pos + 1],
        None => dist_url,
    }
}

/// Packages of a `Packages` index matching `filter`
///
/// Architecture-independent (`all`) packages never carry kernel headers and
/// are dropped, as are stanzas without a version.
pub fn parse_packages(
    text: &str,
    filter: &SearchFilter,
    archive: &str,
    component: &str,
) -> Result<Vec<DebPackage>> {
    let packages = stanzas::<Stanza>(text, "Packages index")?
        .into_iter()
        .filter(|stanza| {
            !stanza.version.is_empty()
                && stanza.architecture != "all"
                && filter.matches_substring(&stanza.package)
        })
        .map(|stanza| {
            let (version, release) = split_version(&stanza.version);
            let url = if stanza.filename.is_empty() {
                String::new()
            } else {
                join_url(archive, &stanza.filename)
            };
            DebPackage {
                meta: PackageMetadata {
                    name: stanza.package.clone(),
                    version: version.to_string(),
                    release: release.to_string(),
                    arch: stanza.architecture.clone(),
                    location: stanza.filename.clone(),
                    url,
                    files: Vec::new(),
                },
                component: component.to_string(),
            }
        })
        .collect();
    Ok(packages)
}

async fn fetch_release(client: &RepositoryClient, dist: &str) -> Result<Release> {
    let text = match client.fetch_text(&join_url(dist, "InRelease")).await {
        Ok(text) => text,
        Err(e) => {
            debug!("No InRelease in {}: {}, trying Release", dist, e);
            client.fetch_text(&join_url(dist, "Release")).await?
        }
    };
    parse_release(&text)
}

async fn search_dist(
    client: &RepositoryClient,
    dist: &str,
    filter: &SearchFilter,
    producer: &Producer<Box<dyn Package>>,
) -> Result<()> {
    let release = fetch_release(client, dist).await?;
    let indices = select_indices(&release, filter);
    debug!("{} Packages indices selected in {}", indices.len(), dist);

    let archive = archive_root(dist).to_string();
    let mut nested: SearchCoordinator<Box<dyn Package>> = SearchCoordinator::silent(indices.len());
    for index in indices {
        if index.installer && filter.exclude_installers {
            nested.skip()?;
            continue;
        }
        let client = client.clone();
        let url = join_url(dist, &index.path);
        let filter = filter.clone();
        let archive = archive.clone();
        nested.spawn(move |sub| async move {
            let text = client.fetch_decoded_text(&url).await?;
            let packages = parse_packages(&text, &filter, &archive, &index.component)?;
            debug!("{} matching packages in {}", packages.len(), url);
            sub.send(packages.into_iter().map(|p| Box::new(p) as Box<dyn Package>).collect());
            Ok(())
        })?;
    }

    nested.wait_and_close().await?.forward(producer);
    Ok(())
}

/// Search every dist URL for packages matching `filter`
pub async fn search_packages(
    client: &RepositoryClient,
    dists: &[String],
    filter: &SearchFilter,
    progress: Arc<dyn ProgressTracker>,
) -> Result<Aggregate<Box<dyn Package>>> {
    info!("Searching {} Debian dists for {}", dists.len(), filter);
    let mut coordinator = SearchCoordinator::new(dists.len(), progress);

    for dist in dists {
        let client = client.clone();
        let dist = dist.clone();
        let filter = filter.clone();
        coordinator.spawn(move |producer| async move {
            search_dist(&client, &dist, &filter, &producer).await
        })?;
    }

    coordinator.wait_and_close().await
}

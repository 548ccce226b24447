// src/packages/alpm.rs

//! Arch Linux (ALPM) repository backend
//!
//! A repository publishes its sync database as `<repo>.db.tar.gz`: a tar
//! archive with one `<name>-<version>/desc` file per package. The archive is
//! unpacked into a temporary directory owned by the producer and removed on
//! every exit path.

use crate::compression::{self, Codec};
use crate::coordinator::{Aggregate, SearchCoordinator};
use crate::error::{Error, Result};
use crate::packages::common::PackageMetadata;
use crate::packages::traits::{Package, PackageFormat};
use crate::packages::SearchFilter;
use crate::progress::ProgressTracker;
use crate::repository::resolver::join_url;
use crate::repository::RepositoryClient;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tar::Archive;
use tracing::{debug, info};

/// Repository names recognised in repository URLs, most specific first
const REPOSITORIES: &[&str] = &[
    "community-testing-debug",
    "community-staging-debug",
    "community-testing",
    "community-staging",
    "community-debug",
    "community",
    "core-debug",
    "core",
    "extra-debug",
    "extra",
    "staging-debug",
    "staging",
    "testing-debug",
    "testing",
];

/// Arch Linux package from a sync database
#[derive(Debug, Clone)]
pub struct AlpmPackage {
    meta: PackageMetadata,
    /// Repository the package was found in (`core`, `extra`, ...)
    repository: String,
}

impl AlpmPackage {
    pub fn repository(&self) -> &str {
        &self.repository
    }
}

impl Package for AlpmPackage {
    fn metadata(&self) -> &PackageMetadata {
        &self.meta
    }

    fn format(&self) -> PackageFormat {
        PackageFormat::Alpm
    }
}

/// Name of the repository a URL points into
pub fn repository_name(url: &str) -> Option<&'static str> {
    REPOSITORIES.iter().copied().find(|repo| url.contains(repo))
}

/// Sync database URL of a repository URL
pub fn database_url(repository_url: &str) -> Result<(String, &'static str)> {
    let repo = repository_name(repository_url).ok_or_else(|| {
        Error::ConfigError(format!("No known Arch repository name in {repository_url}"))
    })?;
    Ok((join_url(repository_url, &format!("{repo}.db.tar.gz")), repo))
}

/// Parse a `desc` file into `%KEY%` sections
pub fn parse_desc(text: &str) -> BTreeMap<String, Vec<String>> {
    let mut sections: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut key: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            key = None;
        } else if line.len() > 2 && line.starts_with('%') && line.ends_with('%') {
            let name = line.trim_matches('%').to_string();
            sections.entry(name.clone()).or_default();
            key = Some(name);
        } else if let Some(k) = &key {
            sections.entry(k.clone()).or_default().push(line.to_string());
        }
    }
    sections
}

fn first<'a>(sections: &'a BTreeMap<String, Vec<String>>, key: &str) -> Option<&'a str> {
    sections.get(key)?.first().map(String::as_str)
}

fn package_from_desc(
    text: &str,
    filter: &SearchFilter,
    repository_url: &str,
    repository: &str,
) -> Option<AlpmPackage> {
    let sections = parse_desc(text);
    let name = first(&sections, "NAME")?;
    if !filter.matches_substring(name) {
        return None;
    }
    let arch = first(&sections, "ARCH").unwrap_or_default();
    if !filter.accepts_arch(arch) {
        return None;
    }

    // pkgver-pkgrel
    let full = first(&sections, "VERSION")?;
    let (version, release) = full.rsplit_once('-').unwrap_or((full, ""));
    let location = first(&sections, "FILENAME").unwrap_or_default().to_string();
    let url = if location.is_empty() {
        String::new()
    } else {
        join_url(repository_url, &location)
    };

    Some(AlpmPackage {
        meta: PackageMetadata {
            name: name.to_string(),
            version: version.to_string(),
            release: release.to_string(),
            arch: arch.to_string(),
            location,
            url,
            files: Vec::new(),
        },
        repository: repository.to_string(),
    })
}

fn unpack(database: &[u8], target: &Path) -> Result<()> {
    let decoder = compression::reader(database, Codec::sniff(database))?;
    let mut archive = Archive::new(decoder);
    let entries = archive
        .entries()
        .map_err(|e| Error::ParseError(format!("Failed to read sync database: {e}")))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| Error::ParseError(format!("Failed to read sync database entry: {e}")))?;
        entry
            .unpack_in(target)
            .map_err(|e| Error::IoError(format!("Failed to unpack sync database entry: {e}")))?;
    }
    Ok(())
}

/// Matching packages of a sync database archive
///
/// The archive is unpacked below a fresh temporary directory that is
/// removed when this function returns.
pub fn parse_database(
    database: &[u8],
    filter: &SearchFilter,
    repository_url: &str,
    repository: &str,
) -> Result<Vec<AlpmPackage>> {
    let scratch = tempfile::Builder::new().prefix("krawler-alpm-").tempdir()?;
    unpack(database, scratch.path())?;

    let mut packages = Vec::new();
    for dir in std::fs::read_dir(scratch.path())? {
        let desc = dir?.path().join("desc");
        if !desc.is_file() {
            continue;
        }
        let text = std::fs::read_to_string(&desc)?;
        if let Some(package) = package_from_desc(&text, filter, repository_url, repository) {
            packages.push(package);
        }
    }

    packages.sort_by(|a, b| a.meta.id().cmp(&b.meta.id()));
    Ok(packages)
}

async fn search_repository(
    client: &RepositoryClient,
    repository_url: &str,
    filter: &SearchFilter,
) -> Result<Vec<AlpmPackage>> {
    let (db_url, repository) = database_url(repository_url)?;
    let database = client.fetch_bytes(&db_url).await?;

    let filter = filter.clone();
    let repository_url = repository_url.to_string();
    let packages = tokio::task::spawn_blocking(move || {
        parse_database(&database, &filter, &repository_url, repository)
    })
    .await
    .map_err(|e| Error::IoError(format!("Sync database task failed: {e}")))??;

    debug!("{} matching packages in {}", packages.len(), db_url);
    Ok(packages)
}

/// Search every repository URL for packages matching `filter`
pub async fn search_packages(
    client: &RepositoryClient,
    repositories: &[String],
    filter: &SearchFilter,
    progress: Arc<dyn ProgressTracker>,
) -> Result<Aggregate<Box<dyn Package>>> {
    info!("Searching {} Arch repositories for {}", repositories.len(), filter);
    let mut coordinator = SearchCoordinator::new(repositories.len(), progress);

    for repository in repositories {
        let client = client.clone();
        let repository = repository.clone();
        let filter = filter.clone();
        coordinator.spawn(move |producer| async move {
            let packages = search_repository(&client, &repository, &filter).await?;
            producer.send(packages.into_iter().map(|p| Box::new(p) as Box<dyn Package>).collect());
            Ok(())
        })?;
    }

    coordinator.wait_and_close().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn desc(name: &str, version: &str, arch: &str) -> String {
        format!(
            "%FILENAME%\n{name}-{version}-{arch}.pkg.tar.zst\n\n%NAME%\n{name}\n\n%VERSION%\n{version}\n\n%DESC%\nHeaders and scripts\n\n%ARCH%\n{arch}\n"
        )
    }

    fn sync_database(packages: &[(&str, &str, &str)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, version, arch) in packages {
            let content = desc(name, version, arch);
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, format!("{name}-{version}/desc"), content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_repository_name() {
        assert_eq!(repository_name("https://m.example/archlinux/core/os/x86_64/"), Some("core"));
        assert_eq!(repository_name("https://m.example/core-debug/os/x86_64/"), Some("core-debug"));
        assert_eq!(repository_name("https://m.example/aarch64/extra-arm/"), Some("extra"));
        assert_eq!(repository_name("https://m.example/aur/os/x86_64/"), None);

        let (url, repo) = database_url("https://m.example/archlinux/extra/os/x86_64/").unwrap();
        assert_eq!(url, "https://m.example/archlinux/extra/os/x86_64/extra.db.tar.gz");
        assert_eq!(repo, "extra");
        assert!(matches!(
            database_url("https://m.example/aur/os/x86_64/"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_parse_desc_sections() {
        let sections = parse_desc(&desc("linux-headers", "6.1.5.arch2-1", "x86_64"));
        assert_eq!(first(&sections, "NAME"), Some("linux-headers"));
        assert_eq!(first(&sections, "VERSION"), Some("6.1.5.arch2-1"));
        assert_eq!(first(&sections, "DESC"), Some("Headers and scripts"));
    }

    #[test]
    fn test_parse_database() {
        let db = sync_database(&[
            ("linux-headers", "6.1.5.arch2-1", "x86_64"),
            ("linux-lts-headers", "6.1.80-1", "x86_64"),
            ("bash", "5.2.026-2", "x86_64"),
        ]);
        let filter = SearchFilter::new("linux-headers").with_extra_names(["linux-lts-headers"]);
        let repo_url = "https://m.example/archlinux/core/os/x86_64/";
        let packages = parse_database(&db, &filter, repo_url, "core").unwrap();

        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name(), "linux-headers");
        assert_eq!(packages[0].version(), "6.1.5.arch2");
        assert_eq!(packages[0].release(), "1");
        assert_eq!(packages[0].repository(), "core");
        assert_eq!(
            packages[0].url(),
            "https://m.example/archlinux/core/os/x86_64/linux-headers-6.1.5.arch2-1-x86_64.pkg.tar.zst"
        );
        assert_eq!(packages[1].name(), "linux-lts-headers");
    }

    #[test]
    fn test_corrupt_database() {
        let filter = SearchFilter::new("linux-headers");
        assert!(parse_database(b"\x1f\x8b\x08garbage", &filter, "https://m.example/core/", "core").is_err());
    }
}

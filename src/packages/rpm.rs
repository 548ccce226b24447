// src/packages/rpm.rs

//! RPM repository backend
//!
//! Reads `repodata/repomd.xml`, follows it to the primary package database
//! and keeps packages matching the search filter. When the filter asks for
//! files, each matching RPM is downloaded and its CPIO payload searched.

use crate::compression::{self, Codec};
use crate::coordinator::{Aggregate, Producer, SearchCoordinator};
use crate::error::{Error, Result};
use crate::packages::common::PackageMetadata;
use crate::packages::cpio;
use crate::packages::traits::{ExtractedFile, Package, PackageFormat};
use crate::packages::SearchFilter;
use crate::progress::ProgressTracker;
use crate::repository::resolver::join_url;
use crate::repository::RepositoryClient;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Index file every RPM repository publishes
pub const REPOMD_PATH: &str = "repodata/repomd.xml";

/// RPM package found in a primary database
#[derive(Debug, Clone)]
pub struct RpmPackage {
    meta: PackageMetadata,
    /// Epoch, if the primary database declares a non-zero one
    epoch: Option<String>,
}

impl RpmPackage {
    pub fn new(meta: PackageMetadata) -> Self {
        Self { meta, epoch: None }
    }

    pub fn epoch(&self) -> Option<&str> {
        self.epoch.as_deref()
    }
}

impl Package for RpmPackage {
    fn metadata(&self) -> &PackageMetadata {
        &self.meta
    }

    fn format(&self) -> PackageFormat {
        PackageFormat::Rpm
    }
}

fn xml_error(what: &str, e: impl std::fmt::Display) -> Error {
    Error::ParseError(format!("Malformed {what}: {e}"))
}

fn attribute(element: &BytesStart<'_>, name: &str, what: &str) -> Result<Option<String>> {
    match element.try_get_attribute(name).map_err(|e| xml_error(what, e))? {
        Some(attr) => Ok(Some(
            attr.unescape_value()
                .map_err(|e| xml_error(what, e))?
                .into_owned(),
        )),
        None => Ok(None),
    }
}

/// Locations of the primary databases listed in a `repomd.xml`
pub fn parse_repomd(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut in_primary = false;
    let mut locations = Vec::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error("repomd.xml", e))?
        {
            Event::Start(e) if e.local_name().as_ref() == b"data" => {
                in_primary = attribute(&e, "type", "repomd.xml")?.as_deref() == Some("primary");
            }
            Event::Start(e) | Event::Empty(e)
                if in_primary && e.local_name().as_ref() == b"location" =>
            {
                if let Some(href) = attribute(&e, "href", "repomd.xml")? {
                    locations.push(href);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"data" => in_primary = false,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(locations)
}

/// One `<package>` of a primary database
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryEntry {
    pub name: String,
    pub arch: String,
    pub epoch: String,
    pub version: String,
    pub release: String,
    pub location: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Arch,
}

/// Packages of a primary database accepted by `keep`
pub fn parse_primary(xml: &[u8], keep: impl Fn(&PrimaryEntry) -> bool) -> Result<Vec<PrimaryEntry>> {
    const WHAT: &str = "primary database";
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut current: Option<PrimaryEntry> = None;
    let mut field: Option<Field> = None;
    // <format> holds rpm:entry elements that also carry names
    let mut in_format = false;
    let mut entries = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| xml_error(WHAT, e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"package" => current = Some(PrimaryEntry::default()),
                b"format" => in_format = true,
                b"name" if !in_format => field = Some(Field::Name),
                b"arch" if !in_format => field = Some(Field::Arch),
                b"version" | b"location" => read_empty(&e, current.as_mut())?,
                _ => {}
            },
            Event::Empty(e) => read_empty(&e, current.as_mut())?,
            Event::Text(text) => {
                if let (Some(f), Some(entry)) = (field, current.as_mut()) {
                    let value = text.unescape().map_err(|e| xml_error(WHAT, e))?.into_owned();
                    match f {
                        Field::Name => entry.name = value,
                        Field::Arch => entry.arch = value,
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"package" => {
                    if let Some(entry) = current.take() {
                        if keep(&entry) {
                            entries.push(entry);
                        }
                    }
                    in_format = false;
                }
                b"format" => in_format = false,
                b"name" | b"arch" => field = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn read_empty(element: &BytesStart<'_>, entry: Option<&mut PrimaryEntry>) -> Result<()> {
    const WHAT: &str = "primary database";
    let Some(entry) = entry else {
        return Ok(());
    };
    match element.local_name().as_ref() {
        b"version" => {
            entry.epoch = attribute(element, "epoch", WHAT)?.unwrap_or_default();
            entry.version = attribute(element, "ver", WHAT)?.unwrap_or_default();
            entry.release = attribute(element, "rel", WHAT)?.unwrap_or_default();
        }
        b"location" => {
            entry.location = attribute(element, "href", WHAT)?.unwrap_or_default();
        }
        _ => {}
    }
    Ok(())
}

impl RpmPackage {
    fn from_entry(entry: PrimaryEntry, repository: &str) -> Self {
        let url = join_url(repository, &entry.location);
        let epoch = Some(entry.epoch).filter(|e| !e.is_empty() && e != "0");
        let meta = PackageMetadata {
            name: entry.name,
            version: entry.version,
            release: entry.release,
            arch: entry.arch,
            location: entry.location,
            url,
            files: Vec::new(),
        };
        Self { meta, epoch }
    }
}

/// Files of an RPM whose basename is one of `names`
pub fn extract_files(rpm: &[u8], names: &[String]) -> Result<Vec<ExtractedFile>> {
    let pkg = rpm::Package::parse(&mut Cursor::new(rpm))
        .map_err(|e| Error::ParseError(format!("Failed to parse RPM: {e}")))?;

    let payload = &pkg.content;
    if payload.is_empty() {
        debug!("RPM has empty payload");
        return Ok(Vec::new());
    }

    let codec = Codec::sniff(payload);
    debug!("Detected payload compression: {}", codec);
    let decoder = compression::reader(payload.as_slice(), codec)?;

    cpio::extract_matching(decoder, names)
        .map_err(|e| Error::ParseError(format!("CPIO error: {e}")))
}

/// [`extract_files`] on the blocking pool; payload decompression is CPU bound
async fn extract_files_blocking(rpm: Vec<u8>, names: Vec<String>) -> Result<Vec<ExtractedFile>> {
    tokio::task::spawn_blocking(move || extract_files(&rpm, &names))
        .await
        .map_err(|e| Error::IoError(format!("RPM extraction task failed: {e}")))?
}

async fn download_files(client: &RepositoryClient, url: &str, names: &[String]) -> Result<Vec<ExtractedFile>> {
    let rpm = client.fetch_bytes(url).await?;
    let files = extract_files_blocking(rpm, names.to_vec()).await?;
    debug!("Extracted {} files from {}", files.len(), url);
    Ok(files)
}

/// Search one repository, reporting through `producer`
async fn search_repository(
    client: &RepositoryClient,
    repository: &str,
    filter: &SearchFilter,
    producer: &Producer<Box<dyn Package>>,
) -> Result<()> {
    let repomd = client.fetch_bytes(&join_url(repository, REPOMD_PATH)).await?;
    let primaries = parse_repomd(&repomd)?;
    if primaries.is_empty() {
        return Err(Error::ParseError(format!(
            "No primary database listed in {repository}{REPOMD_PATH}"
        )));
    }

    let mut found = Vec::new();
    for location in primaries {
        let url = join_url(repository, &location);
        let primary = client.fetch_decoded(&url).await?;
        let entries = parse_primary(&primary, |entry| {
            filter.matches_exact(&entry.name) && filter.accepts_arch(&entry.arch)
        })?;
        debug!("{} matching packages in {}", entries.len(), url);
        found.extend(entries.into_iter().map(|e| RpmPackage::from_entry(e, repository)));
    }

    if filter.file_names.is_empty() || found.is_empty() {
        producer.send(found.into_iter().map(|p| Box::new(p) as Box<dyn Package>).collect());
        return Ok(());
    }

    // One sub-producer per package download
    let mut nested: SearchCoordinator<Box<dyn Package>> = SearchCoordinator::silent(found.len());
    for mut package in found {
        let client = client.clone();
        let names = filter.file_names.clone();
        nested.spawn(move |sub| async move {
            let downloaded = download_files(&client, package.url(), &names).await;
            match downloaded {
                Ok(files) => package.meta.files = files,
                Err(e) => warn!("Keeping {} without files: {}", package.url(), e),
            }
            sub.send(vec![Box::new(package) as Box<dyn Package>]);
            Ok(())
        })?;
    }
    nested.wait_and_close().await?.forward(producer);
    Ok(())
}

/// Search every repository URL for packages matching `filter`
///
/// One producer per repository; a failing repository is recorded in the
/// aggregate and does not stop the others.
pub async fn search_packages(
    client: &RepositoryClient,
    repositories: &[String],
    filter: &SearchFilter,
    progress: Arc<dyn ProgressTracker>,
) -> Result<Aggregate<Box<dyn Package>>> {
    info!("Searching {} RPM repositories for {}", repositories.len(), filter);
    let mut coordinator = SearchCoordinator::new(repositories.len(), progress);

    for repository in repositories {
        let client = client.clone();
        let repository = repository.clone();
        let filter = filter.clone();
        coordinator.spawn(move |producer| async move {
            search_repository(&client, &repository, &filter, &producer)
                .await
                .map_err(|e| match e {
                    Error::DownloadError(msg) => Error::DownloadError(format!("{repository}: {msg}")),
                    Error::ParseError(msg) => Error::ParseError(format!("{repository}: {msg}")),
                    other => other,
                })
        })?;
    }

    coordinator.wait_and_close().await
}

// src/distro/mod.rs

//! Linux distributions krawler knows how to search
//!
//! Each distribution contributes its default mirrors, repositories,
//! architectures and versions, tells the resolver where versions come from
//! and how they are laid out, and names the package ecosystem its
//! repositories speak. [`search`] runs the whole pipeline for one of them.

mod amazonlinux;
mod archlinux;
mod centos;
mod debian;
mod fedora;
mod opensuse;
mod oracle;
mod search;

pub use amazonlinux::{AmazonLinux1, AmazonLinux2, AmazonLinux2022, AmazonLinux2023};
pub use archlinux::ArchLinux;
pub use centos::CentOS;
pub use debian::{Debian, Ubuntu};
pub use fedora::Fedora;
pub use opensuse::OpenSuse;
pub use oracle::OracleLinux;
pub use search::{dereference_mirror_lists, search, search_with, SearchReport};

use crate::packages::SearchFilter;
use crate::repository::{DistroConfig, Mirror, Repository};
use crate::repository::{RepositoryLayout, VersionLayout, VersionSource};
use std::fmt;

/// Package name carrying kernel headers on RPM distributions
pub const RPM_HEADERS_PACKAGE: &str = "kernel-devel";

/// Package name prefix carrying kernel headers on Debian and Arch
pub const LINUX_HEADERS_PACKAGE: &str = "linux-headers";

/// Kernel `.config` file name, read for the compiler version
pub const KERNEL_CONFIG_FILE: &str = ".config";

/// Semantic-version-like folder names (`7/`, `8-stream/`, `7.9.2009/`)
pub const SEMVER_FOLDER_PATTERN: &str = r"^(0|[1-9]\d*)(\.(0|[1-9]\d*)?)?(\.(0|[1-9]\d*)?)?(-[a-zA-Z\d][-a-zA-Z.\d]*)?(\+[a-zA-Z\d][-a-zA-Z.\d]*)?\/$";

/// Repository index family a distribution publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecosystem {
    Rpm,
    Deb,
    Alpm,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpm => write!(f, "rpm"),
            Self::Deb => write!(f, "deb"),
            Self::Alpm => write!(f, "alpm"),
        }
    }
}

/// A searchable Linux distribution
pub trait Distro: Send + Sync {
    /// Name used on the command line and in the config file
    fn name(&self) -> &'static str;

    /// Built-in mirrors, repositories, architectures and versions
    fn default_config(&self) -> DistroConfig;

    fn ecosystem(&self) -> Ecosystem;

    /// Package whose versions are the kernel releases
    fn headers_package(&self) -> &'static str;

    /// Other header packages searched alongside [`Distro::headers_package`]
    fn extra_packages(&self) -> &'static [&'static str] {
        &[]
    }

    fn version_source(&self) -> VersionSource {
        VersionSource::Static
    }

    fn version_layout(&self) -> VersionLayout {
        VersionLayout::Direct
    }

    fn repository_layout(&self) -> RepositoryLayout {
        RepositoryLayout::Paths
    }

    /// Repository URLs point at `<arch>/mirror.list` references
    fn uses_mirror_lists(&self) -> bool {
        false
    }

    /// Filter for this distribution's kernel header packages
    fn filter(&self) -> SearchFilter {
        SearchFilter::new(self.headers_package()).with_extra_names(self.extra_packages().iter().copied())
    }
}

/// Every supported distribution
pub fn all() -> Vec<Box<dyn Distro>> {
    vec![
        Box::new(AmazonLinux1),
        Box::new(AmazonLinux2),
        Box::new(AmazonLinux2022),
        Box::new(AmazonLinux2023),
        Box::new(ArchLinux),
        Box::new(CentOS),
        Box::new(Debian),
        Box::new(Fedora),
        Box::new(OpenSuse),
        Box::new(OracleLinux),
        Box::new(Ubuntu),
    ]
}

/// Look up a distribution by name (case-insensitive)
pub fn by_name(name: &str) -> Option<Box<dyn Distro>> {
    all()
        .into_iter()
        .find(|d| d.name().eq_ignore_ascii_case(name))
}

/// Names of every supported distribution
pub fn names() -> Vec<&'static str> {
    all().iter().map(|d| d.name()).collect()
}

fn mirrors(entries: &[(&str, &str)]) -> Vec<Mirror> {
    entries.iter().map(|(name, url)| Mirror::new(name, url)).collect()
}

fn repositories(entries: &[(&str, &str)]) -> Vec<Repository> {
    entries
        .iter()
        .map(|(name, uri)| Repository::new(name, uri))
        .collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

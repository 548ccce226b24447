// src/distro/debian.rs

//! Debian and Ubuntu
//!
//! Both lay releases out as `<mirror>dists/<suite>/` and name archive
//! components instead of repository paths. Suites are discovered from the
//! `dists/` listing of every mirror.

use super::{mirrors, repositories, strings, Distro, Ecosystem, LINUX_HEADERS_PACKAGE};
use crate::repository::{DistroConfig, RepositoryLayout, VersionLayout, VersionSource};

const COMPONENTS: &[(&str, &str)] = &[
    ("main", "main"),
    ("contrib", "contrib"),
    ("non-free", "non-free"),
    ("multiverse", "multiverse"),
    ("universe", "universe"),
    ("restricted", "restricted"),
];

/// Every folder under `dists/`
const SUITE_SOURCE: VersionSource = VersionSource::Crawl {
    pattern: r"^.+$",
    under: "dists/",
    recursive: false,
};

fn config(primary: &str, security: &str) -> DistroConfig {
    DistroConfig {
        mirrors: mirrors(&[("kernel.org", primary), ("security", security)]),
        repositories: repositories(COMPONENTS),
        archs: strings(&["amd64"]),
        versions: None,
        ..DistroConfig::default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Debian;

impl Distro for Debian {
    fn name(&self) -> &'static str {
        "debian"
    }

    fn default_config(&self) -> DistroConfig {
        config("https://mirrors.edge.kernel.org/debian/", "http://security.debian.org")
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Deb
    }

    fn headers_package(&self) -> &'static str {
        LINUX_HEADERS_PACKAGE
    }

    fn version_source(&self) -> VersionSource {
        SUITE_SOURCE
    }

    fn version_layout(&self) -> VersionLayout {
        VersionLayout::Dists
    }

    fn repository_layout(&self) -> RepositoryLayout {
        RepositoryLayout::Components
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ubuntu;

impl Distro for Ubuntu {
    fn name(&self) -> &'static str {
        "ubuntu"
    }

    fn default_config(&self) -> DistroConfig {
        config("https://mirrors.edge.kernel.org/ubuntu/", "http://security.ubuntu.com/ubuntu")
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Deb
    }

    fn headers_package(&self) -> &'static str {
        LINUX_HEADERS_PACKAGE
    }

    fn version_source(&self) -> VersionSource {
        SUITE_SOURCE
    }

    fn version_layout(&self) -> VersionLayout {
        VersionLayout::Dists
    }

    fn repository_layout(&self) -> RepositoryLayout {
        RepositoryLayout::Components
    }
}

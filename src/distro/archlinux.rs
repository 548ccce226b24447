// src/distro/archlinux.rs

use super::{mirrors, repositories, strings, Distro, Ecosystem, LINUX_HEADERS_PACKAGE};
use crate::repository::{DistroConfig, VersionSource};

/// Arch Linux and Arch Linux ARM, a rolling release without versions
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchLinux;

impl Distro for ArchLinux {
    fn name(&self) -> &'static str {
        "archlinux"
    }

    fn default_config(&self) -> DistroConfig {
        DistroConfig {
            mirrors: mirrors(&[
                ("arm64", "http://de.mirror.archlinuxarm.org/aarch64/"),
                ("arm32", "http://de.mirror.archlinuxarm.org/armv7h/"),
                ("archmirror", "https://archmirror.it/repos/"),
                ("kernel.org", "https://mirrors.edge.kernel.org/archlinux/"),
            ]),
            repositories: repositories(&[
                ("core", "/core/os/{{ .archs }}/"),
                ("aur", "/aur/os/{{ .archs }}/"),
                ("community", "/community/os/{{ .archs }}/"),
                ("extra", "/extra/os/{{ .archs }}/"),
                ("core-arm", "/core-arm/"),
                ("aur-arm", "/aur-arm/"),
                ("community-arm", "/community-arm/"),
                ("extra-arm", "/extra-arm/"),
            ]),
            archs: strings(&["x86_64", "aarch64", "armv7h"]),
            versions: None,
            ..DistroConfig::default()
        }
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Alpm
    }

    fn headers_package(&self) -> &'static str {
        LINUX_HEADERS_PACKAGE
    }

    fn extra_packages(&self) -> &'static [&'static str] {
        &["linux-lts-headers", "linux-aarch64-headers", "linux-armv7-headers"]
    }

    fn version_source(&self) -> VersionSource {
        VersionSource::Rolling
    }
}

// src/distro/fedora.rs

use super::{mirrors, repositories, strings, Distro, Ecosystem, RPM_HEADERS_PACKAGE};
use crate::repository::{DistroConfig, VersionSource};

/// Release number folders (`39/`, `40/`)
const FEDORA_VERSION_PATTERN: &str = r"^(0|[1-9]\d*)\/$";

#[derive(Debug, Clone, Copy, Default)]
pub struct Fedora;

impl Distro for Fedora {
    fn name(&self) -> &'static str {
        "fedora"
    }

    fn default_config(&self) -> DistroConfig {
        DistroConfig {
            mirrors: mirrors(&[
                ("releases", "https://mirrors.edge.kernel.org/fedora/releases/"),
                ("updates", "https://mirrors.edge.kernel.org/fedora/updates/"),
            ]),
            repositories: repositories(&[
                ("releases", "/Everything/{{ .archs }}/os/"),
                ("updates", "/Everything/{{ .archs }}/"),
            ]),
            archs: strings(&["aarch64", "x86_64", "armhfp", "ppc64le"]),
            versions: None,
            ..DistroConfig::default()
        }
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rpm
    }

    fn headers_package(&self) -> &'static str {
        RPM_HEADERS_PACKAGE
    }

    fn version_source(&self) -> VersionSource {
        VersionSource::Crawl {
            pattern: FEDORA_VERSION_PATTERN,
            under: "",
            recursive: false,
        }
    }
}

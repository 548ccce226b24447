// src/distro/centos.rs

use super::{mirrors, repositories, strings, Distro, Ecosystem, RPM_HEADERS_PACKAGE, SEMVER_FOLDER_PATTERN};
use crate::repository::{DistroConfig, VersionSource};

/// CentOS, current mirrors plus the vault of retired releases
#[derive(Debug, Clone, Copy, Default)]
pub struct CentOS;

impl Distro for CentOS {
    fn name(&self) -> &'static str {
        "centos"
    }

    fn default_config(&self) -> DistroConfig {
        DistroConfig {
            mirrors: mirrors(&[
                ("kernel.org", "https://mirrors.edge.kernel.org/centos/"),
                ("vault", "https://archive.kernel.org/centos-vault/"),
            ]),
            repositories: repositories(&[
                ("base", "/os/{{ .archs }}/"),
                ("updates", "/updates/{{ .archs }}/"),
                ("BaseOS", "/BaseOS/{{ .archs }}/os/"),
                ("AppStream", "/AppStream/{{ .archs }}/os/"),
                ("Devel", "/Devel/{{ .archs }}/os/"),
            ]),
            archs: strings(&["x86_64"]),
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
            pattern: SEMVER_FOLDER_PATTERN,
            under: "",
            recursive: false,
        }
    }
}

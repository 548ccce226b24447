// src/distro/opensuse.rs

use super::{mirrors, repositories, strings, Distro, Ecosystem};
use crate::repository::{DistroConfig, VersionSource};

/// Any folder: openSUSE mixes numbered releases with names like `openSUSE-stable`
const OPENSUSE_VERSION_PATTERN: &str = r"^.+\/$";

/// `kernel-devel` is the noarch common part; the flavour package has `.config`
const OPENSUSE_HEADERS_PACKAGE: &str = "kernel-default-devel";

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSuse;

impl Distro for OpenSuse {
    fn name(&self) -> &'static str {
        "opensuse"
    }

    fn default_config(&self) -> DistroConfig {
        DistroConfig {
            mirrors: mirrors(&[
                ("default", "https://mirrors.edge.kernel.org/opensuse/distribution/"),
                ("tumbleweed", "https://mirrors.edge.kernel.org/opensuse/"),
                ("leap", "https://mirrors.edge.kernel.org/opensuse/distribution/leap/"),
                ("kernel", "http://download.opensuse.org/repositories/Kernel:/"),
            ]),
            repositories: repositories(&[
                ("default", "/repo/oss/"),
                ("kernel-arm", "/ARM/"),
                ("kernel-ppc", "/PPC/"),
                ("kernel-riscv", "/RISCV/"),
                ("kernel-s390", "/S390/"),
                ("kernel-standard", "/standard/"),
                ("kernel-ports", "/ports/"),
                ("kernel-backport-standard", "/Backport/standard"),
                ("kernel-backport-ports", "/Backport/ports"),
                ("kernel-submit-standard", "/Submit/standard/"),
                ("kernel-submit-ports", "/Submit/ports/"),
            ]),
            archs: strings(&[
                "armv6hl", "armv7hl", "aarch64", "armhfp", "x86_64", "noarch", "i686", "ppc",
                "ppc64", "ppc64le", "s390x",
            ]),
            versions: None,
            ..DistroConfig::default()
        }
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rpm
    }

    fn headers_package(&self) -> &'static str {
        OPENSUSE_HEADERS_PACKAGE
    }

    fn version_source(&self) -> VersionSource {
        VersionSource::Crawl {
            pattern: OPENSUSE_VERSION_PATTERN,
            under: "",
            recursive: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_searches_default_flavour() {
        let filter = OpenSuse.filter();
        assert!(filter.matches_exact("kernel-default-devel"));
        assert!(!filter.matches_exact("kernel-devel"));
    }
}

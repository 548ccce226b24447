// src/distro/oracle.rs

use super::{mirrors, repositories, strings, Distro, Ecosystem, RPM_HEADERS_PACKAGE};
use crate::repository::DistroConfig;

/// Oracle Linux; versions are fixed (`OL6` to `OL9`), the yum tree is not crawlable
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleLinux;

impl Distro for OracleLinux {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn default_config(&self) -> DistroConfig {
        DistroConfig {
            mirrors: mirrors(&[("yum", "https://yum.oracle.com/repo/OracleLinux/")]),
            repositories: repositories(&[
                ("latest", "/latest/{{ .archs }}/"),
                ("MODRHCK", "/MODRHCK/{{ .archs }}/"),
                ("UEK", "/UEK/latest/{{ .archs }}/"),
                ("UEKR3-latest", "/UEKR3/latest/{{ .archs }}/"),
                ("UEKR3", "/UEKR3/{{ .archs }}/"),
                ("UEKR4", "/UEKR4/{{ .archs }}/"),
                ("UEKR5", "/UEKR5/{{ .archs }}/"),
                ("UEKR6", "/UEKR6/{{ .archs }}/"),
                ("UEKR7", "/UEKR7/{{ .archs }}/"),
                ("baseos", "/baseos/latest/{{ .archs }}/"),
                ("appstream", "/appstream/{{ .archs }}/"),
            ]),
            archs: strings(&["aarch64", "x86_64", "ppc64le"]),
            versions: Some(strings(&["OL6", "OL7", "OL8", "OL9"])),
            ..DistroConfig::default()
        }
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rpm
    }

    fn headers_package(&self) -> &'static str {
        RPM_HEADERS_PACKAGE
    }
}

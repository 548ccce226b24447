// src/distro/amazonlinux.rs

//! Amazon Linux 1, 2, 2022 and 2023
//!
//! None publishes a browsable tree. Each repository path holds a
//! `<arch>/mirror.list` whose first line is the real repository URL.

use super::{mirrors, repositories, strings, Distro, Ecosystem, RPM_HEADERS_PACKAGE};
use crate::repository::DistroConfig;

const ARCHS: &[&str] = &["aarch64", "x86_64", "ppc64le"];

/// Amazon Linux AMI, x86_64 only
#[derive(Debug, Clone, Copy, Default)]
pub struct AmazonLinux1;

impl Distro for AmazonLinux1 {
    fn name(&self) -> &'static str {
        "amazonlinux"
    }

    fn default_config(&self) -> DistroConfig {
        DistroConfig {
            mirrors: mirrors(&[("AL1", "http://repo.us-east-1.amazonaws.com/")]),
            repositories: repositories(&[("", "/updates/"), ("", "/main/")]),
            archs: strings(&["x86_64"]),
            versions: Some(strings(&["latest", "2017.03", "2017.09", "2018.03"])),
            ..DistroConfig::default()
        }
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rpm
    }

    fn headers_package(&self) -> &'static str {
        RPM_HEADERS_PACKAGE
    }

    fn uses_mirror_lists(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AmazonLinux2;

impl Distro for AmazonLinux2 {
    fn name(&self) -> &'static str {
        "amazonlinux2"
    }

    fn default_config(&self) -> DistroConfig {
        DistroConfig {
            mirrors: mirrors(&[("AL2", "http://amazonlinux.us-east-1.amazonaws.com/2/")]),
            repositories: repositories(&[
                ("core-2.0", "core/2.0"),
                ("core-latest", "core/latest"),
                ("kernel-5.4", "extras/kernel-5.4/latest"),
                ("kernel-5.10", "extras/kernel-5.10/latest"),
                ("kernel-5.15", "extras/kernel-5.15/latest"),
            ]),
            archs: strings(ARCHS),
            versions: Some(strings(&[""])),
            ..DistroConfig::default()
        }
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rpm
    }

    fn headers_package(&self) -> &'static str {
        RPM_HEADERS_PACKAGE
    }

    fn uses_mirror_lists(&self) -> bool {
        true
    }
}

/// Amazon Linux 2022 preview releases, one repository per snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct AmazonLinux2022;

impl Distro for AmazonLinux2022 {
    fn name(&self) -> &'static str {
        "amazonlinux2022"
    }

    fn default_config(&self) -> DistroConfig {
        DistroConfig {
            mirrors: mirrors(&[(
                "AL2022",
                "https://al2022-repos-us-east-1-9761ab97.s3.dualstack.us-east-1.amazonaws.com/core/mirrors/",
            )]),
            repositories: repositories(&[
                ("", "2022.0.20220202"),
                ("", "2022.0.20220315"),
                ("", "2022.0.20221012"),
            ]),
            archs: strings(ARCHS),
            versions: Some(strings(&[""])),
            ..DistroConfig::default()
        }
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rpm
    }

    fn headers_package(&self) -> &'static str {
        RPM_HEADERS_PACKAGE
    }

    fn uses_mirror_lists(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AmazonLinux2023;

impl Distro for AmazonLinux2023 {
    fn name(&self) -> &'static str {
        "amazonlinux2023"
    }

    fn default_config(&self) -> DistroConfig {
        DistroConfig {
            mirrors: mirrors(&[("AL2023", "https://cdn.amazonlinux.com/al2023/core/mirrors/")]),
            repositories: repositories(&[("latest", "latest")]),
            archs: strings(ARCHS),
            versions: Some(strings(&[""])),
            ..DistroConfig::default()
        }
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rpm
    }

    fn headers_package(&self) -> &'static str {
        RPM_HEADERS_PACKAGE
    }

    fn uses_mirror_lists(&self) -> bool {
        true
    }
}

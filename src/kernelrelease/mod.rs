// src/kernelrelease/mod.rs

//! Kernel release extraction
//!
//! A kernel header package's `version[-release][.arch]` string is decomposed
//! into the kernel's version, patch level, sublevel and extra version. When
//! the package carried a kernel `.config`, the compiler version it was built
//! with is read from `CONFIG_GCC_VERSION`.

use crate::error::{Error, Result};
use crate::packages::Package;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

/// Config key holding the compiler version in a kernel `.config`
pub const CONFIG_COMPILER_VERSION: &str = "CONFIG_GCC_VERSION";

const KERNEL_VERSION_PATTERN: &str = r"(?P<fullversion>^(?P<version>0|[1-9]\d*)\.(?P<patchlevel>0|[1-9]\d*)[.+]?(?P<sublevel>0|[1-9]\d*)?)(?P<fullextraversion>[-.+](?P<extraversion>0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)([\.+~](0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z_-]*))*)?(\+[0-9a-zA-Z-]+(\.[0-9a-zA-Z-]+)*)?$";

fn kernel_version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(KERNEL_VERSION_PATTERN).expect("kernel version pattern is valid"))
}

/// A kernel release for which headers are published
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelRelease {
    pub full_version: String,
    pub version: u32,
    pub patch_level: u32,
    pub sublevel: u32,
    pub extra_version: String,
    pub full_extra_version: String,
    pub architecture: String,
    pub package_name: String,
    pub package_url: String,
    pub compiler_version: String,
}

/// `version[-release][.arch]` of a package
pub fn version_string(package: &dyn Package) -> String {
    let mut version = package.version().to_string();
    if !package.release().is_empty() {
        version.push('-');
        version.push_str(package.release());
    }
    if !package.arch().is_empty() {
        version.push('.');
        version.push_str(package.arch());
    }
    version
}

impl KernelRelease {
    /// Decompose a package's version string
    ///
    /// A version the kernel pattern does not match leaves the version fields
    /// empty; callers drop such releases.
    pub fn from_package(package: &dyn Package) -> Self {
        let mut release = KernelRelease {
            architecture: package.arch().to_string(),
            package_name: package.name().to_string(),
            package_url: package.url().to_string(),
            ..Self::default()
        };

        let version = version_string(package);
        if let Some(caps) = kernel_version_pattern().captures(&version) {
            let text = |name: &str| caps.name(name).map(|m| m.as_str()).unwrap_or_default();
            let number = |name: &str| text(name).parse().unwrap_or(0);

            release.full_version = text("fullversion").to_string();
            release.version = number("version");
            release.patch_level = number("patchlevel");
            release.sublevel = number("sublevel");
            release.extra_version = text("extraversion").to_string();
            release.full_extra_version = text("fullextraversion").to_string();
        }

        let contents: Vec<&[u8]> = package.files().iter().map(|f| f.content.as_slice()).collect();
        match compiler_version(&contents) {
            Ok(compiler) => release.compiler_version = compiler,
            Err(e) => debug!("{} for {}: {}", CONFIG_COMPILER_VERSION, package.name(), e),
        }

        release
    }

    /// `major.patchlevel.sublevel` plus the full extra version
    pub fn kernel_release(&self) -> String {
        format!("{}{}", self.full_version, self.full_extra_version)
    }

    /// Identity digest over version, extra version, package name and architecture
    pub fn sha256_sum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.full_version.as_bytes());
        hasher.update(self.full_extra_version.as_bytes());
        hasher.update(self.package_name.as_bytes());
        hasher.update(self.architecture.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Value of a `KEY=value` / `KEY value` config line: its last token
pub fn parse_config_value(line: &str) -> Result<String> {
    let tokens: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || is_math_symbol(c))
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() > 1 {
        Ok(tokens[tokens.len() - 1].to_string())
    } else {
        Err(Error::ParseError(format!("no config value in line '{line}'")))
    }
}

fn is_math_symbol(c: char) -> bool {
    matches!(c, '=' | '+' | '<' | '>' | '|' | '~' | '¬' | '±' | '×' | '÷')
}

/// Compiler version from the first `CONFIG_GCC_VERSION` line of any file
pub fn compiler_version(files: &[&[u8]]) -> Result<String> {
    for content in files {
        let text = String::from_utf8_lossy(content);
        if let Some(line) = text.lines().find(|l| l.contains(CONFIG_COMPILER_VERSION)) {
            return parse_config_value(line);
        }
    }
    Err(Error::ParseError("compiler version not found".to_string()))
}

/// Kernel releases of `packages`, unparseable versions dropped, duplicates removed
pub fn releases_from_packages(packages: &[Box<dyn Package>]) -> Vec<KernelRelease> {
    let mut seen = HashSet::new();
    let mut releases = Vec::new();

    for package in packages {
        let release = KernelRelease::from_package(package.as_ref());
        if release.full_version.is_empty() {
            debug!("Skipping {} {}: not a kernel version", package.name(), package.version());
            continue;
        }
        if seen.insert(release.sha256_sum()) {
            releases.push(release);
        }
    }
    releases
}

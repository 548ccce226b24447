// src/packages/mod.rs

//! Package repository backends for krawler
//!
//! Each backend reads one family of repository indices (RPM, DEB, ALPM)
//! and reports the packages matching a [`SearchFilter`]. Packages of every
//! format implement the [`Package`] trait.

pub mod alpm;
pub mod common;
pub mod cpio;
pub mod deb;
pub mod rpm;
pub mod traits;

pub use common::{PackageMetadata, PackageSet};
pub use traits::{ExtractedFile, Package, PackageFormat, PackageId};

use std::fmt;

/// What a search keeps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Package name to look for
    pub package_name: String,
    /// Basenames of files to extract from matching packages (e.g. `.config`)
    pub file_names: Vec<String>,
    /// Accepted architectures; empty accepts all
    pub architectures: Vec<String>,
    /// Further package names searched alongside `package_name`
    pub extra_names: Vec<String>,
    /// Skip installer indices (Debian `debian-installer`)
    pub exclude_installers: bool,
    /// Archive components to search; empty searches all
    pub components: Vec<String>,
}

impl SearchFilter {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            exclude_installers: true,
            ..Self::default()
        }
    }

    pub fn with_file_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_architectures<I, S>(mut self, archs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.architectures = archs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extra_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_components<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.components = components.into_iter().map(Into::into).collect();
        self
    }

    pub fn including_installers(mut self) -> Self {
        self.exclude_installers = false;
        self
    }

    /// `package_name` followed by the extra names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.package_name.as_str()).chain(self.extra_names.iter().map(String::as_str))
    }

    /// Name equals one of the searched names
    pub fn matches_exact(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// Name contains one of the searched names
    pub fn matches_substring(&self, name: &str) -> bool {
        self.names().any(|n| name.contains(n))
    }

    pub fn accepts_arch(&self, arch: &str) -> bool {
        self.architectures.is_empty() || self.architectures.iter().any(|a| a == arch)
    }

    pub fn accepts_component(&self, component: &str) -> bool {
        self.components.is_empty() || self.components.iter().any(|c| c == component)
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.package_name)?;
        for name in &self.extra_names {
            write!(f, ", {name}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_names() {
        let filter = SearchFilter::new("linux-headers").with_extra_names(["linux-lts-headers"]);
        assert!(filter.matches_exact("linux-lts-headers"));
        assert!(!filter.matches_exact("linux-headers-amd64"));
        assert!(filter.matches_substring("linux-headers-amd64"));
        assert_eq!(filter.to_string(), "linux-headers, linux-lts-headers");
    }

    #[test]
    fn test_empty_lists_accept_everything() {
        let filter = SearchFilter::new("kernel-devel");
        assert!(filter.accepts_arch("ppc64le"));
        assert!(filter.accepts_component("contrib"));
        assert!(filter.exclude_installers);

        let filter = filter.with_architectures(["amd64"]).with_components(["main"]);
        assert!(!filter.accepts_arch("arm64"));
        assert!(!filter.accepts_component("contrib"));
        assert!(filter.accepts_component("main"));
    }
}

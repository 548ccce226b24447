// src/packages/common.rs
//! Common structures shared across package backends
//!
//! `PackageMetadata` captures the fields every repository format provides.
//! Format-specific packages embed it and implement [`Package`] by handing
//! it out. `PackageSet` collapses the same package seen on several mirrors.

use crate::packages::traits::{ExtractedFile, Package, PackageId};
use std::collections::HashSet;

/// Largest file pulled out of a package archive (16 MiB)
pub const MAX_EXTRACTION_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Common metadata shared by all package formats
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    /// RPM release, Debian revision or pkgrel; empty when the format has none
    pub release: String,
    /// Target architecture (e.g., "x86_64", "amd64", "aarch64")
    pub arch: String,
    /// Package file path relative to the repository root
    pub location: String,
    /// Absolute download URL
    pub url: String,
    /// Extracted files, only filled when file names were requested
    pub files: Vec<ExtractedFile>,
}

impl PackageMetadata {
    /// Create new metadata with required fields
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn id(&self) -> PackageId {
        PackageId {
            name: self.name.clone(),
            version: self.version.clone(),
            release: self.release.clone(),
            arch: self.arch.clone(),
        }
    }
}

/// Builder for PackageMetadata to make construction cleaner
#[derive(Debug, Default)]
pub struct PackageMetadataBuilder {
    name: Option<String>,
    version: Option<String>,
    release: String,
    arch: String,
    location: String,
    url: String,
    files: Vec<ExtractedFile>,
}

impl PackageMetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn release(mut self, release: impl Into<String>) -> Self {
        self.release = release.into();
        self
    }

    pub fn arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn files(mut self, files: Vec<ExtractedFile>) -> Self {
        self.files = files;
        self
    }

    /// Build the metadata, returning None if name or version is missing
    pub fn try_build(self) -> Option<PackageMetadata> {
        Some(PackageMetadata {
            name: self.name.filter(|n| !n.is_empty())?,
            version: self.version?,
            release: self.release,
            arch: self.arch,
            location: self.location,
            url: self.url,
            files: self.files,
        })
    }
}

/// Packages deduplicated by [`PackageId`], first occurrence wins
#[derive(Debug, Default)]
pub struct PackageSet {
    seen: HashSet<PackageId>,
    packages: Vec<Box<dyn Package>>,
}

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package; returns false if an identical one is already present
    pub fn insert(&mut self, package: Box<dyn Package>) -> bool {
        if self.seen.insert(package.id()) {
            self.packages.push(package);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Box<dyn Package>> {
        self.packages.iter()
    }

    pub fn as_slice(&self) -> &[Box<dyn Package>] {
        &self.packages
    }

    pub fn into_vec(self) -> Vec<Box<dyn Package>> {
        self.packages
    }
}

impl Extend<Box<dyn Package>> for PackageSet {
    fn extend<I: IntoIterator<Item = Box<dyn Package>>>(&mut self, iter: I) {
        for package in iter {
            self.insert(package);
        }
    }
}

impl FromIterator<Box<dyn Package>> for PackageSet {
    fn from_iter<I: IntoIterator<Item = Box<dyn Package>>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

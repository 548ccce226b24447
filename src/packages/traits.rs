// src/packages/traits.rs

//! Common traits for packages found in repository indices

use crate::packages::common::PackageMetadata;
use std::fmt;

/// A file extracted from a package archive with its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Path inside the package (as stored in the archive)
    pub path: String,
    pub content: Vec<u8>,
}

impl ExtractedFile {
    pub fn new(path: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }

    /// Last path component
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Repository format a package was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageFormat {
    Rpm,
    Deb,
    Alpm,
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpm => write!(f, "rpm"),
            Self::Deb => write!(f, "deb"),
            Self::Alpm => write!(f, "alpm"),
        }
    }
}

/// Identity of a package: the same package seen on two mirrors is one package
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    pub name: String,
    pub version: String,
    pub release: String,
    pub arch: String,
}

/// Common interface for all package formats (RPM, DEB, ALPM)
///
/// Formats embed a [`PackageMetadata`] and only have to hand it out; every
/// accessor delegates to it.
pub trait Package: Send + Sync + fmt::Debug {
    /// Shared metadata of the package
    fn metadata(&self) -> &PackageMetadata;

    /// Repository format the package was found in
    fn format(&self) -> PackageFormat;

    fn name(&self) -> &str {
        &self.metadata().name
    }

    fn version(&self) -> &str {
        &self.metadata().version
    }

    /// Distribution release (RPM release, Debian revision, pkgrel)
    fn release(&self) -> &str {
        &self.metadata().release
    }

    fn arch(&self) -> &str {
        &self.metadata().arch
    }

    /// Path of the package file relative to its repository
    fn location(&self) -> &str {
        &self.metadata().location
    }

    /// Absolute download URL of the package file
    fn url(&self) -> &str {
        &self.metadata().url
    }

    /// Files extracted from the package archive, if any were requested
    fn files(&self) -> &[ExtractedFile] {
        &self.metadata().files
    }

    fn id(&self) -> PackageId {
        self.metadata().id()
    }
}

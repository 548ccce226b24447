// src/lib.rs

//! krawler
//!
//! Discovers the kernel releases Linux distributions publish header
//! packages for, by crawling their mirrors and reading repository indices.
//!
//! # Architecture
//!
//! - `repository`: distro configuration, merge with defaults, seed URL resolution
//! - `matrix` and `template`: expansion of `{{ .var }}` repository templates
//! - `crawler`: HTML directory listing traversal for version discovery
//! - `coordinator`: fan-out of producer tasks with one collecting consumer
//! - `packages`: RPM, DEB and ALPM index backends
//! - `distro`: built-in distributions and the end-to-end search
//! - `kernelrelease` and `output`: release decomposition and rendering

pub mod compression;
pub mod coordinator;
pub mod crawler;
pub mod distro;
mod error;
pub mod kernelrelease;
pub mod matrix;
pub mod output;
pub mod packages;
pub mod progress;
pub mod repository;
pub mod template;

pub use coordinator::{Aggregate, Producer, SearchCoordinator};
pub use distro::{Distro, SearchReport};
pub use error::{Error, Result};
pub use kernelrelease::KernelRelease;
pub use packages::{Package, PackageSet, SearchFilter};

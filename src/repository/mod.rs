// src/repository/mod.rs

//! Mirror access and repository resolution
//!
//! This module provides:
//! - The HTTP client shared by every search producer
//! - The distro configuration model (mirrors, repositories, archs, versions)
//! - Resolution of configuration into concrete seed URLs

mod client;
pub mod config;
pub mod resolver;

pub use client::RepositoryClient;
pub use config::{DistroConfig, KrawlerConfig, Mirror, OutputOptions, Repository};
pub use resolver::{
    RepositoryLayout, Resolution, Resolver, SeedUrl, VersionLayout, VersionSource,
};

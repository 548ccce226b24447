// tests/backends.rs

//! Repository backend tests against a local fixture server.

mod common;

use common::{client, gzip, packages_index, release, rpm_repository, sync_database, FixtureServer, Files};
use krawler::distro::{ArchLinux, Distro};
use krawler::packages::{alpm, deb, rpm, Package, SearchFilter};
use krawler::progress::{ProgressTracker, SilentProgress};
use krawler::Error;
use std::sync::Arc;

#[tokio::test]
async fn test_rpm_search_records_failed_repository() {
    let files = rpm_repository(
        Files::new(),
        "/repo/a/",
        &[
            ("kernel-devel", "x86_64", "5.14.0", "70.el9"),
            ("kernel-devel", "aarch64", "5.14.0", "70.el9"),
            ("bash", "x86_64", "5.1.8", "6.el9"),
        ],
    );
    let server = FixtureServer::start(files.into_map()).await;
    let repositories = vec![server.url("/repo/a/"), server.url("/repo/missing/")];
    let filter = SearchFilter::new("kernel-devel").with_architectures(["x86_64"]);
    let progress = Arc::new(SilentProgress::new());

    let aggregate = rpm::search_packages(&client(), &repositories, &filter, progress.clone())
        .await
        .unwrap();

    assert_eq!(aggregate.items.len(), 1);
    assert_eq!(aggregate.items[0].name(), "kernel-devel");
    assert_eq!(aggregate.items[0].release(), "70.el9");
    assert_eq!(
        aggregate.items[0].url(),
        server.url("/repo/a/Packages/kernel-devel-5.14.0-70.el9.x86_64.rpm")
    );
    assert_eq!(aggregate.producers, 2);
    assert_eq!(aggregate.failed, 1);
    assert!(aggregate.errors[0].to_string().contains("/repo/missing/"));
    assert!(matches!(
        aggregate.partial_failure(),
        Some(Error::PartialFailure { failed: 1, total: 2 })
    ));
    assert_eq!(progress.completed(), 2);
}

#[tokio::test]
async fn test_rpm_search_extracts_kernel_config() {
    let scratch = tempfile::tempdir().unwrap();
    let config_path = scratch.path().join("config");
    std::fs::write(&config_path, "CONFIG_CC_IS_GCC=y\nCONFIG_GCC_VERSION=110401\n").unwrap();

    let package = ::rpm::PackageBuilder::new(
        "kernel-devel",
        "5.14.0",
        "GPL-2.0-only",
        "x86_64",
        "Development package for building kernel modules",
    )
    .compression(::rpm::CompressionType::Gzip)
    .with_file(
        &config_path,
        ::rpm::FileOptions::new("/usr/src/kernels/5.14.0-70.el9.x86_64/.config"),
    )
    .unwrap()
    .build()
    .unwrap();
    let mut rpm_bytes = Vec::new();
    package.write(&mut rpm_bytes).unwrap();

    let files = rpm_repository(Files::new(), "/repo/", &[("kernel-devel", "x86_64", "5.14.0", "70.el9")])
        .add("/repo/Packages/kernel-devel-5.14.0-70.el9.x86_64.rpm", rpm_bytes);
    let server = FixtureServer::start(files.into_map()).await;

    let filter = SearchFilter::new("kernel-devel").with_file_names([".config"]);
    let aggregate = rpm::search_packages(
        &client(),
        &[server.url("/repo/")],
        &filter,
        Arc::new(SilentProgress::new()),
    )
    .await
    .unwrap();

    assert_eq!(aggregate.items.len(), 1);
    let files = aggregate.items[0].files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].basename(), ".config");

    let releases = krawler::kernelrelease::releases_from_packages(&aggregate.items);
    assert_eq!(releases[0].compiler_version, "110401");
}

#[tokio::test]
async fn test_rpm_search_keeps_package_when_download_fails() {
    let files = rpm_repository(Files::new(), "/repo/", &[("kernel-devel", "x86_64", "5.14.0", "70.el9")]);
    let server = FixtureServer::start(files.into_map()).await;

    let filter = SearchFilter::new("kernel-devel").with_file_names([".config"]);
    let aggregate = rpm::search_packages(
        &client(),
        &[server.url("/repo/")],
        &filter,
        Arc::new(SilentProgress::new()),
    )
    .await
    .unwrap();

    assert_eq!(aggregate.items.len(), 1);
    assert!(aggregate.items[0].files().is_empty());
    assert_eq!(aggregate.failed, 0);
}

fn debian_files() -> Files {
    let main = packages_index(&[
        ("linux-headers-6.1.0-13-amd64", "amd64", "6.1.55-1"),
        ("linux-headers-6.1.0-13-common", "all", "6.1.55-1"),
        ("bash", "amd64", "5.2.15-2+b2"),
    ]);
    let installer = packages_index(&[("linux-headers-installer", "amd64", "6.1.55-1")]);
    let arm = packages_index(&[("linux-headers-6.1.0-13-arm64", "arm64", "6.1.55-1")]);

    Files::new()
        .add(
            "/debian/dists/bookworm/Release",
            release(
                "bookworm",
                &[
                    "main/binary-amd64/Packages",
                    "main/binary-amd64/Packages.gz",
                    "main/binary-arm64/Packages.gz",
                    "main/debian-installer/binary-amd64/Packages.gz",
                    "contrib/binary-amd64/Packages",
                ],
            ),
        )
        .add("/debian/dists/bookworm/main/binary-amd64/Packages.gz", gzip(main.as_bytes()))
        .add("/debian/dists/bookworm/main/binary-arm64/Packages.gz", gzip(arm.as_bytes()))
        .add(
            "/debian/dists/bookworm/main/debian-installer/binary-amd64/Packages.gz",
            gzip(installer.as_bytes()),
        )
        .add("/debian/dists/bookworm/contrib/binary-amd64/Packages", "")
}

#[tokio::test]
async fn test_deb_search_falls_back_to_release() {
    let server = FixtureServer::start(debian_files().into_map()).await;
    let filter = SearchFilter::new("linux-headers").with_architectures(["amd64"]);

    let aggregate = deb::search_packages(
        &client(),
        &[server.url("/debian/dists/bookworm/")],
        &filter,
        Arc::new(SilentProgress::new()),
    )
    .await
    .unwrap();

    assert!(aggregate.errors.is_empty(), "{:?}", aggregate.errors);
    assert_eq!(aggregate.items.len(), 1);
    let package = &aggregate.items[0];
    assert_eq!(package.name(), "linux-headers-6.1.0-13-amd64");
    assert_eq!(package.version(), "6.1.55");
    assert_eq!(package.release(), "1");
    assert_eq!(
        package.url(),
        server.url("/debian/pool/main/l/linux/linux-headers-6.1.0-13-amd64_6.1.55-1_amd64.deb")
    );
}

#[tokio::test]
async fn test_deb_search_including_installers() {
    let server = FixtureServer::start(debian_files().into_map()).await;
    let filter = SearchFilter::new("linux-headers")
        .with_architectures(["amd64"])
        .including_installers();

    let aggregate = deb::search_packages(
        &client(),
        &[server.url("/debian/dists/bookworm/")],
        &filter,
        Arc::new(SilentProgress::new()),
    )
    .await
    .unwrap();

    let mut names: Vec<&str> = aggregate.items.iter().map(|p| p.name()).collect();
    names.sort();
    assert_eq!(names, vec!["linux-headers-6.1.0-13-amd64", "linux-headers-installer"]);
}

#[tokio::test]
async fn test_deb_search_missing_dist() {
    let server = FixtureServer::start(debian_files().into_map()).await;
    let filter = SearchFilter::new("linux-headers");

    let aggregate = deb::search_packages(
        &client(),
        &[server.url("/debian/dists/sid/")],
        &filter,
        Arc::new(SilentProgress::new()),
    )
    .await
    .unwrap();

    assert!(aggregate.items.is_empty());
    assert!(aggregate.all_failed());
    assert!(matches!(aggregate.errors[0], Error::DownloadError(_)));
}

#[tokio::test]
async fn test_alpm_search() {
    let database = sync_database(&[
        ("linux-headers", "6.1.5.arch2-1", "x86_64"),
        ("linux-lts-headers", "6.1.80-1", "x86_64"),
        ("bash", "5.2.026-2", "x86_64"),
    ]);
    let files = Files::new().add("/archlinux/core/os/x86_64/core.db.tar.gz", database);
    let server = FixtureServer::start(files.into_map()).await;

    let repositories = vec![
        server.url("/archlinux/core/os/x86_64/"),
        server.url("/archlinux/aur/os/x86_64/"),
    ];
    let aggregate = alpm::search_packages(
        &client(),
        &repositories,
        &ArchLinux.filter(),
        Arc::new(SilentProgress::new()),
    )
    .await
    .unwrap();

    let mut names: Vec<&str> = aggregate.items.iter().map(|p| p.name()).collect();
    names.sort();
    assert_eq!(names, vec!["linux-headers", "linux-lts-headers"]);
    assert_eq!(aggregate.failed, 1);
    assert!(matches!(aggregate.errors[0], Error::ConfigError(_)));
}

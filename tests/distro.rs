// tests/distro.rs

//! End-to-end distribution searches with user overrides pointing at a
//! local fixture server.

mod common;

use common::{client, gzip, listing, packages_index, release, rpm_repository, sync_database, FixtureServer, Files};
use krawler::distro::{self, AmazonLinux2023, ArchLinux, CentOS, Debian};
use krawler::packages::Package;
use krawler::progress::SilentProgress;
use krawler::repository::{DistroConfig, Mirror, Repository};
use krawler::Error;
use std::sync::Arc;

fn user(mirror: String, archs: &[&str]) -> DistroConfig {
    DistroConfig {
        mirrors: vec![Mirror::new("fixture", &mirror)],
        archs: archs.iter().map(|a| a.to_string()).collect(),
        ..DistroConfig::default()
    }
}

fn progress() -> Arc<SilentProgress> {
    Arc::new(SilentProgress::new())
}

fn centos_files() -> Files {
    let files = Files::new().add(
        "/centos/",
        listing(&["7/", "8-stream/", "isos/", "RPM-GPG-KEY-CentOS-7"]),
    );
    let files = rpm_repository(
        files,
        "/centos/7/os/x86_64/",
        &[("kernel-devel", "x86_64", "3.10.0", "1160.el7")],
    );
    rpm_repository(
        files,
        "/centos/8-stream/BaseOS/x86_64/os/",
        &[
            ("kernel-devel", "x86_64", "4.18.0", "500.el8"),
            ("kernel-headers", "x86_64", "4.18.0", "500.el8"),
        ],
    )
}

#[tokio::test]
async fn test_centos_crawled_versions() {
    let server = FixtureServer::start(centos_files().into_map()).await;
    let mut config = user(server.url("/centos"), &["x86_64"]);
    config.repositories = vec![
        Repository::new("base", "/os/{{ .archs }}/"),
        Repository::new("BaseOS", "/BaseOS/{{ .archs }}/os/"),
    ];

    let report = distro::search(&CentOS, &config, &client(), progress()).await.unwrap();

    // 2 versions x 2 repositories, each version has only one of them
    assert_eq!(report.searched, 4);
    assert_eq!(report.failed, 2);
    assert!(matches!(
        report.partial_failure(),
        Some(Error::PartialFailure { failed: 2, total: 4 })
    ));

    let mut releases: Vec<String> = report.releases().iter().map(|r| r.kernel_release()).collect();
    releases.sort();
    assert_eq!(releases, vec!["3.10.0-1160.el7.x86_64", "4.18.0-500.el8.x86_64"]);
}

#[tokio::test]
async fn test_centos_no_versions_found() {
    let files = Files::new().add("/centos/", listing(&["isos/", "README"]));
    let server = FixtureServer::start(files.into_map()).await;

    let result = distro::search(&CentOS, &user(server.url("/centos/"), &[]), &client(), progress()).await;
    assert!(matches!(result, Err(Error::ConfigError(_))));
}

#[tokio::test]
async fn test_every_repository_failing() {
    let files = Files::new().add("/centos/", listing(&["9/"]));
    let server = FixtureServer::start(files.into_map()).await;

    let report = distro::search(&CentOS, &user(server.url("/centos/"), &["x86_64"]), &client(), progress())
        .await
        .unwrap();
    assert!(report.packages.is_empty());
    assert!(report.all_failed());
    assert_eq!(report.errors.len(), report.searched);
}

#[tokio::test]
async fn test_debian_suites_and_components() {
    let main = packages_index(&[
        ("linux-headers-6.1.0-13-amd64", "amd64", "6.1.55-1"),
        ("linux-headers-6.1.0-13-common", "all", "6.1.55-1"),
    ]);
    let local = packages_index(&[("linux-headers-custom", "amd64", "6.6.0-1")]);
    let files = Files::new()
        .add("/debian/dists/", listing(&["bookworm/", "README"]))
        .add(
            "/debian/dists/bookworm/InRelease",
            release(
                "bookworm",
                &["main/binary-amd64/Packages.gz", "local/binary-amd64/Packages.gz"],
            ),
        )
        .add("/debian/dists/bookworm/main/binary-amd64/Packages.gz", gzip(main.as_bytes()))
        .add("/debian/dists/bookworm/local/binary-amd64/Packages.gz", gzip(local.as_bytes()));
    let server = FixtureServer::start(files.into_map()).await;

    // `local` is not one of the default components
    let report = distro::search(&Debian, &user(server.url("/debian/"), &["amd64"]), &client(), progress())
        .await
        .unwrap();

    assert_eq!(report.searched, 1);
    assert_eq!(report.failed, 0);
    let releases = report.releases();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].kernel_release(), "6.1.55-1.amd64");
    assert_eq!(releases[0].package_name, "linux-headers-6.1.0-13-amd64");
}

#[tokio::test]
async fn test_amazonlinux_mirror_lists() {
    let server = FixtureServer::start_with(|base| {
        let files = Files::new().add(
            "/al2023/core/mirrors/latest/x86_64/mirror.list",
            format!("{base}/al2023/core/guids/abc/x86_64/\n{base}/unused/\n"),
        );
        rpm_repository(
            files,
            "/al2023/core/guids/abc/x86_64/",
            &[("kernel-devel", "x86_64", "6.1.55", "75.123.amzn2023")],
        )
        .into_map()
    })
    .await;

    let config = user(server.url("/al2023/core/mirrors/"), &["x86_64", "aarch64"]);
    let report = distro::search(&AmazonLinux2023, &config, &client(), progress())
        .await
        .unwrap();

    // Two mirror lists (one missing) and one repository
    assert_eq!(report.searched, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.packages.len(), 1);
    assert_eq!(
        report.packages.iter().next().unwrap().url(),
        server.url("/al2023/core/guids/abc/x86_64/Packages/kernel-devel-6.1.55-75.123.amzn2023.x86_64.rpm")
    );
}

#[tokio::test]
async fn test_archlinux_rolling() {
    let files = Files::new().add(
        "/archlinux/core/os/x86_64/core.db.tar.gz",
        sync_database(&[
            ("linux-headers", "6.1.5.arch2-1", "x86_64"),
            ("linux-lts-headers", "6.1.80-1", "x86_64"),
            ("linux-aarch64-headers", "6.2.10-1", "aarch64"),
        ]),
    );
    let server = FixtureServer::start(files.into_map()).await;

    let report = distro::search(&ArchLinux, &user(server.url("/archlinux/"), &["x86_64"]), &client(), progress())
        .await
        .unwrap();

    // Every default repository is searched below the single mirror
    assert_eq!(report.searched, 8);
    assert_eq!(report.failed, 7);

    let mut releases: Vec<(String, String)> = report
        .releases()
        .into_iter()
        .map(|r| (r.package_name.clone(), r.kernel_release()))
        .collect();
    releases.sort();
    assert_eq!(
        releases,
        vec![
            ("linux-headers".to_string(), "6.1.5.arch2-1.x86_64".to_string()),
            ("linux-lts-headers".to_string(), "6.1.80-1.x86_64".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_unknown_distro() {
    assert!(distro::by_name("slackware").is_none());
    assert!(distro::names().contains(&"ubuntu"));
}

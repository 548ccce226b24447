// tests/common/mod.rs

//! Shared test utilities for integration tests.
//!
//! `FixtureServer` is a minimal HTTP/1.1 server on a loopback port serving
//! an in-memory path to body map; everything else is a 404. The fixture
//! builders produce the repository files the backends read.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use krawler::repository::RepositoryClient;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Loopback HTTP server answering GET requests from a fixed file map
pub struct FixtureServer {
    base: String,
    handle: JoinHandle<()>,
}

impl FixtureServer {
    /// Serve `files` (absolute paths such as `/centos/`) until dropped
    pub async fn start(files: HashMap<String, Vec<u8>>) -> Self {
        Self::start_with(move |_| files).await
    }

    /// Like [`FixtureServer::start`], for files that embed the server's base URL
    pub async fn start_with<F>(files: F) -> Self
    where
        F: FnOnce(&str) -> HashMap<String, Vec<u8>>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let files = Arc::new(files(&base));

        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let files = Arc::clone(&files);
                tokio::spawn(async move {
                    let mut reader = BufReader::new(stream);
                    let mut request_line = String::new();
                    if reader.read_line(&mut request_line).await.is_err() {
                        return;
                    }
                    // Drain headers
                    loop {
                        let mut line = String::new();
                        match reader.read_line(&mut line).await {
                            Ok(0) => break,
                            Ok(_) if line == "\r\n" || line == "\n" => break,
                            Ok(_) => {}
                            Err(_) => return,
                        }
                    }

                    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
                    let (status, body): (&str, &[u8]) = match files.get(path) {
                        Some(body) => ("200 OK", body.as_slice()),
                        None => ("404 Not Found", b"not found"),
                    };
                    let head = format!(
                        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    );
                    let mut stream = reader.into_inner();
                    let _ = stream.write_all(head.as_bytes()).await;
                    let _ = stream.write_all(body).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self { base, handle }
    }

    /// `http://127.0.0.1:<port>` without a trailing slash
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// File map builder for [`FixtureServer`]
#[derive(Default)]
pub struct Files(HashMap<String, Vec<u8>>);

impl Files {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.0.insert(path.to_string(), body.into());
        self
    }

    pub fn into_map(self) -> HashMap<String, Vec<u8>> {
        self.0
    }
}

/// Client without retry delays
pub fn client() -> RepositoryClient {
    RepositoryClient::with_timeout(Duration::from_secs(5))
        .unwrap()
        .with_retries(1, Duration::ZERO)
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Apache-style directory listing linking to `entries`
pub fn listing(entries: &[&str]) -> String {
    let mut html = String::from("<html><body><pre>\n<a href=\"../\">../</a>\n");
    for entry in entries {
        html.push_str(&format!("<a href=\"{entry}\">{entry}</a>\n"));
    }
    html.push_str("</pre></body></html>\n");
    html
}

pub const REPOMD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo">
  <data type="primary">
    <location href="repodata/primary.xml.gz"/>
  </data>
</repomd>"#;

/// Primary database listing `(name, arch, version, release)` packages
pub fn primary(packages: &[(&str, &str, &str, &str)]) -> Vec<u8> {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metadata xmlns=\"http://linux.duke.edu/metadata/common\">\n",
    );
    for (name, arch, version, release) in packages {
        xml.push_str(&format!(
            "<package type=\"rpm\"><name>{name}</name><arch>{arch}</arch>\
             <version epoch=\"0\" ver=\"{version}\" rel=\"{release}\"/>\
             <location href=\"Packages/{name}-{version}-{release}.{arch}.rpm\"/></package>\n"
        ));
    }
    xml.push_str("</metadata>\n");
    gzip(xml.as_bytes())
}

/// Add an RPM repository rooted at `root` (with trailing `/`)
pub fn rpm_repository(files: Files, root: &str, packages: &[(&str, &str, &str, &str)]) -> Files {
    files
        .add(&format!("{root}repodata/repomd.xml"), REPOMD)
        .add(&format!("{root}repodata/primary.xml.gz"), primary(packages))
}

/// `Packages` index text for `(name, arch, version)` packages
pub fn packages_index(packages: &[(&str, &str, &str)]) -> String {
    packages
        .iter()
        .map(|(name, arch, version)| {
            format!(
                "Package: {name}\nArchitecture: {arch}\nVersion: {version}\nFilename: pool/main/l/linux/{name}_{version}_{arch}.deb\n\n"
            )
        })
        .collect()
}

/// Release file listing the given index paths
pub fn release(suite: &str, indices: &[&str]) -> String {
    let mut text = format!(
        "Origin: Debian\nSuite: {suite}\nCodename: {suite}\nArchitectures: amd64 arm64\nComponents: main contrib\nSHA256:\n"
    );
    for path in indices {
        text.push_str(&format!(" 0000000000000000 100 {path}\n"));
    }
    text
}

/// `<repo>.db.tar.gz` sync database for `(name, version, arch)` packages
pub fn sync_database(packages: &[(&str, &str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, version, arch) in packages {
        let desc = format!(
            "%FILENAME%\n{name}-{version}-{arch}.pkg.tar.zst\n\n%NAME%\n{name}\n\n%VERSION%\n{version}\n\n%ARCH%\n{arch}\n"
        );
        let mut header = tar::Header::new_gnu();
        header.set_size(desc.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{name}-{version}/desc"), desc.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

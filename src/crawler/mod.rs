// src/crawler/mod.rs

//! Directory-listing crawler
//!
//! Mirrors expose their trees as HTML index pages. The crawler follows
//! `a[href]` links on those pages, staying on the seed hosts and never
//! walking upwards, and collects folder or file names matching a pattern.
//! Distribution versions are discovered this way when none are configured.

use crate::error::{Error, Result};
use crate::repository::RepositoryClient;
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use tracing::debug;
use url::Url;

/// How many folder levels below a seed a recursive crawl descends
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Discovers folder names below a set of seed URLs
#[async_trait]
pub trait FolderCrawler: Send + Sync {
    /// Names (without trailing `/`) of folders whose `name/` matches `folder_pattern`
    async fn crawl_folders(
        &self,
        seeds: &[Url],
        folder_pattern: &str,
        recursive: bool,
    ) -> Result<Vec<String>>;
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::ConfigError(format!("Invalid crawl pattern '{pattern}': {e}")))
}

fn seed_hosts(seeds: &[Url]) -> Result<HashSet<String>> {
    let hosts: HashSet<String> = seeds
        .iter()
        .filter_map(|seed| seed.host_str().map(str::to_string))
        .collect();
    if hosts.is_empty() {
        return Err(Error::ConfigError("invalid seed urls".to_string()));
    }
    Ok(hosts)
}

/// A link found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: Url,
    /// Last path segment, with a trailing `/` for folders
    pub name: String,
    pub is_folder: bool,
}

/// Extract the downward links of a listing page
///
/// Parent links (`../`, `/`), sort links (`?C=N;O=D`), fragments and links
/// that leave `page`'s subtree are dropped.
pub fn listing_links(html: &str, page: &Url) -> Vec<Link> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.contains("../") || href == "/" || href.starts_with('?') || href.starts_with('#') {
            continue;
        }
        let Ok(url) = page.join(href) else {
            continue;
        };
        if url.query().is_some() || url == *page || !url.path().starts_with(page.path()) {
            continue;
        }

        let path = url.path();
        let is_folder = path.ends_with('/');
        let trimmed = path.trim_end_matches('/');
        let Some(segment) = trimmed.rsplit('/').next().filter(|s| !s.is_empty()) else {
            continue;
        };
        let name = if is_folder {
            format!("{segment}/")
        } else {
            segment.to_string()
        };
        links.push(Link {
            url,
            name,
            is_folder,
        });
    }
    links
}

/// Crawler fetching listings over HTTP
#[derive(Clone)]
pub struct HttpCrawler {
    client: RepositoryClient,
    max_depth: usize,
}

impl HttpCrawler {
    pub fn new(client: RepositoryClient) -> Self {
        Self {
            client,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Breadth-first walk over the listings reachable from `seeds`
    ///
    /// `visit` sees every link of every fetched page and returns whether a
    /// folder link should be descended into.
    async fn walk<F>(&self, seeds: &[Url], max_depth: usize, mut visit: F) -> Result<()>
    where
        F: FnMut(&Link) -> bool + Send,
    {
        let hosts = seed_hosts(seeds)?;
        let mut queue: VecDeque<(Url, usize)> = seeds.iter().cloned().map(|s| (s, 0)).collect();
        let mut seen: HashSet<Url> = seeds.iter().cloned().collect();

        while let Some((page, depth)) = queue.pop_front() {
            debug!("Crawling {}", page);
            // Seed pages must load; deeper pages may be missing or forbidden
            let html = match self.client.fetch_text(page.as_str()).await {
                Ok(html) => html,
                Err(e) if depth == 0 => return Err(e),
                Err(e) => {
                    debug!("Skipping {}: {}", page, e);
                    continue;
                }
            };

            for link in listing_links(&html, &page) {
                let on_seed_host = link
                    .url
                    .host_str()
                    .map(|h| hosts.contains(h))
                    .unwrap_or(false);
                if !on_seed_host {
                    continue;
                }
                let descend = visit(&link);
                if descend && link.is_folder && depth < max_depth && seen.insert(link.url.clone())
                {
                    queue.push_back((link.url, depth + 1));
                }
            }
        }
        Ok(())
    }

    /// File names below the seeds matching `exact_file_pattern`
    pub async fn crawl_files(&self, seeds: &[Url], exact_file_pattern: &str) -> Result<Vec<String>> {
        let pattern = compile(exact_file_pattern)?;
        let mut files: Vec<String> = Vec::new();

        self.walk(seeds, self.max_depth, |link| {
            if !link.is_folder && pattern.is_match(&link.name) && !files.contains(&link.name) {
                files.push(link.name.clone());
            }
            true
        })
        .await?;

        Ok(files)
    }
}

#[async_trait]
impl FolderCrawler for HttpCrawler {
    async fn crawl_folders(
        &self,
        seeds: &[Url],
        folder_pattern: &str,
        recursive: bool,
    ) -> Result<Vec<String>> {
        let pattern = compile(folder_pattern)?;
        let max_depth = if recursive { self.max_depth } else { 0 };
        let mut folders: Vec<String> = Vec::new();

        self.walk(seeds, max_depth, |link| {
            if link.is_folder && pattern.is_match(&link.name) {
                let name = link.name.trim_end_matches('/').to_string();
                if !folders.contains(&name) {
                    folders.push(name);
                }
            }
            recursive
        })
        .await?;

        debug!("Found {} folders matching {}", folders.len(), folder_pattern);
        Ok(folders)
    }
}

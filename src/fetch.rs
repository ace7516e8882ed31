use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL, PRAGMA, USER_AGENT};
use serde::de::DeserializeOwned;
use url::Url;

/// Where content files are read from: a local site root or a deployed site.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Human-readable location of `path`, used in logs.
    fn describe(&self, path: &str) -> String;

    /// Reads the raw bytes at a site-relative `path`, bypassing any cache.
    async fn read(&self, path: &str) -> anyhow::Result<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(path);
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => resolved.push(segment),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    anyhow::bail!("content path must stay inside the site root: {path}")
                }
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl ContentSource for DirSource {
    fn describe(&self, path: &str) -> String {
        self.root.join(path).display().to_string()
    }

    async fn read(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full)
            .await
            .with_context(|| format!("read content file: {}", full.display()))
    }
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    base: Url,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base: Url, timeout: Option<Duration>) -> anyhow::Result<Self> {
        if base.scheme() != "http" && base.scheme() != "https" {
            anyhow::bail!("content url must be http/https: {base}");
        }

        let mut base = base;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::limited(10));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("build content http client")?;

        Ok(Self { base, client })
    }

    fn url_for(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("join content url: {}{path}", self.base))
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    fn describe(&self, path: &str) -> String {
        match self.url_for(path) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{path}", self.base),
        }
    }

    async fn read(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let url = self.url_for(path)?;
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, "titikfiksi/0.1")
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url}: unexpected status {status}");
        }

        let body = response
            .bytes()
            .await
            .with_context(|| format!("read body: {url}"))?;
        Ok(body.to_vec())
    }
}

pub fn is_http_url(raw: &str) -> bool {
    let lower = raw.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Opens `--site`: URLs become an [`HttpSource`], anything else a
/// [`DirSource`].
pub fn open_source(site: &str, timeout: Option<Duration>) -> anyhow::Result<Box<dyn ContentSource>> {
    if is_http_url(site) {
        let base = Url::parse(site.trim()).context("parse --site url")?;
        return Ok(Box::new(HttpSource::new(base, timeout)?));
    }

    let root = PathBuf::from(site);
    if !root.is_dir() {
        anyhow::bail!("site directory not found: {}", root.display());
    }
    Ok(Box::new(DirSource::new(root)))
}

/// Fetches and decodes one JSON document. Every failure is logged and turned
/// into `None`; callers render an error state instead of failing.
pub async fn fetch_json<T: DeserializeOwned>(source: &dyn ContentSource, path: &str) -> Option<T> {
    let bytes = match source.read(path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(path = %source.describe(path), "failed to load content: {err:#}");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(path = %source.describe(path), %err, "failed to decode content json");
            None
        }
    }
}

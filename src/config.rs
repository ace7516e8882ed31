use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::normalize::DEFAULT_COVER;

pub const CONFIG_FILE_NAME: &str = "titikfiksi.yaml";
pub const CONFIG_ENV: &str = "TITIKFIKSI_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Suffix of detail-page titles (`<title> | <brand>`).
    pub brand: String,
    pub content: ContentPaths,
    /// Site-relative path of the cover used when a work has none.
    pub default_cover: String,
    /// Site-relative directory holding work detail pages.
    pub works_dir: String,
    /// Site-relative directory holding writing detail pages.
    pub writings_dir: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            brand: "Titik Fiksi".to_owned(),
            content: ContentPaths::default(),
            default_cover: DEFAULT_COVER.to_owned(),
            works_dir: "pages/works".to_owned(),
            writings_dir: "pages/writings".to_owned(),
        }
    }
}

/// Locations of the content files, relative to the site root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPaths {
    pub settings: String,
    pub home: String,
    pub works: String,
    pub writings: String,
}

impl Default for ContentPaths {
    fn default() -> Self {
        Self {
            settings: "content/settings/settings_general.json".to_owned(),
            home: "content/home/home.json".to_owned(),
            works: "content/works/works.json".to_owned(),
            writings: "content/writings/writings.json".to_owned(),
        }
    }
}

impl SiteConfig {
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let config: SiteConfig = serde_yaml::from_str(&yaml)
            .with_context(|| format!("parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Resolution order: `--config`, then `$TITIKFIKSI_CONFIG`, then
    /// `titikfiksi.yaml` in a local site root, then built-in defaults.
    pub fn load(explicit: Option<&str>, site: &str) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_yaml_file(Path::new(path));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV)
            && !path.trim().is_empty()
        {
            return Self::from_yaml_file(Path::new(path.trim()))
                .with_context(|| format!("load config from ${CONFIG_ENV}"));
        }

        if !crate::fetch::is_http_url(site) {
            let candidate = PathBuf::from(site).join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "using site config");
                return Self::from_yaml_file(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Site-relative path of the detail page for `slug` in the given
    /// collection.
    #[must_use]
    pub fn detail_path(&self, kind: DetailKind, slug: &str) -> String {
        let dir = match kind {
            DetailKind::Work => &self.works_dir,
            DetailKind::Writing => &self.writings_dir,
        };
        format!("{}/{slug}.html", dir.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKind {
    Work,
    Writing,
}

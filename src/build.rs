use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::{BuildArgs, GlobalArgs};
use crate::config::SiteConfig;
use crate::fetch::DirSource;
use crate::generate::{self, write_output};
use crate::page::{self, PageKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub hydrated: usize,
    pub copied: usize,
    pub generated: usize,
}

pub async fn run(args: BuildArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = SiteConfig::load(global.config.as_deref(), &args.site).context("load config")?;
    let summary = build_site(Path::new(&args.site), Path::new(&args.out), &config, args.force).await?;
    tracing::info!(
        out = %args.out,
        hydrated = summary.hydrated,
        copied = summary.copied,
        generated = summary.generated,
        "build done"
    );
    Ok(())
}

/// Hydrates every marked page of `site_dir` into `out_dir`, copies the rest,
/// then adds generated detail pages the tree does not already have.
pub async fn build_site(
    site_dir: &Path,
    out_dir: &Path,
    config: &SiteConfig,
    force: bool,
) -> anyhow::Result<BuildSummary> {
    if !site_dir.is_dir() {
        anyhow::bail!("site directory not found: {}", site_dir.display());
    }
    if out_dir.exists() && !force {
        anyhow::bail!("build output directory already exists: {}", out_dir.display());
    }
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create build output dir: {}", out_dir.display()))?;

    let out_canonical = out_dir
        .canonicalize()
        .with_context(|| format!("resolve build output dir: {}", out_dir.display()))?;
    let files = collect_files(site_dir, &out_canonical)?;
    tracing::info!(site = %site_dir.display(), files = files.len(), "build: scan site");

    let source = DirSource::new(site_dir);
    let mut summary = BuildSummary::default();
    let mut existing = BTreeSet::new();

    for relative in &files {
        let location = to_location(relative);
        let src = site_dir.join(relative);
        let dest = out_dir.join(relative);
        let bytes = std::fs::read(&src).with_context(|| format!("read site file: {}", src.display()))?;
        existing.insert(location.clone());

        if is_html(relative)
            && let Ok(document) = std::str::from_utf8(&bytes)
            && PageKind::detect(document).is_some()
        {
            let hydration = page::initialize(&source, config, document, &location)
                .await
                .with_context(|| format!("initialize page: {location}"))?;
            tracing::info!(location = %location, kind = hydration.kind.as_str(), state = ?hydration.state(), "hydrated page");
            write_output(&dest, hydration.apply(document).as_bytes(), force)?;
            summary.hydrated += 1;
            continue;
        }

        write_output(&dest, &bytes, force)?;
        summary.copied += 1;
    }

    tracing::info!("build: generate detail pages");
    let report = generate::generate(&source, config).await;
    if report.aborted {
        tracing::warn!("detail page generation aborted; keeping the rest of the build");
        return Ok(summary);
    }

    for file in &report.files {
        if existing.contains(&file.path) {
            tracing::debug!(path = %file.path, "detail page already in site; skipping");
            continue;
        }
        let document = String::from_utf8_lossy(&file.bytes);
        let hydration = page::initialize(&source, config, &document, &file.path)
            .await
            .with_context(|| format!("initialize generated page: {}", file.path))?;
        let hydrated = generate::GeneratedFile {
            path: file.path.clone(),
            bytes: hydration.apply(&document).into_bytes(),
        };
        generate::write_files(out_dir, std::slice::from_ref(&hydrated), force)?;
        tracing::info!(path = %file.path, "generated detail page");
        summary.generated += 1;
    }

    Ok(summary)
}

/// Site files relative to `root`, sorted. Dot-files and the output directory
/// are skipped.
fn collect_files(root: &Path, skip: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(relative) = pending.pop() {
        let dir = root.join(&relative);
        let mut entries = std::fs::read_dir(&dir)
            .with_context(|| format!("read site dir: {}", dir.display()))?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("list site dir: {}", dir.display()))?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            let child = relative.join(&name);
            let file_type = entry
                .file_type()
                .with_context(|| format!("stat site entry: {}", path.display()))?;
            if file_type.is_dir() {
                if path.canonicalize().is_ok_and(|p| p == skip) {
                    continue;
                }
                pending.push(child);
            } else if file_type.is_file() {
                files.push(child);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn to_location(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

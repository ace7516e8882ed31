use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::{GenerateArgs, GlobalArgs};
use crate::config::{DetailKind, SiteConfig};
use crate::dom::escape;
use crate::fetch::{self, ContentSource, fetch_json};
use crate::formats::{WorksFile, WritingsFile};
use crate::page::site_root_from;
use crate::slug;

const WORK_TEMPLATE: &str = include_str!("templates/work_detail.html");
const WRITING_TEMPLATE: &str = include_str!("templates/writing_detail.html");

/// One detail page produced by the generator, addressed by its site-relative
/// path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub files: Vec<GeneratedFile>,
    pub log: Vec<String>,
    pub works_generated: usize,
    pub writings_generated: usize,
    pub aborted: bool,
}

impl GenerationReport {
    fn info(&mut self, line: impl Into<String>) {
        let line = line.into();
        if !line.is_empty() {
            tracing::info!("{line}");
        }
        self.log.push(line);
    }

    fn error(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        tracing::error!("{line}");
        self.log.push(format!("❌ {line}"));
    }

    fn abort(mut self, line: impl AsRef<str>) -> Self {
        self.error(line);
        self.aborted = true;
        self
    }
}

/// Fixed detail-page shell for one collection. Asset links are made relative
/// to where the page will live.
#[must_use]
pub fn detail_template(kind: DetailKind, config: &SiteConfig) -> String {
    let (template, dir) = match kind {
        DetailKind::Work => (WORK_TEMPLATE, &config.works_dir),
        DetailKind::Writing => (WRITING_TEMPLATE, &config.writings_dir),
    };
    let root = site_root_from(&format!("{}/page.html", dir.trim_end_matches('/')));
    template
        .replace("{{root}}", &root)
        .replace("{{default_cover}}", &escape(&config.default_cover))
        .replace("{{brand}}", &escape(&config.brand))
}

/// Normalized slugs that occur more than once, in the order each first
/// repeats. Blank slugs are ignored.
#[must_use]
pub fn duplicate_slugs<'a>(slugs: impl IntoIterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut dupes: Vec<String> = Vec::new();
    for raw in slugs {
        let slug = slug::normalize(raw.unwrap_or_default());
        if slug.is_empty() {
            continue;
        }
        if !seen.insert(slug.clone()) && !dupes.contains(&slug) {
            dupes.push(slug);
        }
    }
    dupes
}

pub async fn run(args: GenerateArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = SiteConfig::load(global.config.as_deref(), &args.site).context("load config")?;
    let source = fetch::open_source(&args.site, global.timeout())?;

    let report = generate(source.as_ref(), &config).await;
    for line in &report.log {
        println!("{line}");
    }
    if report.aborted {
        anyhow::bail!("detail page generation aborted");
    }

    let out_dir = PathBuf::from(&args.out);
    let written = write_files(&out_dir, &report.files, args.force)?;
    tracing::info!(
        out = %out_dir.display(),
        files = written.len(),
        works = report.works_generated,
        writings = report.writings_generated,
        "generate done"
    );
    Ok(())
}

/// Loads both collections from `source` and generates their detail pages.
pub async fn generate(source: &dyn ContentSource, config: &SiteConfig) -> GenerationReport {
    let works: Option<WorksFile> = fetch_json(source, &config.content.works).await;
    let writings: Option<WritingsFile> = fetch_json(source, &config.content.writings).await;
    generate_from(works.as_ref(), writings.as_ref(), config)
}

/// Generation over already-loaded collections. `None` means the collection
/// could not be read.
#[must_use]
pub fn generate_from(
    works: Option<&WorksFile>,
    writings: Option<&WritingsFile>,
    config: &SiteConfig,
) -> GenerationReport {
    let mut report = GenerationReport::default();
    report.info("Mulai generate halaman detail...");
    report.info("");

    let Some(works) = works else {
        return report.abort(format!(
            "works.json tidak bisa dibaca. Pastikan file ada di {}",
            config.content.works
        ));
    };
    let Some(writings) = writings else {
        return report.abort(format!(
            "writings.json tidak bisa dibaca. Pastikan file ada di {}",
            config.content.writings
        ));
    };

    if works.works.is_empty() && writings.writings.is_empty() {
        return report.abort("Tidak ada data untuk dibuatkan halaman detail.");
    }

    let work_dupes = duplicate_slugs(works.works.iter().map(|w| w.slug.as_deref()));
    let writing_dupes = duplicate_slugs(writings.writings.iter().map(|w| w.slug.as_deref()));
    if !work_dupes.is_empty() {
        report.error(format!("NOVEL: ada slug duplikat → {}", work_dupes.join(", ")));
    }
    if !writing_dupes.is_empty() {
        report.error(format!("TULISAN: ada slug duplikat → {}", writing_dupes.join(", ")));
    }
    if !work_dupes.is_empty() || !writing_dupes.is_empty() {
        report.aborted = true;
        return report;
    }

    report.info("📚 Generate NOVEL...");
    let template = detail_template(DetailKind::Work, config);
    for work in &works.works {
        let slug = slug::normalize(work.slug.as_deref().unwrap_or_default());
        if slug.is_empty() {
            report.error("Ada novel yang slug-nya kosong. Isi slug dulu di Admin.");
            continue;
        }
        let path = config.detail_path(DetailKind::Work, &slug);
        report.info(format!("✅ Dibuat: {path}"));
        report.files.push(GeneratedFile { path, bytes: template.clone().into_bytes() });
        report.works_generated += 1;
    }
    report.info("");

    report.info("✍️ Generate TULISAN...");
    let template = detail_template(DetailKind::Writing, config);
    for writing in &writings.writings {
        let slug = slug::normalize(writing.slug.as_deref().unwrap_or_default());
        if slug.is_empty() {
            report.error("Ada tulisan yang slug-nya kosong. Isi slug dulu di Admin.");
            continue;
        }
        let path = config.detail_path(DetailKind::Writing, &slug);
        report.info(format!("✅ Dibuat: {path}"));
        report.files.push(GeneratedFile { path, bytes: template.clone().into_bytes() });
        report.writings_generated += 1;
    }

    report.info("");
    report.info("Selesai ✅");
    report.info(format!("Total novel dibuat: {}", report.works_generated));
    report.info(format!("Total tulisan dibuat: {}", report.writings_generated));
    report.info("");
    report.info("LANGKAH TERAKHIR:");
    report.info("Pindahkan file hasil download ke:");
    report.info(format!("• {}/{}/", config.brand, config.works_dir.trim_end_matches('/')));
    report.info(format!("• {}/{}/", config.brand, config.writings_dir.trim_end_matches('/')));
    report
}

/// Writes generated files under `out_dir`, creating directories as needed.
/// Existing files are an error unless `force` is set.
pub fn write_files(out_dir: &Path, files: &[GeneratedFile], force: bool) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = file
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(out_dir.to_path_buf(), |acc, segment| acc.join(segment));
        write_output(&path, &file.bytes, force)?;
        tracing::debug!(path = %path.display(), bytes = file.bytes.len(), "wrote file");
        written.push(path);
    }
    Ok(written)
}

pub(crate) fn write_output(path: &Path, contents: &[u8], force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("output already exists: {}", path.display());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("open output: {}", path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("write output: {}", path.display()))?;
    file.flush()
        .with_context(|| format!("flush output: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{WorkRecord, WritingRecord};
    use crate::page::PageKind;

    fn work(slug: &str) -> WorkRecord {
        WorkRecord { slug: Some(slug.to_owned()), ..WorkRecord::default() }
    }

    fn writing(slug: &str) -> WritingRecord {
        WritingRecord { slug: Some(slug.to_owned()), ..WritingRecord::default() }
    }

    #[test]
    fn duplicates_are_found_after_normalization() {
        assert_eq!(duplicate_slugs([Some("a"), Some("A"), Some("b")]), vec!["a"]);
        assert_eq!(
            duplicate_slugs([Some("x y"), Some(""), None, Some("X-Y"), Some("x y"), Some("z"), Some("Z!")]),
            vec!["x-y", "z"]
        );
        assert!(duplicate_slugs([Some(" "), Some("")]).is_empty());
    }

    #[test]
    fn generates_one_file_per_slugged_record() {
        let config = SiteConfig::default();
        let works = WorksFile { works: vec![work("Sunset"), work("  "), work("Moon Rise")] };
        let writings = WritingsFile { writings: vec![writing("catatan")] };

        let report = generate_from(Some(&works), Some(&writings), &config);
        assert!(!report.aborted);
        assert_eq!(report.works_generated, 2);
        assert_eq!(report.writings_generated, 1);

        let paths: Vec<&str> = report.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["pages/works/sunset.html", "pages/works/moon-rise.html", "pages/writings/catatan.html"]
        );
        assert!(report.log.contains(&"❌ Ada novel yang slug-nya kosong. Isi slug dulu di Admin.".to_owned()));
        assert!(report.log.contains(&"Total novel dibuat: 2".to_owned()));
        assert!(report.log.contains(&"• Titik Fiksi/pages/writings/".to_owned()));
    }

    #[test]
    fn generated_pages_carry_the_detail_marker() {
        let config = SiteConfig::default();
        let works = WorksFile { works: vec![work("sunset")] };
        let writings = WritingsFile { writings: vec![writing("catatan")] };
        let report = generate_from(Some(&works), Some(&writings), &config);

        let work_page = String::from_utf8_lossy(&report.files[0].bytes).to_string();
        assert_eq!(PageKind::detect(&work_page), Some(PageKind::WorkDetail));
        assert!(work_page.contains(r#"href="../../assets/css/style.css""#));
        assert!(work_page.contains(r#"src="../../assets/images/defaults/cover-default.jpg""#));
        assert!(!work_page.contains("{{"));

        let writing_page = String::from_utf8_lossy(&report.files[1].bytes).to_string();
        assert_eq!(PageKind::detect(&writing_page), Some(PageKind::WritingDetail));
        assert!(writing_page.contains(r#"id="writing-content""#));
    }

    #[test]
    fn duplicates_abort_before_any_file() {
        let config = SiteConfig::default();
        let works = WorksFile { works: vec![work("a"), work("A"), work("b")] };
        let writings = WritingsFile { writings: vec![writing("c"), writing("c")] };

        let report = generate_from(Some(&works), Some(&writings), &config);
        assert!(report.aborted);
        assert!(report.files.is_empty());
        assert!(report.log.contains(&"❌ NOVEL: ada slug duplikat → a".to_owned()));
        assert!(report.log.contains(&"❌ TULISAN: ada slug duplikat → c".to_owned()));
    }

    #[test]
    fn missing_or_empty_collections_abort() {
        let config = SiteConfig::default();
        let empty_works = WorksFile::default();
        let empty_writings = WritingsFile::default();

        let unreadable = generate_from(None, Some(&empty_writings), &config);
        assert!(unreadable.aborted);
        assert!(unreadable.log.iter().any(|l| l.contains("works.json tidak bisa dibaca")));

        let nothing = generate_from(Some(&empty_works), Some(&empty_writings), &config);
        assert!(nothing.aborted);
        assert_eq!(
            nothing.log.last().map(String::as_str),
            Some("❌ Tidak ada data untuk dibuatkan halaman detail.")
        );
    }

    #[test]
    fn nested_detail_dirs_adjust_asset_root() {
        let config = SiteConfig { works_dir: "id/pages/works/".to_owned(), ..SiteConfig::default() };
        let page = detail_template(DetailKind::Work, &config);
        assert!(page.contains(r#"href="../../../index.html""#));
    }

    #[test]
    fn brand_is_escaped_in_templates() {
        let config = SiteConfig { brand: "Pena & <Senja>".to_owned(), ..SiteConfig::default() };
        let page = detail_template(DetailKind::Writing, &config);
        assert!(page.contains("<title>Detail Tulisan | Pena &amp; &lt;Senja&gt;</title>"));
        assert!(page.contains("<strong>Pena &amp; &lt;Senja&gt;</strong>"));
        assert!(!page.contains("<Senja>"));
    }

    #[test]
    fn write_files_respects_force() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let files = vec![GeneratedFile { path: "pages/works/a.html".to_owned(), bytes: b"one".to_vec() }];

        let written = write_files(temp.path(), &files, false)?;
        assert_eq!(written, vec![temp.path().join("pages").join("works").join("a.html")]);
        assert!(write_files(temp.path(), &files, false).is_err());

        let files = vec![GeneratedFile { path: "pages/works/a.html".to_owned(), bytes: b"two".to_vec() }];
        write_files(temp.path(), &files, true)?;
        assert_eq!(std::fs::read_to_string(&written[0])?, "two");
        Ok(())
    }
}

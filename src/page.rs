use std::path::Path;

use anyhow::Context as _;

use crate::cli::{GlobalArgs, RenderArgs};
use crate::config::{DetailKind, SiteConfig};
use crate::dom::{self, Patch, Target};
use crate::fetch::{self, ContentSource, fetch_json};
use crate::formats::{HomeContent, SiteSettings, WorksFile, WritingsFile};
use crate::normalize::safe_text;
use crate::render::{self, PageState};
use crate::slug;

pub const PAGE_MARKER: &str = "data-page";
pub const LEGACY_DETAIL_MARKER: &str = "data-detail-type";

const HERO_TITLE: &str = "hero-title";

const PLATFORMS: &[&str] = &["wattpad", "goodnovel", "kbm", "maxnovel", "fizzo", "karyakarsa"];
const SOCIALS: &[(&str, &str)] = &[
    ("instagram", "ig"),
    ("facebook", "fb"),
    ("twitter", "tw"),
    ("tiktok", "tt"),
    ("youtube", "yt"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Home,
    Works,
    Writings,
    WorkDetail,
    WritingDetail,
}

impl PageKind {
    pub fn parse(marker: &str) -> Option<Self> {
        match marker.trim().to_ascii_lowercase().as_str() {
            "home" => Some(Self::Home),
            "works" => Some(Self::Works),
            "writings" => Some(Self::Writings),
            "work-detail" => Some(Self::WorkDetail),
            "writing-detail" => Some(Self::WritingDetail),
            _ => None,
        }
    }

    /// Reads the page type from `<body data-page="...">`, falling back to
    /// `data-detail-type="work|writing"` used by older detail pages.
    pub fn detect(document: &str) -> Option<Self> {
        if let Some(marker) = dom::body_attr(document, PAGE_MARKER) {
            return Self::parse(&marker);
        }
        match dom::body_attr(document, LEGACY_DETAIL_MARKER)?.trim() {
            "work" => Some(Self::WorkDetail),
            "writing" => Some(Self::WritingDetail),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Works => "works",
            Self::Writings => "writings",
            Self::WorkDetail => "work-detail",
            Self::WritingDetail => "writing-detail",
        }
    }

    pub fn detail_kind(self) -> Option<DetailKind> {
        match self {
            Self::WorkDetail => Some(DetailKind::Work),
            Self::WritingDetail => Some(DetailKind::Writing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    pub state: PageState,
    pub patches: Vec<Patch>,
}

impl Section {
    fn new(name: &'static str) -> Self {
        Self { name, state: PageState::Loading, patches: Vec::new() }
    }

    fn finish(mut self, state: PageState, patches: Vec<Patch>) -> Self {
        self.state = state;
        self.patches = patches;
        self
    }
}

/// Everything the initializer decided for one page document. Nothing has
/// been applied yet; see [`Hydration::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hydration {
    pub kind: PageKind,
    pub sections: Vec<Section>,
}

impl Hydration {
    /// State of the section that gives the page its identity (the list, the
    /// hero, or the detail record).
    pub fn state(&self) -> PageState {
        self.sections
            .iter()
            .find(|s| s.name == self.kind.as_str())
            .map_or(PageState::Loading, |s| s.state)
    }

    pub fn patches(&self) -> impl Iterator<Item = &Patch> {
        self.sections.iter().flat_map(|s| s.patches.iter())
    }

    pub fn apply(&self, document: &str) -> String {
        let patches: Vec<Patch> = self.patches().cloned().collect();
        dom::apply(document, &patches)
    }
}

/// Relative path from a page back to the site root, e.g. `../../` for
/// `pages/works/sunset.html`.
pub fn site_root_from(location: &str) -> String {
    let path = match url::Url::parse(location) {
        Ok(url) if url.has_host() => url.path().to_owned(),
        _ => location.replace('\\', "/"),
    };
    let depth = path
        .trim_start_matches("./")
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .count()
        .saturating_sub(1);
    "../".repeat(depth)
}

/// Decides every patch for `document`, which lives at the site-relative
/// `location`. Content that fails to load is reported through section states;
/// only a document without a page marker is an error.
pub async fn initialize(
    source: &dyn ContentSource,
    config: &SiteConfig,
    document: &str,
    location: &str,
) -> anyhow::Result<Hydration> {
    let Some(kind) = PageKind::detect(document) else {
        anyhow::bail!(
            "page has no recognized `{PAGE_MARKER}` marker on <body>: {location}"
        );
    };

    let root = site_root_from(location);
    tracing::debug!(kind = kind.as_str(), location, root = %root, "initialize page");

    let mut sections = Vec::new();
    match kind {
        PageKind::Home | PageKind::Works | PageKind::Writings => {
            let settings: Option<SiteSettings> = fetch_json(source, &config.content.settings).await;
            sections.push(settings_section(settings.as_ref(), document));

            let home: Option<HomeContent> = fetch_json(source, &config.content.home).await;
            sections.push(links_section(home.as_ref()));

            // Sections other than the page's own run only when their slot
            // is present in the markup.
            if kind == PageKind::Home || has_slot(document, HERO_TITLE) {
                sections.push(home_section(home.as_ref()));
            }

            if kind == PageKind::Works || has_slot(document, render::WORKS_CONTAINER) {
                let works: Option<WorksFile> = fetch_json(source, &config.content.works).await;
                let body = render::works_list(
                    works.as_ref(),
                    &format!("{root}{}", config.default_cover),
                    &format!("{root}{}", config.works_dir.trim_end_matches('/')),
                );
                sections.push(Section::new("works").finish(
                    body.state,
                    vec![Patch::html(dom::id(render::WORKS_CONTAINER), body.html)],
                ));
            }

            if kind == PageKind::Writings || has_slot(document, render::WRITINGS_CONTAINER) {
                let writings: Option<WritingsFile> =
                    fetch_json(source, &config.content.writings).await;
                let body = render::writings_list(
                    writings.as_ref(),
                    &format!("{root}{}", config.writings_dir.trim_end_matches('/')),
                );
                sections.push(Section::new("writings").finish(
                    body.state,
                    vec![Patch::html(dom::id(render::WRITINGS_CONTAINER), body.html)],
                ));
            }
        }
        PageKind::WorkDetail => {
            let works: Option<WorksFile> = fetch_json(source, &config.content.works).await;
            sections.push(work_detail_section(works.as_ref(), config, location, &root));
        }
        PageKind::WritingDetail => {
            let writings: Option<WritingsFile> = fetch_json(source, &config.content.writings).await;
            sections.push(writing_detail_section(writings.as_ref(), config, location, &root));
        }
    }

    for section in &sections {
        tracing::debug!(section = section.name, state = ?section.state, patches = section.patches.len(), "section done");
    }

    Ok(Hydration { kind, sections })
}

fn settings_section(settings: Option<&SiteSettings>, document: &str) -> Section {
    let section = Section::new("settings");
    let Some(settings) = settings else {
        return section.finish(PageState::Error, Vec::new());
    };

    let mut patches = Vec::new();
    let site_title = safe_text(settings.site_title.as_deref(), "");
    let current_title = dom::inner_html(document, &Target::Title).unwrap_or_default();
    if !site_title.is_empty() && !current_title.contains('|') {
        patches.push(Patch::text(Target::Title, site_title));
    }

    let description = safe_text(settings.meta_description.as_deref(), "");
    if !description.is_empty() {
        patches.push(Patch::attr(Target::Meta("description".to_owned()), "content", description));
    }

    section.finish(PageState::Success, patches)
}

fn link_patches(class: &str, url: Option<&String>) -> Vec<Patch> {
    match url.map(|u| u.trim()).filter(|u| !u.is_empty()) {
        Some(url) => vec![
            Patch::attr(dom::class(class), "href", url),
            Patch::display(dom::class(class), "inline-flex"),
        ],
        None => vec![Patch::display(dom::class(class), "none")],
    }
}

fn links_section(home: Option<&HomeContent>) -> Section {
    let section = Section::new("links");
    let Some(home) = home else {
        return section.finish(PageState::Error, Vec::new());
    };

    let mut patches = Vec::new();
    for name in PLATFORMS {
        patches.extend(link_patches(&format!("link-{name}"), home.platforms.get(*name)));
    }
    for (name, url) in &home.platforms {
        if !PLATFORMS.contains(&name.as_str()) {
            patches.extend(link_patches(&format!("link-{name}"), Some(url)));
        }
    }

    for (name, abbr) in SOCIALS {
        patches.extend(link_patches(&format!("social-{abbr}"), home.socials.get(*name)));
    }
    for (name, url) in &home.socials {
        if !SOCIALS.iter().any(|(known, _)| *known == name.as_str()) {
            patches.extend(link_patches(&format!("social-{name}"), Some(url)));
        }
    }

    section.finish(PageState::Success, patches)
}

fn has_slot(document: &str, id: &str) -> bool {
    dom::inner_html(document, &dom::id(id)).is_some()
}

fn home_section(home: Option<&HomeContent>) -> Section {
    let section = Section::new("home");
    let Some(home) = home else {
        return section.finish(PageState::Error, Vec::new());
    };
    let hero = &home.hero;

    let mut patches = vec![
        Patch::text(dom::id(HERO_TITLE), safe_text(hero.title.as_deref(), "Titik Fiksi")),
        Patch::text(
            dom::id("hero-subtitle"),
            safe_text(hero.subtitle.as_deref(), "Novelis • Penulis"),
        ),
        Patch::text(dom::id("intro-text"), safe_text(hero.intro.as_deref(), "")),
    ];

    let embed = safe_text(hero.youtube_embed.as_deref(), "");
    if embed.is_empty() {
        patches.push(Patch::display(dom::id("youtube-frame"), "none"));
    } else {
        patches.push(Patch::attr(dom::id("youtube-frame"), "src", embed));
        patches.push(Patch::display(dom::id("youtube-frame"), "block"));
    }

    section.finish(PageState::Success, patches)
}

fn work_detail_section(
    works: Option<&WorksFile>,
    config: &SiteConfig,
    location: &str,
    root: &str,
) -> Section {
    let section = Section::new("work-detail");
    let Some(works) = works else {
        return section.finish(PageState::Error, render::not_found(DetailKind::Work, root));
    };

    let wanted = slug::from_location(location);
    let found = works
        .works
        .iter()
        .find(|w| !wanted.is_empty() && slug::normalize(w.slug.as_deref().unwrap_or_default()) == wanted);

    match found {
        Some(work) => {
            let default_cover = format!("{root}{}", config.default_cover);
            section.finish(
                PageState::Success,
                render::work_detail(work, &config.brand, &default_cover),
            )
        }
        None => {
            tracing::info!(slug = %wanted, location, "no work matches detail page");
            section.finish(PageState::Empty, render::not_found(DetailKind::Work, root))
        }
    }
}

fn writing_detail_section(
    writings: Option<&WritingsFile>,
    config: &SiteConfig,
    location: &str,
    root: &str,
) -> Section {
    let section = Section::new("writing-detail");
    let Some(writings) = writings else {
        return section.finish(PageState::Error, render::not_found(DetailKind::Writing, root));
    };

    let wanted = slug::from_location(location);
    let found = writings
        .writings
        .iter()
        .find(|w| !wanted.is_empty() && slug::normalize(w.slug.as_deref().unwrap_or_default()) == wanted);

    match found {
        Some(writing) => section.finish(
            PageState::Success,
            render::writing_detail(writing, &config.brand),
        ),
        None => {
            tracing::info!(slug = %wanted, location, "no writing matches detail page");
            section.finish(PageState::Empty, render::not_found(DetailKind::Writing, root))
        }
    }
}

pub async fn run(args: RenderArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = SiteConfig::load(global.config.as_deref(), &args.site).context("load config")?;
    let source = fetch::open_source(&args.site, global.timeout())?;

    let document = std::fs::read_to_string(&args.page)
        .with_context(|| format!("read page: {}", args.page))?;
    let location = match args.location {
        Some(location) => location,
        None => default_location(&args.site, &args.page),
    };

    tracing::info!(page = %args.page, location = %location, "render page");
    let hydration = initialize(source.as_ref(), &config, &document, &location)
        .await
        .with_context(|| format!("initialize page: {}", args.page))?;
    for section in &hydration.sections {
        if section.state == PageState::Error {
            tracing::warn!(section = section.name, "section content could not be loaded");
        }
    }
    tracing::info!(kind = hydration.kind.as_str(), state = ?hydration.state(), "page initialized");

    let html = hydration.apply(&document);
    match args.out {
        Some(out) => crate::generate::write_output(Path::new(&out), html.as_bytes(), args.force)?,
        None => print!("{html}"),
    }
    Ok(())
}

/// Location of `page` relative to a local `site`, or just its file name.
fn default_location(site: &str, page: &str) -> String {
    let page_path = Path::new(page);
    if !fetch::is_http_url(site)
        && let (Ok(site), Ok(page)) = (Path::new(site).canonicalize(), page_path.canonicalize())
        && let Ok(relative) = page.strip_prefix(&site)
    {
        return relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
    }
    page_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| page.to_owned())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct MemorySource {
        files: HashMap<String, String>,
    }

    impl MemorySource {
        fn with(mut self, path: &str, json: &str) -> Self {
            self.files.insert(path.to_owned(), json.to_owned());
            self
        }
    }

    #[async_trait]
    impl ContentSource for MemorySource {
        fn describe(&self, path: &str) -> String {
            format!("memory:{path}")
        }

        async fn read(&self, path: &str) -> anyhow::Result<Vec<u8>> {
            self.files
                .get(path)
                .map(|s| s.as_bytes().to_vec())
                .ok_or_else(|| anyhow::anyhow!("no such file: {path}"))
        }
    }

    const WORKS_PAGE: &str = r##"<html><head><title>Novel</title>
<meta name="description" content=""></head>
<body data-page="works">
<a class="link-wattpad" href="#">Wattpad</a><a class="social-ig" href="#">IG</a>
<div id="works-container">Loading...</div>
</body></html>"##;

    const WORK_DETAIL_PAGE: &str = r#"<html><head><title>Detail Novel | Titik Fiksi</title></head>
<body data-detail-type="work">
<div id="detail-box">
  <img id="work-cover-img" src="x.jpg" alt="Cover" />
  <h1 id="work-title">Loading...</h1>
  <span id="work-genre">📌 ...</span><span id="work-status">✅ ...</span>
  <p id="work-synopsis">Loading...</p>
</div>
</body></html>"#;

    fn content() -> MemorySource {
        let config = SiteConfig::default();
        MemorySource::default()
            .with(&config.content.works, r#"{"works":[{"slug":"Sunset","title":"Sunset","cover":""}]}"#)
            .with(
                &config.content.settings,
                r#"{"site_title":"Titik Fiksi","meta_description":"Novelis"}"#,
            )
            .with(
                &config.content.home,
                r#"{"hero":{},"platforms":{"wattpad":"https://wattpad.com/tf"},"socials":{"instagram":""}}"#,
            )
    }

    #[test]
    fn detect_reads_both_marker_styles() {
        assert_eq!(PageKind::detect(WORKS_PAGE), Some(PageKind::Works));
        assert_eq!(PageKind::detect(WORK_DETAIL_PAGE), Some(PageKind::WorkDetail));
        assert_eq!(PageKind::detect("<body data-page=\"gallery\"></body>"), None);
        assert_eq!(PageKind::detect("<body></body>"), None);
    }

    #[test]
    fn site_root_counts_directories() {
        assert_eq!(site_root_from("index.html"), "");
        assert_eq!(site_root_from("/works.html"), "");
        assert_eq!(site_root_from("pages/works/sunset.html"), "../../");
        assert_eq!(site_root_from("https://example.com/pages/works/sunset.html"), "../../");
    }

    #[tokio::test]
    async fn works_page_renders_list_settings_and_links() -> anyhow::Result<()> {
        let source = content();
        let config = SiteConfig::default();

        let hydration = initialize(&source, &config, WORKS_PAGE, "works.html").await?;
        assert_eq!(hydration.kind, PageKind::Works);
        assert_eq!(hydration.state(), PageState::Success);
        assert!(hydration.sections.iter().all(|s| s.state != PageState::Loading));

        let out = hydration.apply(WORKS_PAGE);
        assert!(out.contains("<title>Titik Fiksi</title>"));
        assert!(out.contains(r#"content="Novelis""#));
        assert!(out.contains(r#"href="https://wattpad.com/tf""#));
        assert!(out.contains(r##"<a class="social-ig" href="#" style="display:none">"##));
        assert!(out.contains(r#"href="pages/works/sunset.html""#));
        assert!(out.contains("assets/images/defaults/cover-default.jpg"));
        Ok(())
    }

    #[tokio::test]
    async fn failed_settings_do_not_block_the_list() -> anyhow::Result<()> {
        let config = SiteConfig::default();
        let source = MemorySource::default().with(&config.content.works, r#"{"works":[]}"#);

        let hydration = initialize(&source, &config, WORKS_PAGE, "works.html").await?;
        assert_eq!(hydration.sections[0].state, PageState::Error);
        assert_eq!(hydration.sections[1].state, PageState::Error);
        assert_eq!(hydration.state(), PageState::Empty);

        let out = hydration.apply(WORKS_PAGE);
        assert!(out.contains("Belum ada karya."));
        assert!(out.contains("<title>Novel</title>"));
        Ok(())
    }

    #[tokio::test]
    async fn home_page_also_fills_a_works_container() -> anyhow::Result<()> {
        let source = content();
        let config = SiteConfig::default();
        let document = r#"<html><head><title>Beranda | Titik Fiksi</title></head>
<body data-page="home"><h1 id="hero-title">x</h1><div id="works-container">Loading...</div></body></html>"#;

        let hydration = initialize(&source, &config, document, "index.html").await?;
        let names: Vec<&str> = hydration.sections.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["settings", "links", "home", "works"]);
        assert_eq!(hydration.state(), PageState::Success);

        let out = hydration.apply(document);
        assert!(out.contains(r#"<h1 id="hero-title">Titik Fiksi</h1>"#));
        assert!(out.contains(r#"<h3 class="work-title">Sunset</h3>"#));
        assert!(!out.contains("Loading..."));
        Ok(())
    }

    #[tokio::test]
    async fn works_page_skips_sections_without_slots() -> anyhow::Result<()> {
        let source = content();
        let config = SiteConfig::default();

        let hydration = initialize(&source, &config, WORKS_PAGE, "works.html").await?;
        let names: Vec<&str> = hydration.sections.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["settings", "links", "works"]);
        Ok(())
    }

    #[tokio::test]
    async fn detail_page_finds_record_by_file_name() -> anyhow::Result<()> {
        let source = content();
        let config = SiteConfig::default();

        let hydration =
            initialize(&source, &config, WORK_DETAIL_PAGE, "pages/works/sunset.html").await?;
        assert_eq!(hydration.state(), PageState::Success);

        let out = hydration.apply(WORK_DETAIL_PAGE);
        assert!(out.contains(r#"<h1 id="work-title">Sunset</h1>"#));
        assert!(out.contains("<title>Sunset | Titik Fiksi</title>"));
        assert!(out.contains(r#"src="../../assets/images/defaults/cover-default.jpg""#));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_slug_shows_not_found() -> anyhow::Result<()> {
        let source = content();
        let config = SiteConfig::default();

        let hydration =
            initialize(&source, &config, WORK_DETAIL_PAGE, "pages/works/moonrise.html").await?;
        assert_eq!(hydration.state(), PageState::Empty);

        let out = hydration.apply(WORK_DETAIL_PAGE);
        assert!(out.contains("Konten tidak ditemukan"));
        assert!(out.contains(r#"href="../../index.html""#));
        assert!(!out.contains("work-title"));
        Ok(())
    }

    #[test]
    fn default_location_is_relative_to_local_site() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let page = temp.path().join("pages/works/sunset.html");
        std::fs::create_dir_all(page.parent().unwrap())?;
        std::fs::write(&page, "")?;

        let site = temp.path().to_string_lossy().to_string();
        let location = default_location(&site, &page.to_string_lossy());
        assert_eq!(location, "pages/works/sunset.html");
        assert_eq!(default_location("https://example.com", "draft/sunset.html"), "sunset.html");
        Ok(())
    }

    #[tokio::test]
    async fn page_without_marker_is_an_error() {
        let source = content();
        let config = SiteConfig::default();
        let result = initialize(&source, &config, "<html><body></body></html>", "x.html").await;
        assert!(result.is_err());
    }
}

use crate::config::DetailKind;
use crate::dom::{self, Patch, Target, escape};
use crate::formats::{WorkRecord, WorksFile, WritingRecord, WritingsFile};
use crate::normalize::{self, NO_CONTENT, WorkView, WritingView};

pub const WORK_SYNOPSIS_MAX: usize = 160;
pub const WRITING_EXCERPT_MAX: usize = 180;

pub const WORKS_CONTAINER: &str = "works-container";
pub const WRITINGS_CONTAINER: &str = "writings-container";
pub const DETAIL_BOX: &str = "detail-box";

/// Outcome of one page section, entered once per render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Loading,
    Success,
    Empty,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBody {
    pub state: PageState,
    pub html: String,
}

fn kind_noun(kind: DetailKind) -> &'static str {
    match kind {
        DetailKind::Work => "novel",
        DetailKind::Writing => "tulisan",
    }
}

fn placeholder(message: &str) -> String {
    format!(r#"<div class="glass-card" style="padding:16px;">{}</div>"#, escape(message))
}

/// Card for the works list. The detail link is only emitted for records
/// with a slug; `link_prefix` is the site-relative works directory.
#[must_use]
pub fn work_card(work: &WorkView, link_prefix: &str) -> String {
    let title = escape(&work.title);
    let detail = if work.slug.is_empty() {
        String::new()
    } else {
        format!(
            r#"<a class="btn btn-primary" href="{}/{}.html">📖 Detail</a>"#,
            escape(link_prefix),
            escape(&work.slug)
        )
    };

    format!(
        r#"
      <article class="glass-card work-card">
        <div class="work-cover">
          <img src="{cover}" alt="{title}" loading="lazy" />
        </div>

        <div class="work-meta">
          <span class="badge">📌 {genre}</span>
          <span class="badge">✅ {status}</span>
        </div>

        <h3 class="work-title">{title}</h3>
        <p class="work-desc">{synopsis}</p>

        <div class="work-actions">
          {detail}
        </div>
      </article>
    "#,
        cover = escape(&work.cover),
        genre = escape(&work.genre),
        status = escape(&work.status),
        synopsis = escape(&normalize::truncate(&work.synopsis, WORK_SYNOPSIS_MAX)),
    )
}

#[must_use]
pub fn writing_card(writing: &WritingView, link_prefix: &str) -> String {
    let detail = if writing.slug.is_empty() {
        String::new()
    } else {
        format!(
            r#"<a class="btn btn-primary" href="{}/{}.html">📄 Baca</a>"#,
            escape(link_prefix),
            escape(&writing.slug)
        )
    };

    let date = if writing.date.is_empty() {
        String::new()
    } else {
        format!(" • 📅 {}", escape(&writing.date))
    };

    let excerpt = normalize::truncate(&writing.content, WRITING_EXCERPT_MAX);
    let excerpt = if excerpt.is_empty() { NO_CONTENT.to_owned() } else { excerpt };

    format!(
        r#"
      <article class="glass-card writing-card">
        <h3 class="writing-title">{title}</h3>
        <div class="writing-meta">🗂️ {category}{date}</div>
        <div class="writing-body">{excerpt}</div>
        <div class="work-actions" style="margin-top:12px;">
          {detail}
        </div>
      </article>
    "#,
        title = escape(&writing.title),
        category = escape(&writing.category),
        excerpt = escape(&excerpt),
    )
}

/// Body of `#works-container`. `None` means the collection failed to load.
#[must_use]
pub fn works_list(data: Option<&WorksFile>, default_cover: &str, link_prefix: &str) -> ListBody {
    let Some(data) = data else {
        return ListBody { state: PageState::Error, html: placeholder("Gagal memuat karya.") };
    };
    if data.works.is_empty() {
        return ListBody { state: PageState::Empty, html: placeholder("Belum ada karya.") };
    }

    let html = data
        .works
        .iter()
        .map(|record| work_card(&WorkView::from_record(record, default_cover), link_prefix))
        .collect::<String>();
    ListBody { state: PageState::Success, html }
}

#[must_use]
pub fn writings_list(data: Option<&WritingsFile>, link_prefix: &str) -> ListBody {
    let Some(data) = data else {
        return ListBody { state: PageState::Error, html: placeholder("Gagal memuat tulisan.") };
    };
    if data.writings.is_empty() {
        return ListBody { state: PageState::Empty, html: placeholder("Belum ada tulisan.") };
    }

    let html = data
        .writings
        .iter()
        .map(|record| writing_card(&WritingView::from_record(record), link_prefix))
        .collect::<String>();
    ListBody { state: PageState::Success, html }
}

/// Slots of a work detail page. `default_cover` must already be relative to
/// the detail page.
#[must_use]
pub fn work_detail(record: &WorkRecord, brand: &str, default_cover: &str) -> Vec<Patch> {
    let view = WorkView::from_record(record, default_cover);
    let page_title = normalize::safe_text(record.title.as_deref(), "Detail Novel");
    let alt = normalize::safe_text(record.title.as_deref(), "Cover");

    vec![
        Patch::text(Target::Title, format!("{page_title} | {brand}")),
        Patch::text(dom::id("work-title"), view.title),
        Patch::html(dom::id("work-genre"), format!("📌 {}", escape(&view.genre))),
        Patch::html(dom::id("work-status"), format!("✅ {}", escape(&view.status))),
        Patch::text(dom::id("work-synopsis"), view.synopsis),
        Patch::attr(dom::id("work-cover-img"), "src", view.cover),
        Patch::attr(dom::id("work-cover-img"), "alt", alt),
    ]
}

#[must_use]
pub fn writing_detail(record: &WritingRecord, brand: &str) -> Vec<Patch> {
    let view = WritingView::from_record(record);
    let page_title = normalize::safe_text(record.title.as_deref(), "Detail Tulisan");
    let content = if view.content.is_empty() { NO_CONTENT.to_owned() } else { view.content.clone() };

    vec![
        Patch::text(Target::Title, format!("{page_title} | {brand}")),
        Patch::text(dom::id("writing-title"), view.title.clone()),
        Patch::text(dom::id("writing-meta"), view.meta_line()),
        Patch::text(dom::id("writing-content"), content),
    ]
}

/// Replaces the whole detail region with a notice and a link home.
/// `site_root` is the relative path from the page back to the site root.
#[must_use]
pub fn not_found(kind: DetailKind, site_root: &str) -> Vec<Patch> {
    let notice = format!(
        r#"
      <div class="glass-card" style="padding:18px;">
        <h2 style="margin-top:0;">Konten tidak ditemukan</h2>
        <p style="color: var(--muted); line-height:1.7;">
          Maaf, {noun} ini belum tersedia atau slug tidak cocok dengan JSON.
        </p>
        <a href="{home}" class="btn btn-primary">⬅️ Kembali ke Beranda</a>
      </div>
    "#,
        noun = kind_noun(kind),
        home = escape(&format!("{site_root}index.html")),
    );

    vec![Patch::html(dom::id(DETAIL_BOX), notice)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::DEFAULT_COVER;

    fn sunset() -> WorkRecord {
        WorkRecord {
            slug: Some("sunset".to_owned()),
            title: Some("Sunset".to_owned()),
            cover: Some(String::new()),
            ..WorkRecord::default()
        }
    }

    #[test]
    fn works_list_renders_one_card_with_default_cover_and_link() {
        let data = WorksFile { works: vec![sunset()] };
        let body = works_list(Some(&data), DEFAULT_COVER, "pages/works");

        assert_eq!(body.state, PageState::Success);
        assert_eq!(body.html.matches("<article").count(), 1);
        assert!(body.html.contains(r#"<h3 class="work-title">Sunset</h3>"#));
        assert!(body.html.contains(&format!(r#"src="{DEFAULT_COVER}""#)));
        assert!(body.html.contains(r#"href="pages/works/sunset.html""#));
    }

    #[test]
    fn empty_and_failed_collections_render_placeholders_only() {
        let empty = works_list(Some(&WorksFile::default()), DEFAULT_COVER, "pages/works");
        assert_eq!(empty.state, PageState::Empty);
        assert!(empty.html.contains("Belum ada karya."));
        assert!(!empty.html.contains("<article"));

        let failed = writings_list(None, "pages/writings");
        assert_eq!(failed.state, PageState::Error);
        assert!(failed.html.contains("Gagal memuat tulisan."));
    }

    #[test]
    fn card_without_slug_has_no_detail_link() {
        let mut record = sunset();
        record.slug = Some("   ".to_owned());
        let card = work_card(&WorkView::from_record(&record, DEFAULT_COVER), "pages/works");
        assert!(card.contains("Sunset"));
        assert!(!card.contains("href="));
    }

    #[test]
    fn cards_keep_source_order_and_escape_text() {
        let data = WorksFile {
            works: vec![
                WorkRecord { title: Some("Zebra".to_owned()), ..WorkRecord::default() },
                WorkRecord { title: Some("<Apel & Jeruk>".to_owned()), ..WorkRecord::default() },
            ],
        };
        let body = works_list(Some(&data), DEFAULT_COVER, "pages/works");
        let zebra = body.html.find("Zebra").unwrap();
        let apel = body.html.find("&lt;Apel &amp; Jeruk&gt;").unwrap();
        assert!(zebra < apel);
    }

    #[test]
    fn long_synopsis_is_truncated_in_card() {
        let mut record = sunset();
        record.synopsis = Some("a".repeat(400));
        let card = work_card(&WorkView::from_record(&record, DEFAULT_COVER), "pages/works");
        assert!(card.contains(&format!("{}...", "a".repeat(WORK_SYNOPSIS_MAX))));
        assert!(!card.contains(&"a".repeat(WORK_SYNOPSIS_MAX + 1)));
    }

    #[test]
    fn writing_card_shows_date_and_fallback_body() {
        let record = WritingRecord {
            slug: Some("Catatan Pagi".to_owned()),
            title: Some("Catatan".to_owned()),
            date: Some("2024-03-05".to_owned()),
            ..WritingRecord::default()
        };
        let card = writing_card(&WritingView::from_record(&record), "pages/writings");
        assert!(card.contains("🗂️ Umum • 📅 05 Maret 2024"));
        assert!(card.contains(NO_CONTENT));
        assert!(card.contains(r#"href="pages/writings/catatan-pagi.html""#));
    }

    #[test]
    fn work_detail_fills_every_slot() {
        let patches = work_detail(&sunset(), "Titik Fiksi", "../../assets/cover.jpg");
        assert!(patches.contains(&Patch::text(Target::Title, "Sunset | Titik Fiksi")));
        assert!(patches.contains(&Patch::text(dom::id("work-title"), "Sunset")));
        assert!(patches.contains(&Patch::attr(dom::id("work-cover-img"), "src", "../../assets/cover.jpg")));
        assert!(patches.contains(&Patch::html(dom::id("work-status"), "✅ Ongoing")));
    }

    #[test]
    fn writing_detail_uses_fallback_title() {
        let patches = writing_detail(&WritingRecord::default(), "Titik Fiksi");
        assert!(patches.contains(&Patch::text(Target::Title, "Detail Tulisan | Titik Fiksi")));
        assert!(patches.contains(&Patch::text(dom::id("writing-content"), NO_CONTENT)));
    }

    #[test]
    fn not_found_links_home() {
        let patches = not_found(DetailKind::Work, "../../");
        assert_eq!(patches.len(), 1);
        let dom::Edit::Html(html) = &patches[0].edit else {
            panic!("expected html patch");
        };
        assert!(html.contains("Konten tidak ditemukan"));
        assert!(html.contains(r#"href="../../index.html""#));
    }
}

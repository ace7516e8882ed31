use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime};

use crate::formats::{WorkRecord, WritingRecord};
use crate::slug;

pub const DEFAULT_COVER: &str = "assets/images/defaults/cover-default.jpg";
pub const ELLIPSIS: &str = "...";

pub const UNTITLED: &str = "Judul belum diisi";
pub const NO_GENRE: &str = "Genre belum diisi";
pub const DEFAULT_STATUS: &str = "Ongoing";
pub const NO_SYNOPSIS: &str = "Sinopsis belum ditulis.";
pub const DEFAULT_CATEGORY: &str = "Umum";
pub const NO_CONTENT: &str = "Belum ada isi tulisan.";

const MONTHS_ID: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Trimmed `value`, or `fallback` when it is missing or blank.
#[must_use]
pub fn safe_text(value: Option<&str>, fallback: &str) -> String {
    let trimmed = value.unwrap_or_default().trim();
    if trimmed.is_empty() {
        fallback.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Cuts `text` to `max` characters and appends [`ELLIPSIS`]. Word boundaries
/// are not respected.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        None => text.to_owned(),
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
    }
}

/// Renders a date as `DD <bulan> YYYY`. Input that does not parse is returned
/// as-is (trimmed); missing input becomes an empty string.
#[must_use]
pub fn format_date(value: Option<&str>) -> String {
    let raw = value.unwrap_or_default().trim();
    if raw.is_empty() {
        return String::new();
    }

    match parse_date(raw) {
        Some(date) => format!(
            "{:02} {} {}",
            date.day(),
            MONTHS_ID[date.month0() as usize],
            date.year()
        ),
        None => raw.to_owned(),
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y", "%m/%d/%Y"];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    // Year and month only (`2024-03`, `2024/03`) mean the first of the month.
    for (separator, format) in [("-", "%Y-%m-%d"), ("/", "%Y/%m/%d")] {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}{separator}01"), format) {
            return Some(date);
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }
    None
}

#[must_use]
pub fn get_cover(url: Option<&str>) -> String {
    get_cover_or(url, DEFAULT_COVER)
}

#[must_use]
pub fn get_cover_or(url: Option<&str>, default: &str) -> String {
    match url {
        Some(url) if !url.trim().is_empty() => url.to_owned(),
        _ => default.to_owned(),
    }
}

/// Display-ready work: every field has a value, `slug` may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkView {
    pub slug: String,
    pub title: String,
    pub genre: String,
    pub status: String,
    pub synopsis: String,
    pub cover: String,
}

impl WorkView {
    #[must_use]
    pub fn from_record(record: &WorkRecord, default_cover: &str) -> Self {
        Self {
            slug: slug::normalize(record.slug.as_deref().unwrap_or_default()),
            title: safe_text(record.title.as_deref(), UNTITLED),
            genre: safe_text(record.genre.as_deref(), NO_GENRE),
            status: safe_text(record.status.as_deref(), DEFAULT_STATUS),
            synopsis: safe_text(record.synopsis.as_deref(), NO_SYNOPSIS),
            cover: get_cover_or(record.cover.as_deref(), default_cover),
        }
    }
}

/// Display-ready writing. `date` is already formatted and may be empty;
/// `content` is empty when the record has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritingView {
    pub slug: String,
    pub title: String,
    pub category: String,
    pub date: String,
    pub content: String,
}

impl WritingView {
    #[must_use]
    pub fn from_record(record: &WritingRecord) -> Self {
        Self {
            slug: slug::normalize(record.slug.as_deref().unwrap_or_default()),
            title: safe_text(record.title.as_deref(), UNTITLED),
            category: safe_text(record.category.as_deref(), DEFAULT_CATEGORY),
            date: format_date(record.date.as_deref()),
            content: safe_text(record.content.as_deref(), ""),
        }
    }

    /// `category • date`, or just the category when there is no date.
    #[must_use]
    pub fn meta_line(&self) -> String {
        if self.date.is_empty() {
            self.category.clone()
        } else {
            format!("{} • {}", self.category, self.date)
        }
    }
}

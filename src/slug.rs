//! Slugs identify a record across list links, detail-page file names and the
//! generator output, so every one of those call sites goes through
//! [`normalize`].

/// Lowercases, drops everything outside `[a-z0-9-]` and spaces, then turns
/// each run of whitespace into a single `-`.
///
/// Empty input (or input made only of dropped characters) yields an empty
/// string, which callers treat as a missing slug.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let kept: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == ' ')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_space = false;
    for ch in kept.chars() {
        if ch == ' ' {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        slug.push(ch);
    }
    slug
}

/// Derives the slug of a detail page from where it lives: the last path
/// segment, without query/fragment and without the `.html` extension.
#[must_use]
pub fn from_location(location: &str) -> String {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .replace('\\', "/");
    let file = path.rsplit('/').next().unwrap_or_default();
    let stem = file.strip_suffix(".html").unwrap_or(file);
    normalize(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_hyphenates_spaces() {
        assert_eq!(normalize("Alpha Beta!!"), "alpha-beta");
        assert_eq!(normalize("  Senja   di\tJakarta "), "senja-dijakarta");
        assert_eq!(normalize("Bab 2: Pulang"), "bab-2-pulang");
        assert_eq!(normalize("already-a-slug"), "already-a-slug");
    }

    #[test]
    fn normalize_empty_and_symbol_only_input_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!!!"), "");
        assert_eq!(normalize("日本語"), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["Alpha Beta!!", "  Mixed CASE  slug ", "a--b", "x y-z", "Ünïcode Title"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input: {raw:?}");
        }
    }

    #[test]
    fn from_location_uses_the_file_stem() {
        assert_eq!(from_location("/pages/works/sunset.html"), "sunset");
        assert_eq!(from_location("https://example.com/pages/works/Sunset.html?x=1#top"), "sunset");
        assert_eq!(from_location("pages\\writings\\catatan-pagi.html"), "catatan-pagi");
        assert_eq!(from_location("sunset"), "sunset");
        assert_eq!(from_location("/pages/works/"), "");
    }
}

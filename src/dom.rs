//! Minimal HTML document patching.
//!
//! Page documents are small, hand-written files, so this is a tag scanner
//! rather than a full HTML parser: it understands start/end tags, quoted
//! attributes, comments, doctypes and raw-text elements, which is all the
//! page contract needs. Unclosed non-void elements (`<p>` without `</p>`) are
//! tolerated but cannot be targeted for inner-content edits.

use std::ops::Range;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Which element(s) a patch applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The first element with this `id`.
    Id(String),
    /// Every element carrying this class.
    Class(String),
    /// The document `<title>`.
    Title,
    /// The first `<meta name="...">` with this name.
    Meta(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Replace the element content with escaped text.
    Text(String),
    /// Replace the element content with markup.
    Html(String),
    /// Set (or add) an attribute.
    Attr { name: String, value: String },
    /// Set the inline `display` style (`none`, `block`, `inline-flex`, ...).
    Display(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub target: Target,
    pub edit: Edit,
}

impl Patch {
    pub fn text(target: Target, text: impl Into<String>) -> Self {
        Self { target, edit: Edit::Text(text.into()) }
    }

    pub fn html(target: Target, html: impl Into<String>) -> Self {
        Self { target, edit: Edit::Html(html.into()) }
    }

    pub fn attr(target: Target, name: &str, value: impl Into<String>) -> Self {
        Self {
            target,
            edit: Edit::Attr { name: name.to_owned(), value: value.into() },
        }
    }

    pub fn display(target: Target, value: &str) -> Self {
        Self { target, edit: Edit::Display(value.to_owned()) }
    }
}

pub fn id(name: &str) -> Target {
    Target::Id(name.to_owned())
}

pub fn class(name: &str) -> Target {
    Target::Class(name.to_owned())
}

#[must_use]
pub fn escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Applies `patches` in order. Patches whose target is absent are skipped,
/// the same way a page script ignores a slot the markup does not have.
#[must_use]
pub fn apply(html: &str, patches: &[Patch]) -> String {
    let mut doc = html.to_owned();
    for patch in patches {
        let elements = scan(&doc);
        let matched: Vec<&Element> = elements.iter().filter(|e| e.matches(&patch.target)).collect();
        let matched = match patch.target {
            Target::Class(_) => matched,
            _ => matched.into_iter().take(1).collect(),
        };
        if matched.is_empty() {
            tracing::debug!(slot = ?patch.target, "patch target not found; skipping");
            continue;
        }

        let mut edits: Vec<(Range<usize>, String)> = matched
            .into_iter()
            .filter_map(|element| element.edit(&patch.edit))
            .collect();

        // A match nested inside another match's edited range is replaced
        // along with it.
        edits.sort_by_key(|(range, _)| range.start);
        let mut kept: Vec<(Range<usize>, String)> = Vec::with_capacity(edits.len());
        for edit in edits {
            if kept.last().is_some_and(|(last, _)| edit.0.start < last.end) {
                continue;
            }
            kept.push(edit);
        }

        // Apply back to front so earlier ranges stay valid.
        for (range, replacement) in kept.into_iter().rev() {
            doc.replace_range(range, &replacement);
        }
    }
    doc
}

/// Value of an attribute on `<body>`, e.g. the page-type marker.
#[must_use]
pub fn body_attr(html: &str, name: &str) -> Option<String> {
    scan(html)
        .into_iter()
        .find(|e| e.tag.name == "body")
        .and_then(|e| e.tag.attr(name).map(str::to_owned))
}

/// Raw inner markup of the first element matching `target`.
#[must_use]
pub fn inner_html(html: &str, target: &Target) -> Option<String> {
    scan(html)
        .into_iter()
        .find(|e| e.matches(target))
        .and_then(|e| e.inner.map(|range| html[range].to_owned()))
}

#[derive(Debug, Clone)]
struct StartTag {
    name: String,
    attrs: Vec<(String, Option<String>)>,
    span: Range<usize>,
}

impl StartTag {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref().unwrap_or_default())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn render_with(&self, name: &str, value: &str) -> String {
        let mut out = format!("<{}", self.name);
        let mut replaced = false;
        for (attr, current) in &self.attrs {
            out.push(' ');
            out.push_str(attr);
            if attr == name {
                out.push_str(&format!("=\"{}\"", escape(value)));
                replaced = true;
                continue;
            }
            if let Some(current) = current {
                out.push_str(&format!("=\"{}\"", current.replace('"', "&quot;")));
            }
        }
        if !replaced {
            out.push_str(&format!(" {name}=\"{}\"", escape(value)));
        }
        out.push('>');
        out
    }
}

#[derive(Debug, Clone)]
struct Element {
    tag: StartTag,
    /// Content between the start and end tag, when the element is closed.
    inner: Option<Range<usize>>,
}

impl Element {
    fn matches(&self, target: &Target) -> bool {
        match target {
            Target::Id(id) => self.tag.attr("id") == Some(id.as_str()),
            Target::Class(class) => self.tag.has_class(class),
            Target::Title => self.tag.name == "title",
            Target::Meta(name) => {
                self.tag.name == "meta"
                    && self
                        .tag
                        .attr("name")
                        .is_some_and(|n| n.eq_ignore_ascii_case(name))
            }
        }
    }

    fn edit(&self, edit: &Edit) -> Option<(Range<usize>, String)> {
        match edit {
            Edit::Text(text) => Some((self.inner.clone()?, escape(text))),
            Edit::Html(markup) => Some((self.inner.clone()?, markup.clone())),
            Edit::Attr { name, value } => {
                Some((self.tag.span.clone(), self.tag.render_with(name, value)))
            }
            Edit::Display(display) => {
                let style = self.tag.attr("style").unwrap_or_default();
                let mut declarations: Vec<&str> = style
                    .split(';')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .filter(|d| {
                        !d.split(':')
                            .next()
                            .is_some_and(|p| p.trim().eq_ignore_ascii_case("display"))
                    })
                    .collect();
                let display = format!("display:{display}");
                declarations.push(&display);
                Some((
                    self.tag.span.clone(),
                    self.tag.render_with("style", &declarations.join(";")),
                ))
            }
        }
    }
}

enum Token {
    Start { tag: StartTag, self_closing: bool },
    End { name: String, span: Range<usize> },
}

fn scan(html: &str) -> Vec<Element> {
    let mut elements: Vec<Element> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for token in tokenize(html) {
        match token {
            Token::Start { tag, self_closing } => {
                let is_void = self_closing || VOID_ELEMENTS.contains(&tag.name.as_str());
                elements.push(Element { tag, inner: None });
                if !is_void {
                    open.push(elements.len() - 1);
                }
            }
            Token::End { name, span } => {
                let Some(depth) = open.iter().rposition(|&idx| elements[idx].tag.name == name) else {
                    continue;
                };
                let idx = open[depth];
                open.truncate(depth);
                let start = elements[idx].tag.span.end;
                elements[idx].inner = Some(start..span.start);
            }
        }
    }

    elements
}

fn tokenize(html: &str) -> Vec<Token> {
    let bytes = html.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(offset) = html[pos..].find('<') {
        let start = pos + offset;
        let rest = &html[start..];

        if rest.starts_with("<!--") {
            pos = match rest.find("-->") {
                Some(end) => start + end + 3,
                None => html.len(),
            };
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            pos = match rest.find('>') {
                Some(end) => start + end + 1,
                None => html.len(),
            };
            continue;
        }
        if let Some(after) = rest.strip_prefix("</") {
            let name_len = after
                .find(|c: char| !c.is_ascii_alphanumeric() && c != '-')
                .unwrap_or(after.len());
            let end = match rest.find('>') {
                Some(end) => start + end + 1,
                None => html.len(),
            };
            if name_len > 0 {
                tokens.push(Token::End {
                    name: after[..name_len].to_ascii_lowercase(),
                    span: start..end,
                });
            }
            pos = end;
            continue;
        }
        if !bytes
            .get(start + 1)
            .is_some_and(|b| b.is_ascii_alphabetic())
        {
            pos = start + 1;
            continue;
        }

        let Some((tag, self_closing)) = parse_start_tag(html, start) else {
            break;
        };
        pos = tag.span.end;

        if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) && !self_closing {
            let closing = format!("</{}", tag.name);
            let lower_rest = html[pos..].to_ascii_lowercase();
            if let Some(close) = lower_rest.find(&closing) {
                pos += close;
            } else {
                pos = html.len();
            }
        }
        tokens.push(Token::Start { tag, self_closing });
    }

    tokens
}

fn parse_start_tag(html: &str, start: usize) -> Option<(StartTag, bool)> {
    let bytes = html.as_bytes();
    let mut i = start + 1;
    let name_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    let name = html[name_start..i].to_ascii_lowercase();

    let mut attrs = Vec::new();
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i)? {
            b'>' => {
                let tag = StartTag { name, attrs, span: start..i + 1 };
                return Some((tag, false));
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                let tag = StartTag { name, attrs, span: start..i + 2 };
                return Some((tag, true));
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let attr_name = html[attr_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            attrs.push((attr_name, None));
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = match bytes.get(i)? {
            quote @ (b'"' | b'\'') => {
                let value_start = i + 1;
                let len = html[value_start..].find(*quote as char)?;
                i = value_start + len + 1;
                &html[value_start..value_start + len]
            }
            _ => {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                &html[value_start..i]
            }
        };
        attrs.push((attr_name, Some(value.to_owned())));
    }
}

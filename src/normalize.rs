use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\r\u{a0}]+").unwrap());

/// Tags whose subtrees carry no readable content.
const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "iframe"];

/// Cleaned page text: trimmed, non-empty, deduplicated lines in
/// first-occurrence order.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    lines: Vec<String>,
}

impl NormalizedText {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Joined form, one line per entry. This is what gets stored and what
    /// goes into the model prompt.
    pub fn as_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Rebuild from stored text. Stored content is already normalized, so
    /// this only splits; `clean_text` is where the invariants are enforced.
    pub fn from_text(text: &str) -> Self {
        NormalizedText {
            lines: text.lines().map(|l| l.to_string()).collect(),
        }
    }
}

/// Locate the page's primary content region and return it as serialized HTML.
/// Returns `None` when the document has no usable body. Not an error: the
/// caller surfaces it as "no content available".
pub fn extract_body(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let body = doc.select(&BODY_SELECTOR).next()?;
    // html5ever synthesizes an empty <body> for any input, so a childless
    // body means the page had no content region.
    if body.children().next().is_none() {
        return None;
    }
    Some(body.html())
}

/// Flatten a content region to normalized text: skip script/style subtrees,
/// break at text-node boundaries, trim, collapse whitespace runs, drop
/// empties, and keep only the first occurrence of each distinct line.
///
/// Pure and infallible: anything unparseable just yields fewer lines.
pub fn clean_text(region_html: &str) -> NormalizedText {
    let fragment = Html::parse_fragment(region_html);

    let mut raw_parts = Vec::new();
    collect_text(fragment.tree.root(), &mut raw_parts);

    let mut seen: HashSet<String> = HashSet::new();
    let mut lines = Vec::new();

    for part in &raw_parts {
        for raw_line in part.split('\n') {
            let line = WS_RE.replace_all(raw_line, " ").trim().to_string();
            if line.is_empty() {
                continue;
            }
            if seen.insert(line.clone()) {
                lines.push(line);
            }
        }
    }

    NormalizedText { lines }
}

fn collect_text(node: NodeRef<Node>, out: &mut Vec<String>) {
    match node.value() {
        Node::Text(t) => {
            out.push(String::from(&*t.text));
            return;
        }
        Node::Element(el) if SKIP_TAGS.contains(&el.name()) => return,
        Node::Comment(_) | Node::Doctype(_) | Node::ProcessingInstruction(_) => return,
        _ => {}
    }
    for child in node.children() {
        collect_text(child, out);
    }
}

// ── Tests ──

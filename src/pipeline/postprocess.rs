//! Post-processing: deterministic cleanup of model-generated content.
//!
//! Even with a response schema the model occasionally wraps its JSON in
//! ` ```json ` fences, prefixes a sentence of prose, or sprinkles zero-width
//! characters into the text. Its section HTML is untrusted as well, since it
//! is echoed from scraped product text, and ends up on a public page.
//!
//! Two entry points:
//!
//! * [`clean_json_reply`] runs on the raw reply text before parsing.
//! * [`normalize_content`] runs on the parsed [`GeneratedContent`].
//!
//! Every rule is a pure `&str → String` function and is tested on its own.

use crate::output::GeneratedContent;
use crate::sites::slug::{is_valid_slug, slugify};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use tracing::{debug, warn};

/// Slug used when neither the model's slug nor the title yields one.
pub const FALLBACK_SLUG: &str = "product";

/// Prepare a raw model reply for `serde_json`.
///
/// Rules (applied in order):
/// 1. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 2. Strip outer code fences (` ```json ` or bare ` ``` `)
/// 3. Cut leading/trailing prose around the outermost `{ … }`
pub fn clean_json_reply(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = strip_code_fences(&s);
    isolate_json_object(&s)
}

/// Normalise parsed content before rendering.
///
/// * trims title, description and keywords; drops empty keywords
/// * replaces an invalid slug with one derived from it (or from the title)
/// * sanitises every section's HTML fragment
/// * logs a warning for section types outside the known set
pub fn normalize_content(mut content: GeneratedContent) -> GeneratedContent {
    content.title = content.title.trim().to_string();
    content.description = content.description.trim().to_string();
    content.slug = normalize_slug(&content.slug, &content.title);
    content.keywords = content
        .keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    for section in &mut content.sections {
        if !section.kind.is_known() {
            warn!(
                "Unknown section type '{}' in section '{}', rendering as {}",
                section.kind,
                section.title,
                section.kind.css_class()
            );
        }
        section.title = section.title.trim().to_string();
        section.content = sanitize_section_html(&section.content);
    }

    content
}

// ── Rule 1: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 2: Strip outer code fences ─────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*\n(.*?)\n?```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    if let Some(caps) = RE_OUTER_FENCES.captures(trimmed) {
        caps[1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

// ── Rule 3: Isolate the JSON object ─────────────────────────────────────────

fn isolate_json_object(input: &str) -> String {
    match (input.find('{'), input.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            if start > 0 || end + 1 < input.len() {
                debug!("Dropping {} chars of prose around the JSON reply", input.len() - (end + 1 - start));
            }
            input[start..=end].to_string()
        }
        _ => input.to_string(),
    }
}

// ── Slug ────────────────────────────────────────────────────────────────────

/// Keep `slug` if valid, otherwise derive one from it, then from `title`.
pub fn normalize_slug(slug: &str, title: &str) -> String {
    let slug = slug.trim();
    if is_valid_slug(slug) {
        return slug.to_string();
    }
    let derived = [slugify(slug), slugify(title)]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_SLUG.to_string());
    debug!("Model slug {:?} is invalid, using {:?}", slug, derived);
    derived
}

// ── Section HTML sanitiser ──────────────────────────────────────────────────
//
// Section content is injected verbatim into the public page. It is parsed
// with html5ever (via scraper) and re-serialised through an allowlist:
//
// * allowed formatting elements are kept with allowed attributes only
// * script-capable and foreign elements (`script`, `svg`, `math`, …) are
//   dropped together with their content
// * any other element is unwrapped, keeping its children
// * `href`/`src` survive only with an http(s), mailto (links) or relative
//   URL, checked after the parser has decoded character references
//
// Text and attribute values are re-escaped on output.

const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "caption", "cite", "code", "dd", "del", "div", "dl",
    "dt", "em", "figcaption", "figure", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "ins",
    "kbd", "li", "mark", "ol", "p", "pre", "q", "s", "small", "span", "strong", "sub", "sup",
    "table", "tbody", "td", "tfoot", "th", "thead", "time", "tr", "u", "ul",
];

const DROPPED_WITH_CONTENT: &[&str] = &[
    "applet", "base", "embed", "frame", "frameset", "head", "iframe", "link", "math", "meta",
    "noembed", "noscript", "object", "script", "select", "style", "svg", "template", "textarea",
    "title", "xmp",
];

const VOID_TAGS: &[&str] = &["br", "hr", "img"];

const GLOBAL_ATTRS: &[&str] = &["class", "title"];

/// Nesting beyond this depth is discarded.
const MAX_DEPTH: usize = 64;

fn allowed_attrs(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href"],
        "img" => &["src", "alt", "width", "height", "loading"],
        "td" | "th" => &["colspan", "rowspan"],
        "ol" => &["start"],
        "time" => &["datetime"],
        "blockquote" | "q" | "del" | "ins" => &["cite"],
        _ => &[],
    }
}

/// Remove script-capable markup from a model-written HTML fragment.
pub fn sanitize_section_html(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    let mut out = String::with_capacity(input.len());
    write_children(fragment.root_element(), &mut out, 0);
    let cleaned = out.trim().to_string();
    if cleaned != input.trim() {
        debug!(
            "Sanitiser rewrote section HTML ({} → {} bytes)",
            input.trim().len(),
            cleaned.len()
        );
    }
    cleaned
}

fn write_children(parent: ElementRef<'_>, out: &mut String, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => push_escaped(out, text, false),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    write_element(el, out, depth + 1);
                }
            }
            _ => {}
        }
    }
}

fn write_element(el: ElementRef<'_>, out: &mut String, depth: usize) {
    let tag = el.value().name();
    if DROPPED_WITH_CONTENT.contains(&tag) {
        return;
    }
    if !ALLOWED_TAGS.contains(&tag) {
        write_children(el, out, depth);
        return;
    }

    out.push('<');
    out.push_str(tag);
    for &name in GLOBAL_ATTRS.iter().chain(allowed_attrs(tag)) {
        let Some(value) = el.value().attr(name) else {
            continue;
        };
        if (name == "href" || name == "src" || name == "cite") && !is_safe_url(value, name == "href") {
            debug!("Dropping {}={:?} on <{}>", name, value, tag);
            continue;
        }
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        push_escaped(out, value.trim(), true);
        out.push('"');
    }
    out.push('>');

    if VOID_TAGS.contains(&tag) {
        return;
    }
    write_children(el, out, depth);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// `true` for relative URLs and for http, https and (when `allow_mailto`)
/// mailto. Whitespace and control characters are ignored when reading the
/// scheme, as browsers do.
pub fn is_safe_url(value: &str, allow_mailto: bool) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    match compact.find([':', '/', '?', '#']) {
        Some(i) if compact[i..].starts_with(':') => match &compact[..i] {
            "http" | "https" => true,
            "mailto" => allow_mailto,
            _ => false,
        },
        _ => true,
    }
}

fn push_escaped(out: &mut String, text: &str, in_attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

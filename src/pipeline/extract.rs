//! DOM extraction: pull title, meta description, headings, paragraphs and
//! images out of raw HTML.
//!
//! Extraction never fails. Missing elements yield empty strings or empty
//! lists so a sparse page still produces a usable [`ExtractedPageData`].
//! Image sources are made absolute against the page origin; a source that
//! cannot be resolved is kept verbatim rather than dropped.

use crate::output::{ExtractedPageData, ImageRef};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

static SEL_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static SEL_META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static SEL_OG_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:description"]"#).unwrap());
static SEL_H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static SEL_P: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static SEL_IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Extract page fields from `html` fetched from `page_url`.
pub fn extract_page_data(html: &str, page_url: &str) -> ExtractedPageData {
    let doc = Html::parse_document(html);

    let title = first_text(&doc, &SEL_TITLE).unwrap_or_default();
    let meta_description = first_attr(&doc, &SEL_META_DESCRIPTION, "content")
        .or_else(|| first_attr(&doc, &SEL_OG_DESCRIPTION, "content"))
        .unwrap_or_default();
    let headings = all_texts(&doc, &SEL_H1);
    let paragraphs = all_texts(&doc, &SEL_P);

    let images: Vec<ImageRef> = doc
        .select(&SEL_IMG)
        .filter_map(|img| {
            let src = img.value().attr("src")?;
            if src.trim().is_empty() {
                return None;
            }
            Some(ImageRef {
                src: resolve_image_url(src, page_url),
                alt: img.value().attr("alt").unwrap_or("").trim().to_string(),
            })
        })
        .collect();

    debug!(
        "Extracted {} headings, {} paragraphs, {} images from {}",
        headings.len(),
        paragraphs.len(),
        images.len(),
        page_url
    );

    ExtractedPageData {
        url: page_url.to_string(),
        title,
        meta_description,
        headings,
        paragraphs,
        images,
    }
}

/// Resolve an image `src` against the origin of `page_url`.
///
/// * already absolute (`http…`) → unchanged
/// * relative or protocol-relative → joined onto the page origin
/// * page URL or join unparsable → `src` unchanged
pub fn resolve_image_url(src: &str, page_url: &str) -> String {
    let src = src.trim();
    if src.starts_with("http") {
        return src.to_string();
    }
    let resolved = Url::parse(page_url)
        .ok()
        .and_then(|page| {
            let origin = page.origin().ascii_serialization();
            Url::parse(&origin).ok()
        })
        .and_then(|origin| origin.join(src).ok());

    match resolved {
        Some(url) => url.to_string(),
        None => {
            warn!("Could not resolve image src {:?} against {}", src, page_url);
            src.to_string()
        }
    }
}

/// Whitespace-normalised text content of an element.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

pub(crate) fn all_texts(doc: &Html, selector: &Selector) -> Vec<String> {
    doc.select(selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

pub(crate) fn first_attr(doc: &Html, selector: &Selector, attr: &str) -> Option<String> {
    doc.select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
